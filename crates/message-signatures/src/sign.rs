// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! The signing engine.
//!
//! Carries an arbitrary covered-component list (split into always-required
//! and used-if-present, RFC 9421 §2.3's "SHOULD... if present" components),
//! an arbitrary algorithm, and an injectable clock, rather than hard-coding
//! a single signature algorithm and a fixed component set.

use structured_fields::{BareItem, Item, SerializeValue};

use crate::algorithm::SignatureAlgorithm;
use crate::base::SignatureBaseSpec;
use crate::clock::Clock;
use crate::component::CoveredComponent;
use crate::context::SignatureContext;
use crate::error::Error;
use crate::key::{self, PrivateKey};
use crate::params::SignatureParameters;

/// Everything needed to produce one labeled signature.
pub struct SignatureSpec {
    /// The `Signature`/`Signature-Input` dictionary member name, e.g. `"sig1"`.
    pub label: String,
    pub algorithm: SignatureAlgorithm,
    pub key_id: Option<String>,
    pub nonce: Option<String>,
    pub tag: Option<String>,
    /// Overrides the clock for `created`, primarily for reproducible tests.
    pub created: Option<i64>,
    /// When set, `expires` is emitted as `created + expires_after_seconds`.
    pub expires_after_seconds: Option<i64>,
    /// Components that must be covered; resolution failure aborts signing.
    pub required_components: Vec<CoveredComponent>,
    /// Components covered only if they currently resolve against `context`;
    /// silently omitted, not an error, when absent.
    pub used_if_present_components: Vec<CoveredComponent>,
    /// Whether `alg` is emitted in `@signature-params`. RFC 9421 Appendix
    /// B.2.1's minimal example omits it, so this defaults off.
    pub visible_alg: bool,
}

/// The labeled `Signature-Input`/`Signature` dictionary entries this
/// signing pass produced, plus the signature base text for auditing.
pub struct SignatureResult {
    pub label: String,
    pub signature_input_entry: String,
    pub signature_entry: String,
    pub signature_base: String,
}

pub fn sign(
    spec: &SignatureSpec,
    context: &SignatureContext,
    key: &PrivateKey,
    clock: &dyn Clock,
) -> Result<SignatureResult, Error> {
    // Per RFC 9421 Appendix B.2.1, a signature may legally cover zero
    // components (the minimal "cover nothing, sign the parameters alone"
    // case); an empty list is not itself an error.
    let mut components = spec.required_components.clone();
    for candidate in &spec.used_if_present_components {
        if context.resolve(candidate).is_ok() {
            components.push(candidate.clone());
        }
    }

    let mut params = SignatureParameters::new();
    let created = spec.created.unwrap_or_else(|| clock.now_unix_seconds());
    params.set_created(created);
    if let Some(seconds) = spec.expires_after_seconds {
        params.set_expires(created + seconds);
    }
    if let Some(nonce) = &spec.nonce {
        params.set_nonce(nonce)?;
    }
    if spec.visible_alg {
        params.set_alg(spec.algorithm.wire_identifier())?;
    }
    if let Some(keyid) = &spec.key_id {
        params.set_keyid(keyid)?;
    }
    if let Some(tag) = &spec.tag {
        params.set_tag(tag)?;
    }

    let base_spec = SignatureBaseSpec { components, parameters: params };
    let base = base_spec.build(context)?;

    let signature_bytes = key::sign(spec.algorithm, key, base.text.as_bytes())?;
    let signature_item = Item::new(BareItem::ByteSequence(signature_bytes));

    Ok(SignatureResult {
        label: spec.label.clone(),
        signature_input_entry: format!("{}={}", spec.label, base.signature_params_value),
        signature_entry: format!("{}={}", spec.label, signature_item.serialize_value()),
        signature_base: base.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::component::DerivedComponentName;
    use url::Url;

    #[test]
    fn signs_with_hmac_and_reports_created() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let context = SignatureContext::request("GET", url);
        let key = PrivateKey::HmacSha256(b"a-shared-secret-key-material".to_vec());
        let clock = FixedClock(1_700_000_000);

        let spec = SignatureSpec {
            label: "sig1".to_string(),
            algorithm: SignatureAlgorithm::HmacSha256,
            key_id: Some("test-key".to_string()),
            nonce: None,
            tag: None,
            created: None,
            expires_after_seconds: Some(300),
            required_components: vec![CoveredComponent::derived(DerivedComponentName::Authority, false)],
            used_if_present_components: vec![],
            visible_alg: false,
        };

        let result = sign(&spec, &context, &key, &clock).unwrap();
        assert!(result.signature_input_entry.starts_with("sig1=(\"@authority\")"));
        assert!(result.signature_input_entry.contains("created=1700000000"));
        assert!(result.signature_input_entry.contains("expires=1700000300"));
        assert!(!result.signature_input_entry.contains("alg="));
        assert!(result.signature_entry.starts_with("sig1=:"));
    }

    #[test]
    fn visible_alg_appends_the_alg_parameter() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let context = SignatureContext::request("GET", url);
        let key = PrivateKey::HmacSha256(b"a-shared-secret-key-material".to_vec());
        let clock = FixedClock(1_700_000_000);

        let spec = SignatureSpec {
            label: "sig1".to_string(),
            algorithm: SignatureAlgorithm::HmacSha256,
            key_id: None,
            nonce: None,
            tag: None,
            created: None,
            expires_after_seconds: None,
            required_components: vec![],
            used_if_present_components: vec![],
            visible_alg: true,
        };

        let result = sign(&spec, &context, &key, &clock).unwrap();
        assert!(result.signature_input_entry.contains("alg=\"hmac-sha256\""));
    }

    /// RFC 9421 Appendix B.2.1's minimal signature: an empty component
    /// list is not an error, and `alg` stays absent by default.
    #[test]
    fn minimal_signature_covers_zero_components() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let context = SignatureContext::request("GET", url);
        let key = PrivateKey::HmacSha256(b"a-shared-secret-key-material".to_vec());
        let clock = FixedClock(1_618_884_473);

        let spec = SignatureSpec {
            label: "sig-b21".to_string(),
            algorithm: SignatureAlgorithm::HmacSha256,
            key_id: Some("test-key-rsa-pss".to_string()),
            nonce: Some("b3k2pp5k7z-50gnwp.yemd".to_string()),
            tag: None,
            created: Some(1_618_884_473),
            expires_after_seconds: None,
            required_components: vec![],
            used_if_present_components: vec![],
            visible_alg: false,
        };

        let result = sign(&spec, &context, &key, &clock).unwrap();
        assert_eq!(
            result.signature_input_entry,
            "sig-b21=();created=1618884473;keyid=\"test-key-rsa-pss\";nonce=\"b3k2pp5k7z-50gnwp.yemd\""
        );
        assert_eq!(result.signature_base, "\"@signature-params\": ();created=1618884473;keyid=\"test-key-rsa-pss\";nonce=\"b3k2pp5k7z-50gnwp.yemd\"");
    }

    #[test]
    fn used_if_present_component_is_skipped_when_absent() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let context = SignatureContext::request("GET", url);
        let key = PrivateKey::HmacSha256(b"a-shared-secret-key-material".to_vec());
        let clock = FixedClock(1_700_000_000);

        let spec = SignatureSpec {
            label: "sig1".to_string(),
            algorithm: SignatureAlgorithm::HmacSha256,
            key_id: None,
            nonce: None,
            tag: None,
            created: None,
            expires_after_seconds: None,
            required_components: vec![CoveredComponent::derived(DerivedComponentName::Authority, false)],
            used_if_present_components: vec![
                CoveredComponent::field("x-absent-header", Default::default()).unwrap(),
            ],
            visible_alg: false,
        };

        let result = sign(&spec, &context, &key, &clock).unwrap();
        assert!(!result.signature_input_entry.contains("x-absent-header"));
    }

    #[test]
    fn succeeds_with_only_used_if_present_components_all_absent() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let context = SignatureContext::request("GET", url);
        let key = PrivateKey::HmacSha256(b"a-shared-secret-key-material".to_vec());
        let clock = FixedClock(1_700_000_000);

        let spec = SignatureSpec {
            label: "sig1".to_string(),
            algorithm: SignatureAlgorithm::HmacSha256,
            key_id: None,
            nonce: None,
            tag: None,
            created: None,
            expires_after_seconds: None,
            required_components: vec![],
            used_if_present_components: vec![
                CoveredComponent::field("x-absent-header", Default::default()).unwrap(),
            ],
            visible_alg: false,
        };

        let result = sign(&spec, &context, &key, &clock).unwrap();
        assert!(result.signature_input_entry.starts_with("sig1=()"));
    }
}
