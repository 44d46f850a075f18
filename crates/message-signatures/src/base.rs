// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! The signature base builder (RFC 9421 §2.5).
//!
//! One line per covered component followed by a final `"@signature-params"`
//! line, no trailing newline, built against the full component model and
//! `structured_fields`'s own serializer.

use std::fmt::Write as _;

use structured_fields::{InnerList, SerializeValue};

use crate::component::{self, CoveredComponent};
use crate::context::SignatureContext;
use crate::error::Error;
use crate::params::SignatureParameters;

/// An ordered covered-components list plus the parameter set that will be
/// attached to `@signature-params`.
pub struct SignatureBaseSpec {
    pub components: Vec<CoveredComponent>,
    pub parameters: SignatureParameters,
}

/// The text form of a signature base, plus the standalone serialization of
/// its `@signature-params` value (the latter is what is actually stored in
/// the `Signature-Input` header entry).
pub struct SignatureBase {
    pub text: String,
    pub signature_params_value: String,
}

impl SignatureBaseSpec {
    pub fn build(&self, context: &SignatureContext) -> Result<SignatureBase, Error> {
        // An empty component list is legal (RFC 9421 Appendix B.2.1's
        // minimal signature covers nothing but `@signature-params` itself).
        let mut text = String::new();
        let mut items = Vec::with_capacity(self.components.len());

        for component in &self.components {
            let value = context.resolve(component)?;
            let item = component::to_item(component);
            let _ = writeln!(text, "{}: {value}", item.serialize_value());
            items.push(item);
        }

        let signature_params_inner =
            InnerList::with_params(items, self.parameters.as_parameters().clone());
        let signature_params_value = signature_params_inner.serialize_value();

        let _ = write!(text, "\"@signature-params\": {signature_params_value}");

        if !text.is_ascii() {
            return Err(Error::Generic(
                "signature base contained non-ASCII content".to_string(),
            ));
        }

        Ok(SignatureBase { text, signature_params_value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::DerivedComponentName;
    use url::Url;

    #[test]
    fn builds_expected_base_text() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let mut ctx = SignatureContext::request("POST", url);
        ctx.headers.push("Content-Length", "18");

        let mut params = SignatureParameters::new();
        params.set_created(1_618_884_473);
        params.set_keyid("test").unwrap();

        let spec = SignatureBaseSpec {
            components: vec![
                CoveredComponent::derived(DerivedComponentName::Method, false),
                CoveredComponent::derived(DerivedComponentName::Authority, false),
                CoveredComponent::field("content-length", Default::default()).unwrap(),
            ],
            parameters: params,
        };

        let base = spec.build(&ctx).unwrap();
        let expected = "\"@method\": POST\n\"@authority\": example.com\n\"content-length\": 18\n\"@signature-params\": (\"@method\" \"@authority\" \"content-length\");created=1618884473;keyid=\"test\"";
        assert_eq!(base.text, expected);
    }

    /// RFC 9421 Appendix B.2.1: a signature covering zero components still
    /// produces a valid base, just the `@signature-params` line alone.
    #[test]
    fn empty_component_list_still_builds_a_base() {
        let url = Url::parse("https://example.com/").unwrap();
        let ctx = SignatureContext::request("GET", url);
        let mut params = SignatureParameters::new();
        params.set_created(1_618_884_473);
        params.set_keyid("test-key-rsa-pss").unwrap();
        params.set_nonce("b3k2pp5k7z-50gnwp.yemd").unwrap();

        let spec = SignatureBaseSpec { components: vec![], parameters: params };
        let base = spec.build(&ctx).unwrap();
        assert_eq!(
            base.text,
            "\"@signature-params\": ();created=1618884473;keyid=\"test-key-rsa-pss\";nonce=\"b3k2pp5k7z-50gnwp.yemd\""
        );
    }

    /// RFC 9421 Appendix B.2.3 (excerpt): a full-coverage base over a mix
    /// of field and derived components, ed25519-signed in the RFC but the
    /// base text itself has no dependency on the algorithm.
    #[test]
    fn full_coverage_base_matches_rfc_example() {
        let url = Url::parse("https://example.com/foo?param=Value&Pet=dog").unwrap();
        let mut ctx = SignatureContext::request("POST", url);
        ctx.headers.push("Host", "example.com");
        ctx.headers.push("Date", "Tue, 20 Apr 2021 02:07:55 GMT");
        ctx.headers.push("Content-Type", "application/json");
        ctx.headers.push(
            "Content-Digest",
            "sha-512=:WZDPaVn/7XgHaAy8pmojAkGWoRx2UFChF41A2svX+TaPm+AbwAgBWnrIiYllu7BNNyealdVLvRwEmTHWXvJwew==:",
        );
        ctx.headers.push("Content-Length", "18");

        let mut params = SignatureParameters::new();
        params.set_created(1_618_884_473);
        params.set_keyid("test-key-ed25519").unwrap();

        let spec = SignatureBaseSpec {
            components: vec![
                CoveredComponent::field("date", Default::default()).unwrap(),
                CoveredComponent::derived(DerivedComponentName::Method, false),
                CoveredComponent::derived(DerivedComponentName::Path, false),
                CoveredComponent::derived(DerivedComponentName::Authority, false),
                CoveredComponent::field("content-type", Default::default()).unwrap(),
                CoveredComponent::field("content-length", Default::default()).unwrap(),
            ],
            parameters: params,
        };

        let base = spec.build(&ctx).unwrap();
        let expected = "\"date\": Tue, 20 Apr 2021 02:07:55 GMT\n\
\"@method\": POST\n\
\"@path\": /foo\n\
\"@authority\": example.com\n\
\"content-type\": application/json\n\
\"content-length\": 18\n\
\"@signature-params\": (\"date\" \"@method\" \"@path\" \"@authority\" \"content-type\" \"content-length\");created=1618884473;keyid=\"test-key-ed25519\"";
        assert_eq!(base.text, expected);
    }

    /// RFC 9421 Appendix B.2.2's selective-components example: mixes a
    /// derived component, a field component, and `@query-param;name=`.
    #[test]
    fn selective_components_base_matches_rfc_example() {
        let url = Url::parse("https://example.com/foo?param=Value&Pet=dog").unwrap();
        let mut ctx = SignatureContext::request("POST", url);
        ctx.headers.push("Content-Digest", "sha-512=:WZDPaVn/7XgHaAy8pmojAkGWoRx2UFChF41A2svX+TaPm+AbwAgBWnrIiYllu7BNNyealdVLvRwEmTHWXvJwew==:");

        let mut params = SignatureParameters::new();
        params.set_created(1_618_884_473);
        params.set_keyid("test-key-rsa-pss").unwrap();
        params.set_tag("header-example").unwrap();

        let spec = SignatureBaseSpec {
            components: vec![
                CoveredComponent::derived(DerivedComponentName::Authority, false),
                CoveredComponent::field("content-digest", Default::default()).unwrap(),
                CoveredComponent::derived(DerivedComponentName::QueryParam("Pet".to_string()), false),
            ],
            parameters: params,
        };

        let base = spec.build(&ctx).unwrap();
        assert_eq!(
            base.signature_params_value,
            "(\"@authority\" \"content-digest\" \"@query-param\";name=\"Pet\");created=1618884473;keyid=\"test-key-rsa-pss\";tag=\"header-example\""
        );
    }
}
