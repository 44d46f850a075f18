// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

use ed25519_dalek::{SigningKey, VerifyingKey};
use message_signatures::clock::FixedClock;
use message_signatures::component::{CoveredComponent, DerivedComponentName};
use message_signatures::context::SignatureContext;
use message_signatures::key::{PrivateKey, PublicKey, PublicKeyInfo};
use message_signatures::sign::{sign, SignatureSpec};
use message_signatures::verify::{verify, SignatureSelector, VerificationSpec};
use message_signatures::SignatureAlgorithm;
use url::Url;

/// Signs then verifies a message the way a bot-identity check would: the
/// verifier selects by `tag` rather than by a known label, and insists on
/// `keyid`, `created`, and `expires` all being present.
fn main() {
    env_logger::init();

    let private_key_bytes: [u8; 32] = [
        0x9f, 0x83, 0x62, 0xf8, 0x7a, 0x48, 0x4a, 0x95, 0x4e, 0x6e, 0x74, 0x0c, 0x5b, 0x4c, 0x0e,
        0x84, 0x22, 0x91, 0x39, 0xa2, 0x0a, 0xa8, 0xab, 0x56, 0xff, 0x66, 0x58, 0x6f, 0x6a, 0x7d,
        0x29, 0xc5,
    ];
    let signing_key = SigningKey::from_bytes(&private_key_bytes);
    let verifying_key: VerifyingKey = signing_key.verifying_key();

    let url = Url::parse("https://example.com/").unwrap();
    let context = SignatureContext::request("GET", url);
    let clock = FixedClock(1_735_689_600);

    let spec = SignatureSpec {
        label: "sig1".to_string(),
        algorithm: SignatureAlgorithm::Ed25519,
        key_id: Some("poqkLGiymh_W0uP6PZFw-dvez3QJT5SolqXBCW38r0U".to_string()),
        nonce: Some("end-to-end-demo".to_string()),
        tag: Some("web-bot-auth".to_string()),
        created: None,
        expires_after_seconds: Some(10),
        required_components: vec![CoveredComponent::derived(DerivedComponentName::Authority, false)],
        used_if_present_components: vec![],
        visible_alg: false,
    };

    let signed = sign(&spec, &context, &PrivateKey::Ed25519(signing_key), &clock)
        .expect("signing should succeed");

    let signature_input = signed.signature_input_entry.clone();
    let signature_header = signed.signature_entry.clone();

    let key_info = PublicKeyInfo {
        algorithm: Some(SignatureAlgorithm::Ed25519),
        key: PublicKey::Ed25519(verifying_key),
    };

    let verify_spec = VerificationSpec {
        selector: SignatureSelector { label: None, tag: Some("web-bot-auth".to_string()) },
        required_components: vec![CoveredComponent::derived(DerivedComponentName::Authority, false)],
        required_if_present_components: vec![],
        required_parameters: vec!["keyid", "created", "expires"],
        forbidden_parameters: vec![],
        max_age_seconds: None,
        max_skew_seconds: None,
    };

    let outcome = verify(&verify_spec, &context, &signature_input, &signature_header, &key_info, &clock)
        .expect("verification should succeed");
    log::info!("verified signature labeled `{}`", outcome.label);
}
