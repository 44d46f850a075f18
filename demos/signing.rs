// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

use ed25519_dalek::SigningKey;
use message_signatures::clock::SystemClock;
use message_signatures::component::{CoveredComponent, DerivedComponentName};
use message_signatures::context::SignatureContext;
use message_signatures::key::PrivateKey;
use message_signatures::sign::{sign, SignatureSpec};
use message_signatures::SignatureAlgorithm;
use url::Url;

fn main() {
    env_logger::init();

    let private_key_bytes: [u8; 32] = [
        0x9f, 0x83, 0x62, 0xf8, 0x7a, 0x48, 0x4a, 0x95, 0x4e, 0x6e, 0x74, 0x0c, 0x5b, 0x4c, 0x0e,
        0x84, 0x22, 0x91, 0x39, 0xa2, 0x0a, 0xa8, 0xab, 0x56, 0xff, 0x66, 0x58, 0x6f, 0x6a, 0x7d,
        0x29, 0xc5,
    ];
    let key = PrivateKey::Ed25519(SigningKey::from_bytes(&private_key_bytes));

    let url = Url::parse("https://example.com/").unwrap();
    let context = SignatureContext::request("GET", url);

    let spec = SignatureSpec {
        label: "sig1".to_string(),
        algorithm: SignatureAlgorithm::Ed25519,
        key_id: Some("poqkLGiymh_W0uP6PZFw-dvez3QJT5SolqXBCW38r0U".to_string()),
        nonce: Some("ZO3/XMEZjrvSnLtAP9M7jK0WGQf3J+pbmQRUpKDhF9/jsNCWqUh2sq+TH4WTX3/GpNoSZUa8eNWMKqxWp2/c2g==".to_string()),
        tag: Some("web-bot-auth".to_string()),
        created: None,
        expires_after_seconds: Some(10),
        required_components: vec![CoveredComponent::derived(DerivedComponentName::Authority, false)],
        used_if_present_components: vec![],
        visible_alg: false,
    };

    let result = sign(&spec, &context, &key, &SystemClock).expect("signing should succeed");

    log::info!("Signature-Input: {}", result.signature_input_entry);
    log::info!("Signature: {}", result.signature_entry);
    assert!(!result.signature_input_entry.is_empty());
    assert!(!result.signature_entry.is_empty());
}
