// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

use message_signatures::clock::FixedClock;
use message_signatures::component::{CoveredComponent, DerivedComponentName};
use message_signatures::context::SignatureContext;
use message_signatures::key::{PublicKey, PublicKeyInfo};
use message_signatures::verify::{verify, SignatureSelector, VerificationSpec};
use message_signatures::SignatureAlgorithm;
use url::Url;

fn main() {
    env_logger::init();

    // Verifying an arbitrary message signature, not tied to any particular
    // selection policy beyond "the entry labeled sig1".
    let signature_input = r#"sig1=("@authority");created=1735689600;keyid="poqkLGiymh_W0uP6PZFw-dvez3QJT5SolqXBCW38r0U";alg="ed25519";expires=1735693200;nonce="gubxywVx7hzbYKatLgzuKDllDAIXAkz41PydU7aOY7vT+Mb3GJNxW0qD4zJ+IOQ1NVtg+BNbTCRUMt1Ojr5BgA==";tag="web-bot-auth""#;
    let signature = "sig1=:uz2SAv+VIemw+Oo890bhYh6Xf5qZdLUgv6/PbiQfCFXcX/vt1A8Pf7OcgL2yUDUYXFtffNpkEr5W6dldqFrkDg==:";

    let public_key: [u8; 32] = [
        0x26, 0xb4, 0x0b, 0x8f, 0x93, 0xff, 0xf3, 0xd8, 0x97, 0x11, 0x2f, 0x7e, 0xbc, 0x58, 0x2b,
        0x23, 0x2d, 0xbd, 0x72, 0x51, 0x7d, 0x08, 0x2f, 0xe8, 0x3c, 0xfb, 0x30, 0xdd, 0xce, 0x43,
        0xd1, 0xbb,
    ];
    let key_info = PublicKeyInfo {
        algorithm: Some(SignatureAlgorithm::Ed25519),
        key: PublicKey::Ed25519(ed25519_dalek::VerifyingKey::from_bytes(&public_key).unwrap()),
    };

    let url = Url::parse("https://example.com/").unwrap();
    let context = SignatureContext::request("GET", url);

    // The signature's own `created` is replayed here rather than the wall
    // clock, so this demo keeps passing regardless of when it is run.
    let clock = FixedClock(1_735_689_700);

    let spec = VerificationSpec {
        selector: SignatureSelector { label: Some("sig1".to_string()), tag: None },
        required_components: vec![CoveredComponent::derived(DerivedComponentName::Authority, false)],
        required_if_present_components: vec![],
        required_parameters: vec![],
        forbidden_parameters: vec![],
        max_age_seconds: None,
        max_skew_seconds: None,
    };

    let outcome = verify(&spec, &context, signature_input, signature, &key_info, &clock)
        .expect("signature should verify");
    log::info!("verified signature labeled `{}`", outcome.label);
}
