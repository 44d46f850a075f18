// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! Elliptic curve validator.
//!
//! `p256`/`p384` key types are curve-fixed by construction, so ordinary use
//! of this engine can never mix up a P-256 key with a P-384 algorithm - the
//! type system already prevents it. This module exists for a narrower
//! case: a key decoded from an "explicit parameters" EC key (domain
//! parameters spelled out on the wire rather than referenced by a
//! named-curve OID). A key-decoder collaborator may
//! hand back such explicit parameters alongside the typed key; before
//! signing or verifying we confirm they are structurally the curve the
//! chosen algorithm requires, preventing "accidental reuse of a valid EC
//! key on the wrong-size curve".

use crate::error::Error;

/// The domain parameter tuple `(p, a, b, Gx, Gy, n, h)` for a named curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveParameters {
    pub p: Vec<u8>,
    pub a: Vec<u8>,
    pub b: Vec<u8>,
    pub gx: Vec<u8>,
    pub gy: Vec<u8>,
    pub n: Vec<u8>,
    pub h: u32,
}

fn hex(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        let hi = (bytes[i] as char).to_digit(16).expect("static hex constant");
        let lo = (bytes[i + 1] as char).to_digit(16).expect("static hex constant");
        out.push(((hi << 4) | lo) as u8);
        i += 2;
    }
    out
}

/// NIST P-256 (secp256r1) reference domain parameters.
pub fn p256_reference() -> CurveParameters {
    CurveParameters {
        p: hex("FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFF"),
        a: hex("FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFC"),
        b: hex("5AC635D8AA3A93E7B3EBBD55769886BC651D06B0CC53B0F63BCE3C3E27D2604B"),
        gx: hex("6B17D1F2E12C4247F8BCE6E563A440F277037D812DEB33A0F4A13945D898C296"),
        gy: hex("4FE342E2FE1A7F9B8EE7EB4A7C0F9E162BCE33576B315ECECBB6406837BF51F5"),
        n: hex("FFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551"),
        h: 1,
    }
}

/// NIST P-384 (secp384r1) reference domain parameters.
pub fn p384_reference() -> CurveParameters {
    CurveParameters {
        p: hex(
            "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFF0000000000000000FFFFFFFF",
        ),
        a: hex(
            "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFF0000000000000000FFFFFFFC",
        ),
        b: hex(
            "B3312FA7E23EE7E4988E056BE3F82D19181D9C6EFE8141120314088F5013875AC656398D8A2ED19D2A85C8EDD3EC2AEF",
        ),
        gx: hex(
            "AA87CA22BE8B05378EB1C71EF320AD746E1D3B628BA79B9859F741E082542A385502F25DBF55296C3A545E3872760AB7",
        ),
        gy: hex(
            "3617DE4A96262C6F5D9E98BF9292DC29F8F41DBD289A147CE9DA3113B5F0B8C00A60B1CE1D7E819D7A431D7C90EA0E5F",
        ),
        n: hex(
            "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFC7634D81F4372DDF581A0DB248B0A77AECEC196ACCC52973",
        ),
        h: 1,
    }
}

/// Confirms `candidate` is structurally identical to `reference`. Mismatch
/// is `InvalidKey`.
pub fn validate_curve(candidate: &CurveParameters, reference: &CurveParameters) -> Result<(), Error> {
    if candidate == reference {
        Ok(())
    } else {
        Err(Error::InvalidKey(
            "EC key's curve parameters do not match the algorithm's required curve".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p256_matches_itself() {
        assert!(validate_curve(&p256_reference(), &p256_reference()).is_ok());
    }

    #[test]
    fn p256_does_not_match_p384() {
        assert!(validate_curve(&p256_reference(), &p384_reference()).is_err());
    }

    #[test]
    fn hex_decodes_known_length() {
        // P-256 prime is 32 bytes.
        assert_eq!(p256_reference().p.len(), 32);
        // P-384 prime is 48 bytes.
        assert_eq!(p384_reference().p.len(), 48);
    }
}
