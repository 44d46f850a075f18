// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! The closed signature algorithm registry.

use crate::error::Error;

/// Which family of key material an algorithm needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    Rsa,
    RsaPss,
    Ec,
    Ed25519,
    /// Symmetric (HMAC) keying material.
    Symmetric,
}

/// The closed set of signature algorithms this engine supports. Each
/// variant carries its IANA wire identifier and its required key class;
/// RSA-PSS additionally carries its fixed parameter set (MGF1-SHA-512,
/// salt length 64).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    RsaPssSha512,
    RsaV1_5Sha256,
    HmacSha256,
    EcdsaP256Sha256,
    EcdsaP384Sha384,
    Ed25519,
}

impl SignatureAlgorithm {
    /// The wire identifier used in the `alg` signature parameter.
    pub fn wire_identifier(self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaPssSha512 => "rsa-pss-sha512",
            SignatureAlgorithm::RsaV1_5Sha256 => "rsa-v1_5-sha256",
            SignatureAlgorithm::HmacSha256 => "hmac-sha256",
            SignatureAlgorithm::EcdsaP256Sha256 => "ecdsa-p256-sha256",
            SignatureAlgorithm::EcdsaP384Sha384 => "ecdsa-p384-sha384",
            SignatureAlgorithm::Ed25519 => "ed25519",
        }
    }

    pub fn key_class(self) -> KeyClass {
        match self {
            SignatureAlgorithm::RsaPssSha512 => KeyClass::RsaPss,
            SignatureAlgorithm::RsaV1_5Sha256 => KeyClass::Rsa,
            SignatureAlgorithm::HmacSha256 => KeyClass::Symmetric,
            SignatureAlgorithm::EcdsaP256Sha256 => KeyClass::Ec,
            SignatureAlgorithm::EcdsaP384Sha384 => KeyClass::Ec,
            SignatureAlgorithm::Ed25519 => KeyClass::Ed25519,
        }
    }

    /// Whether signatures produced by this algorithm are deterministic for
    /// identical inputs: deterministic algorithms produce byte-identical
    /// signatures on repeat runs, probabilistic ones merely
    /// verify-equivalent ones.
    pub fn is_deterministic(self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::Ed25519 | SignatureAlgorithm::HmacSha256
        )
    }

    pub fn from_wire_identifier(id: &str) -> Result<Self, Error> {
        match id {
            "rsa-pss-sha512" => Ok(SignatureAlgorithm::RsaPssSha512),
            "rsa-v1_5-sha256" => Ok(SignatureAlgorithm::RsaV1_5Sha256),
            "hmac-sha256" => Ok(SignatureAlgorithm::HmacSha256),
            "ecdsa-p256-sha256" => Ok(SignatureAlgorithm::EcdsaP256Sha256),
            "ecdsa-p384-sha384" => Ok(SignatureAlgorithm::EcdsaP384Sha384),
            "ed25519" => Ok(SignatureAlgorithm::Ed25519),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_wire_identifier() {
        let all = [
            SignatureAlgorithm::RsaPssSha512,
            SignatureAlgorithm::RsaV1_5Sha256,
            SignatureAlgorithm::HmacSha256,
            SignatureAlgorithm::EcdsaP256Sha256,
            SignatureAlgorithm::EcdsaP384Sha384,
            SignatureAlgorithm::Ed25519,
        ];
        for alg in all {
            let parsed = SignatureAlgorithm::from_wire_identifier(alg.wire_identifier()).unwrap();
            assert_eq!(parsed, alg);
        }
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        assert!(SignatureAlgorithm::from_wire_identifier("made-up").is_err());
    }

    #[test]
    fn determinism_matches_key_class() {
        assert!(SignatureAlgorithm::Ed25519.is_deterministic());
        assert!(SignatureAlgorithm::HmacSha256.is_deterministic());
        assert!(!SignatureAlgorithm::RsaPssSha512.is_deterministic());
        assert!(!SignatureAlgorithm::EcdsaP256Sha256.is_deterministic());
    }
}
