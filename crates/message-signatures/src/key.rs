// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! The cryptographic primitives collaborator.
//!
//! Key decoding (PEM/DER) and the raw primitives are treated as
//! out-of-scope collaborators; this module is implemented directly
//! against the RustCrypto ecosystem crates (`rsa`, `p256`/`p384` + `ecdsa`,
//! `ed25519-dalek`, `hmac`/`sha2`) rather than writing its own curve
//! arithmetic. PEM/DER parsing itself is left to callers (see the `demos`
//! crate) — no ASN.1 parser is embedded here.

use rsa::pkcs1v15;
use rsa::pss;
use rsa::signature::{RandomizedSigner, Signer, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha512};

use crate::algorithm::SignatureAlgorithm;
use crate::ec_validator::{self, CurveParameters};
use crate::error::Error;

/// Private key material, tagged by the algorithm it will be used with.
/// The `EcdsaP256Sha256`/`EcdsaP384Sha384` variants carry an optional
/// explicit curve parameter set, supplied by a key decoder that parsed an
/// "explicit parameters" EC key rather than a named-curve key; when
/// present it is validated before every sign.
pub enum PrivateKey {
    RsaPssSha512(RsaPrivateKey),
    RsaV1_5Sha256(RsaPrivateKey),
    HmacSha256(Vec<u8>),
    EcdsaP256Sha256 {
        key: p256::ecdsa::SigningKey,
        explicit_curve_params: Option<CurveParameters>,
    },
    EcdsaP384Sha384 {
        key: p384::ecdsa::SigningKey,
        explicit_curve_params: Option<CurveParameters>,
    },
    Ed25519(ed25519_dalek::SigningKey),
}

/// Public key material, paired with an optional algorithm hint: this
/// algorithm wins if present, otherwise the signature's own `alg`
/// parameter is consulted.
pub struct PublicKeyInfo {
    pub algorithm: Option<SignatureAlgorithm>,
    pub key: PublicKey,
}

pub enum PublicKey {
    Rsa(RsaPublicKey),
    HmacSha256(Vec<u8>),
    EcdsaP256Sha256 {
        key: p256::ecdsa::VerifyingKey,
        explicit_curve_params: Option<CurveParameters>,
    },
    EcdsaP384Sha384 {
        key: p384::ecdsa::VerifyingKey,
        explicit_curve_params: Option<CurveParameters>,
    },
    Ed25519(ed25519_dalek::VerifyingKey),
}

/// Signs `message` with `key` under `algorithm`. ECDSA output is the fixed
/// length IEEE P1363 (`r || s`) form, which is what the `ecdsa` crate's
/// `Signature::to_bytes()` already returns.
pub fn sign(algorithm: SignatureAlgorithm, key: &PrivateKey, message: &[u8]) -> Result<Vec<u8>, Error> {
    match (algorithm, key) {
        (SignatureAlgorithm::RsaPssSha512, PrivateKey::RsaPssSha512(rsa_key)) => {
            let signing_key = pss::SigningKey::<Sha512>::new(rsa_key.clone());
            let mut rng = rand_core::OsRng;
            let signature = signing_key
                .try_sign_with_rng(&mut rng, message)
                .map_err(|e| Error::InvalidKey(e.to_string()))?;
            Ok(signature.to_vec())
        }
        (SignatureAlgorithm::RsaV1_5Sha256, PrivateKey::RsaV1_5Sha256(rsa_key)) => {
            let signing_key = pkcs1v15::SigningKey::<Sha256>::new(rsa_key.clone());
            let signature = signing_key
                .try_sign(message)
                .map_err(|e| Error::InvalidKey(e.to_string()))?;
            Ok(signature.to_vec())
        }
        (SignatureAlgorithm::HmacSha256, PrivateKey::HmacSha256(secret)) => hmac_sha256(secret, message),
        (
            SignatureAlgorithm::EcdsaP256Sha256,
            PrivateKey::EcdsaP256Sha256 {
                key,
                explicit_curve_params,
            },
        ) => {
            if let Some(candidate) = explicit_curve_params {
                ec_validator::validate_curve(candidate, &ec_validator::p256_reference())?;
            }
            let signature: p256::ecdsa::Signature = Signer::sign(key, message);
            Ok(signature.to_bytes().to_vec())
        }
        (
            SignatureAlgorithm::EcdsaP384Sha384,
            PrivateKey::EcdsaP384Sha384 {
                key,
                explicit_curve_params,
            },
        ) => {
            if let Some(candidate) = explicit_curve_params {
                ec_validator::validate_curve(candidate, &ec_validator::p384_reference())?;
            }
            let signature: p384::ecdsa::Signature = Signer::sign(key, message);
            Ok(signature.to_bytes().to_vec())
        }
        (SignatureAlgorithm::Ed25519, PrivateKey::Ed25519(key)) => {
            use ed25519_dalek::Signer as _;
            Ok(key.sign(message).to_bytes().to_vec())
        }
        _ => Err(Error::InvalidKey(format!(
            "key material does not match algorithm {algorithm}"
        ))),
    }
}

/// Verifies `signature` over `message` under `algorithm` with `key`.
pub fn verify(
    algorithm: SignatureAlgorithm,
    key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), Error> {
    match (algorithm, key) {
        (SignatureAlgorithm::RsaPssSha512, PublicKey::Rsa(rsa_key)) => {
            let verifying_key = pss::VerifyingKey::<Sha512>::new(rsa_key.clone());
            let signature = pss::Signature::try_from(signature)
                .map_err(|_| Error::InvalidKey("malformed RSA-PSS signature".to_string()))?;
            verifying_key
                .verify(message, &signature)
                .map_err(|_| incorrect(algorithm, message))
        }
        (SignatureAlgorithm::RsaV1_5Sha256, PublicKey::Rsa(rsa_key)) => {
            let verifying_key = pkcs1v15::VerifyingKey::<Sha256>::new(rsa_key.clone());
            let signature = pkcs1v15::Signature::try_from(signature)
                .map_err(|_| Error::InvalidKey("malformed RSA PKCS#1v1.5 signature".to_string()))?;
            verifying_key
                .verify(message, &signature)
                .map_err(|_| incorrect(algorithm, message))
        }
        (SignatureAlgorithm::HmacSha256, PublicKey::HmacSha256(secret)) => {
            let expected = hmac_sha256(secret, message)?;
            if expected == signature {
                Ok(())
            } else {
                Err(incorrect(algorithm, message))
            }
        }
        (
            SignatureAlgorithm::EcdsaP256Sha256,
            PublicKey::EcdsaP256Sha256 {
                key,
                explicit_curve_params,
            },
        ) => {
            if let Some(candidate) = explicit_curve_params {
                ec_validator::validate_curve(candidate, &ec_validator::p256_reference())?;
            }
            let signature = p256::ecdsa::Signature::from_slice(signature)
                .map_err(|_| Error::InvalidKey("malformed P-256 signature".to_string()))?;
            key.verify(message, &signature).map_err(|_| incorrect(algorithm, message))
        }
        (
            SignatureAlgorithm::EcdsaP384Sha384,
            PublicKey::EcdsaP384Sha384 {
                key,
                explicit_curve_params,
            },
        ) => {
            if let Some(candidate) = explicit_curve_params {
                ec_validator::validate_curve(candidate, &ec_validator::p384_reference())?;
            }
            let signature = p384::ecdsa::Signature::from_slice(signature)
                .map_err(|_| Error::InvalidKey("malformed P-384 signature".to_string()))?;
            key.verify(message, &signature).map_err(|_| incorrect(algorithm, message))
        }
        (SignatureAlgorithm::Ed25519, PublicKey::Ed25519(key)) => {
            use ed25519_dalek::Verifier as _;
            let signature = ed25519_dalek::Signature::from_slice(signature)
                .map_err(|_| Error::InvalidKey("malformed Ed25519 signature".to_string()))?;
            key.verify(message, &signature).map_err(|_| incorrect(algorithm, message))
        }
        _ => Err(Error::InvalidKey(format!(
            "key material does not match algorithm {algorithm}"
        ))),
    }
}

fn hmac_sha256(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, Error> {
    use hmac::{Hmac, Mac};
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| Error::InvalidKey(e.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn incorrect(algorithm: SignatureAlgorithm, _message: &[u8]) -> Error {
    // The caller (verify.rs) wraps this with the full signature base; here
    // we only know the message bytes actually hashed, not the base text,
    // so the final `IncorrectSignature` is reconstructed one layer up.
    Error::IncorrectSignature {
        algorithm: algorithm.wire_identifier(),
        base: String::new(),
    }
}
