// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! Signature parameters: the ordered, closed set of
//! metadata attached to a signature via `@signature-params`: `created`,
//! `expires`, `nonce`, `alg`, `keyid`, `tag`. Order is preserved because it
//! is part of the canonical signature base, backed directly by our own
//! `structured_fields::Parameters` rather than a hash-ordered map.

use structured_fields::{BareItem, Integer, Key, Parameters, SfString};

use crate::error::Error;

const KNOWN_PARAMETERS: &[&str] = &["created", "expires", "nonce", "alg", "keyid", "tag"];

/// An ordered view over a signature's parameters, backed directly by a
/// `structured_fields::Parameters` so that insertion order - which becomes
/// serialization order in the signature base - is exactly what the caller
/// built.
#[derive(Debug, Clone, Default)]
pub struct SignatureParameters(Parameters);

impl SignatureParameters {
    pub fn new() -> Self {
        Self(Parameters::new())
    }

    pub fn set_created(&mut self, value: i64) {
        self.insert_integer("created", value);
    }

    pub fn set_expires(&mut self, value: i64) {
        self.insert_integer("expires", value);
    }

    pub fn set_nonce(&mut self, value: &str) -> Result<(), Error> {
        self.insert_string("nonce", value)
    }

    pub fn set_alg(&mut self, value: &str) -> Result<(), Error> {
        self.insert_string("alg", value)
    }

    pub fn set_keyid(&mut self, value: &str) -> Result<(), Error> {
        self.insert_string("keyid", value)
    }

    pub fn set_tag(&mut self, value: &str) -> Result<(), Error> {
        self.insert_string("tag", value)
    }

    fn insert_integer(&mut self, name: &str, value: i64) {
        let key = Key::new(name).expect("static ASCII key");
        self.0.insert(key, BareItem::Integer(value as Integer));
    }

    fn insert_string(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let key = Key::new(name).expect("static ASCII key");
        let sf_string = SfString::new(value)
            .map_err(|_| Error::Generic(format!("`{name}` contains non-printable ASCII characters")))?;
        self.0.insert(key, BareItem::String(sf_string));
        Ok(())
    }

    pub fn created(&self) -> Option<i64> {
        self.get_integer("created")
    }

    pub fn expires(&self) -> Option<i64> {
        self.get_integer("expires")
    }

    pub fn nonce(&self) -> Option<&str> {
        self.get_string("nonce")
    }

    pub fn alg(&self) -> Option<&str> {
        self.get_string("alg")
    }

    pub fn keyid(&self) -> Option<&str> {
        self.get_string("keyid")
    }

    pub fn tag(&self) -> Option<&str> {
        self.get_string("tag")
    }

    fn get_integer(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(BareItem::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    fn get_string(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(BareItem::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_parameters(&self) -> &Parameters {
        &self.0
    }

    /// Rebuilds from a freshly parsed `@signature-params` inner list's
    /// parameters. Any parameter name outside the closed set is rejected,
    /// per the closed enumeration this engine supports.
    pub fn from_parameters(params: Parameters) -> Result<Self, Error> {
        for (key, _) in params.iter() {
            if !KNOWN_PARAMETERS.contains(&key.as_str()) {
                return Err(Error::Generic(format!(
                    "unrecognized signature parameter `{}`",
                    key.as_str()
                )));
            }
        }
        Ok(Self(params))
    }
}
