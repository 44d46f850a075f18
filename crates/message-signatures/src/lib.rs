// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! # message-signatures
//!
//! An implementation of HTTP Message Signatures as defined in
//! [RFC 9421](https://datatracker.ietf.org/doc/html/rfc9421), built on top
//! of this workspace's own [RFC 8941](https://www.rfc-editor.org/rfc/rfc8941)
//! Structured Field Values codec (`structured-fields`) rather than `sfv`.
//!
//! ## Features
//!
//! - **Structured field values**: the full typed algebra, re-exported from
//!   `structured-fields` for convenience.
//! - **Signature base construction**: every derived and field component RFC
//!   9421 defines, including the `sf`/`key`/`bs`/`tr`/`req` modifier flags.
//! - **Message signing**: an arbitrary covered-component list signed under
//!   any algorithm in the closed registry ([`algorithm::SignatureAlgorithm`]).
//! - **Message verification**: label- or tag-based signature selection,
//!   required/forbidden parameter and component checks, and expiration
//!   checks against an injectable [`clock::Clock`].
//!
//! Key decoding (PEM/DER) is left to callers; see the `demos` crate for an
//! example of wiring PEM-encoded keys into [`key::PrivateKey`]/[`key::PublicKey`].

pub mod algorithm;
pub mod base;
pub mod clock;
pub mod component;
pub mod context;
pub mod ec_validator;
pub mod error;
pub mod key;
pub mod params;
pub mod sign;
pub mod verify;

pub use algorithm::SignatureAlgorithm;
pub use base::{SignatureBase, SignatureBaseSpec};
pub use clock::{Clock, SystemClock};
pub use component::{CoveredComponent, DerivedComponentName, FieldFlags};
pub use context::SignatureContext;
pub use error::Error;
pub use key::{PrivateKey, PublicKey, PublicKeyInfo};
pub use params::SignatureParameters;
pub use sign::{sign, SignatureResult, SignatureSpec};
pub use verify::{verify, SignatureSelector, VerificationOutcome, VerificationSpec};
