// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

use std::fmt;

use crate::component::CoveredComponent;

/// Errors reported by the signature engine.
///
/// A closed `#[derive(Debug)]` enum with a manual `Display`/`std::error::Error`
/// impl rather than `thiserror`, keeping the dependency stack minimal.
#[derive(Debug)]
pub enum Error {
    /// The computed signature did not match. Carries the canonical
    /// algorithm identifier and the full signature base, for RFC 9421
    /// test-vector replay and auditing.
    IncorrectSignature { algorithm: &'static str, base: String },
    /// `created`/`expires`/`maxAgeSeconds`/`maxSkewSeconds` checks failed.
    SignatureExpired,
    /// The `alg` parameter or key-info algorithm named an identifier
    /// outside the closed registry.
    UnknownAlgorithm(String),
    /// Neither the public-key lookup nor the `alg` parameter supplied an
    /// algorithm.
    MissingAlgorithm,
    /// Key material was malformed, the wrong length, or the wrong curve
    /// for the requested algorithm.
    InvalidKey(String),
    /// A required header or trailer field was absent from the context.
    MissingHeader(String),
    /// A `req`-flagged component was requested but no related-request
    /// snapshot was present on the context.
    MissingRelatedRequest,
    /// A structured-field header failed to parse, or the codec's own
    /// error surfaced while resolving an `sf`/`key`-flagged component.
    InvalidStructuredHeader(String),
    /// A `key="K"` component named a dictionary member absent from the
    /// parsed header.
    MissingDictionaryKey(String),
    /// A `@query-param;name="X"` component named a parameter absent from
    /// the URI's query string.
    MissingQueryParam(String),
    /// A required signature parameter or required component was absent
    /// from the selected signature.
    MissingRequired(String),
    /// A declared component could not be resolved against the context at
    /// all (distinct from `MissingHeader`: covers derived components and
    /// generic resolution failures).
    MissingComponent(CoveredComponent),
    /// A forbidden signature parameter was present.
    ForbiddenPresent(String),
    /// Tag-based selection found no matching entry.
    MissingTag,
    /// Tag-based selection found more than one matching entry.
    DuplicateTag,
    /// A local validation error at builder-construction time: an empty
    /// dictionary key, an illegal component parameter, a missing
    /// `@query-param` name, etc. These are programmer errors, not
    /// over-the-wire conditions.
    Generic(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IncorrectSignature { algorithm, base } => {
                write!(f, "incorrect signature for algorithm {algorithm}; base was:\n{base}")
            }
            Error::SignatureExpired => write!(f, "signature expired or not yet valid"),
            Error::UnknownAlgorithm(a) => write!(f, "unknown algorithm: {a}"),
            Error::MissingAlgorithm => write!(f, "no algorithm could be resolved"),
            Error::InvalidKey(msg) => write!(f, "invalid key: {msg}"),
            Error::MissingHeader(name) => write!(f, "missing header: {name}"),
            Error::MissingRelatedRequest => write!(f, "component requires a related-request context that is absent"),
            Error::InvalidStructuredHeader(msg) => write!(f, "invalid structured header: {msg}"),
            Error::MissingDictionaryKey(key) => write!(f, "missing dictionary key: {key}"),
            Error::MissingQueryParam(name) => write!(f, "missing query parameter: {name}"),
            Error::MissingRequired(what) => write!(f, "missing required: {what}"),
            Error::MissingComponent(c) => write!(f, "could not resolve component: {c:?}"),
            Error::ForbiddenPresent(name) => write!(f, "forbidden parameter present: {name}"),
            Error::MissingTag => write!(f, "no signature matched the requested tag"),
            Error::DuplicateTag => write!(f, "more than one signature matched the requested tag"),
            Error::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<structured_fields::Error> for Error {
    fn from(e: structured_fields::Error) -> Self {
        // Codec errors are wrapped in InvalidStructuredHeader when they
        // arise during header parsing within the signature engine.
        Error::InvalidStructuredHeader(e.to_string())
    }
}
