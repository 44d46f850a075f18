// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! The message snapshot a signature base is built against.
//!
//! `SignatureContext` is an owned, concrete value rather than a trait an
//! application type must implement: callers build one from whatever HTTP
//! types they already have (as the `demos`
//! crate does from a hand-rolled request struct), and the engine resolves
//! every covered component against it, including `req`-flagged components
//! that redirect resolution to a nested `related_request` snapshot
//! (RFC 9421 §2.4, used when signing a response over request components).

use std::fmt::Write as _;

use structured_fields::{BareItem, SerializeValue};
use url::Url;

use crate::component::{CoveredComponent, DerivedComponentName};
use crate::error::Error;

/// An ordered, case-insensitive multimap of header/trailer field lines, in
/// the order they appeared on the wire. Field names are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct FieldLines(Vec<(String, String)>);

impl FieldLines {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Stores one field line. The value is canonicalized on insertion
    /// (RFC 9421 §2.1 field-value normalization, spec'd on the message
    /// snapshot itself): line endings are dropped, each resulting line is
    /// stripped of surrounding optional whitespace, blank lines are
    /// dropped, and the survivors are rejoined with a single space — so a
    /// folded or multi-line header value is indistinguishable from one
    /// that arrived as a single line.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into().to_ascii_lowercase(), sanitize_field_value(&value.into())));
    }

    /// All field-line values for `name`, in wire order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }
}

/// A single HTTP message snapshot: either a request or a response,
/// carrying enough context to resolve every derived and field component
/// RFC 9421 §2 defines.
#[derive(Debug, Clone)]
pub struct SignatureContext {
    pub method: Option<String>,
    pub target_uri: Option<Url>,
    pub status: Option<u16>,
    pub headers: FieldLines,
    pub trailers: FieldLines,
    /// Present when signing/verifying a response over request-bound
    /// components (the `req` flag, RFC 9421 §2.4).
    pub related_request: Option<Box<SignatureContext>>,
}

impl SignatureContext {
    pub fn request(method: impl Into<String>, target_uri: Url) -> Self {
        SignatureContext {
            method: Some(method.into()),
            target_uri: Some(target_uri),
            status: None,
            headers: FieldLines::new(),
            trailers: FieldLines::new(),
            related_request: None,
        }
    }

    pub fn response(status: u16) -> Self {
        SignatureContext {
            method: None,
            target_uri: None,
            status: Some(status),
            headers: FieldLines::new(),
            trailers: FieldLines::new(),
            related_request: None,
        }
    }

    pub fn with_related_request(mut self, request: SignatureContext) -> Self {
        self.related_request = Some(Box::new(request));
        self
    }

    /// Resolves one covered component to its signature base value.
    /// Does not handle `@signature-params`, which the base builder
    /// constructs directly from the parameter set.
    pub fn resolve(&self, component: &CoveredComponent) -> Result<String, Error> {
        if component.is_request_scoped() {
            let related = self.related_request.as_ref().ok_or(Error::MissingRelatedRequest)?;
            return related.resolve_unscoped(component);
        }
        self.resolve_unscoped(component)
    }

    fn resolve_unscoped(&self, component: &CoveredComponent) -> Result<String, Error> {
        match component {
            CoveredComponent::Derived { name, .. } => self.resolve_derived(name),
            CoveredComponent::Field { name, flags } => {
                let lines = if flags.tr { &self.trailers } else { &self.headers };
                let values = lines.values(name);
                if values.is_empty() {
                    return Err(Error::MissingHeader(name.clone()));
                }

                if flags.bs {
                    return serialize_byte_sequence_list(&values);
                }

                let combined = values
                    .iter()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");

                if let Some(member) = &flags.key {
                    let dictionary = structured_fields::parse_dictionary(&combined)?;
                    let entry = dictionary
                        .get(member)
                        .ok_or_else(|| Error::MissingDictionaryKey(member.clone()))?;
                    return Ok(serialize_list_entry(entry));
                }

                if flags.sf {
                    let value = structured_fields::parse_any(&combined)?;
                    return Ok(serialize_structured_value(&value));
                }

                Ok(combined)
            }
        }
    }

    fn resolve_derived(&self, name: &DerivedComponentName) -> Result<String, Error> {
        match name {
            DerivedComponentName::Method => self
                .method
                .clone()
                .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false))),
            DerivedComponentName::TargetUri => self
                .target_uri
                .as_ref()
                .map(|u| u.to_string())
                .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false))),
            DerivedComponentName::Authority => self
                .target_uri
                .as_ref()
                .map(|u| authority_of(u))
                .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false))),
            DerivedComponentName::Scheme => self
                .target_uri
                .as_ref()
                .map(|u| u.scheme().to_ascii_lowercase())
                .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false))),
            DerivedComponentName::Path => self
                .target_uri
                .as_ref()
                .map(|u| {
                    let path = u.path();
                    if path.is_empty() { "/".to_string() } else { path.to_string() }
                })
                .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false))),
            DerivedComponentName::Query => self
                .target_uri
                .as_ref()
                .map(|u| match u.query() {
                    Some(q) => format!("?{q}"),
                    None => "?".to_string(),
                })
                .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false))),
            DerivedComponentName::RequestTarget => {
                let url = self
                    .target_uri
                    .as_ref()
                    .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false)))?;
                let method = self
                    .method
                    .as_ref()
                    .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false)))?;
                Ok(request_target(method, url))
            }
            DerivedComponentName::Status => self
                .status
                .map(|s| s.to_string())
                .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false))),
            DerivedComponentName::QueryParam(param_name) => {
                let url = self
                    .target_uri
                    .as_ref()
                    .ok_or_else(|| Error::MissingComponent(CoveredComponent::derived(name.clone(), false)))?;
                let query = url.query().ok_or_else(|| Error::MissingQueryParam(param_name.clone()))?;
                query
                    .split('&')
                    .find_map(|pair| {
                        let (raw_key, raw_value) = match pair.split_once('=') {
                            Some((k, v)) => (k, v),
                            None => (pair, ""),
                        };
                        let canonical_key = canonical_percent_encode(&percent_decode(raw_key.as_bytes()));
                        if canonical_key == *param_name {
                            Some(canonical_percent_encode(&percent_decode(raw_value.as_bytes())))
                        } else {
                            None
                        }
                    })
                    .ok_or_else(|| Error::MissingQueryParam(param_name.clone()))
            }
        }
    }
}

/// Normalizes a raw field value the way a `SignatureContext` stores it:
/// split on line breaks, strip each line, drop blank lines, rejoin with a
/// single space.
fn sanitize_field_value(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Percent-decodes a raw query-string segment. Bytes not introduced by a
/// well-formed `%XX` escape pass through unchanged — in particular a
/// literal `+` is left as `+`, since query-param resolution is plain
/// percent-decoding, not `application/x-www-form-urlencoded` decoding.
fn percent_decode(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// The canonical encoder RFC 9421 §2.2.8 calls for when re-encoding a
/// percent-decoded query-param value: unreserved characters pass through
/// bare, everything else - including a literal space or `+` - is
/// percent-encoded with uppercase hex, so space becomes `%20` rather than
/// `+`.
fn canonical_percent_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

fn authority_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// `@request-target` (RFC 9421 §2.2.5, origin-form): `method path[?query]`
/// lowercased per-component where the grammar requires it, matching common
/// server implementations' canonical request line.
fn request_target(method: &str, url: &Url) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} ", method.to_ascii_uppercase());
    let path = url.path();
    out.push_str(if path.is_empty() { "/" } else { path });
    if let Some(q) = url.query() {
        let _ = write!(out, "?{q}");
    }
    out
}

fn serialize_byte_sequence_list(values: &[&str]) -> Result<String, Error> {
    let items: Vec<String> = values
        .iter()
        .map(|v| {
            structured_fields::Item::new(BareItem::ByteSequence(v.trim().as_bytes().to_vec())).serialize_value()
        })
        .collect();
    Ok(items.join(", "))
}

fn serialize_list_entry(entry: &structured_fields::ListEntry) -> String {
    match entry {
        structured_fields::ListEntry::Item(item) => item.serialize_value(),
        structured_fields::ListEntry::InnerList(inner) => inner.serialize_value(),
    }
}

fn serialize_structured_value(value: &structured_fields::StructuredValue) -> String {
    match value {
        structured_fields::StructuredValue::List(list) => list.serialize_value(),
        structured_fields::StructuredValue::Dictionary(dict) => dict.serialize_value(),
        structured_fields::StructuredValue::Item(item) => item.serialize_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::FieldFlags;

    fn sample_context() -> SignatureContext {
        let url = Url::parse("https://example.com/foo?a=1&b=2").unwrap();
        let mut ctx = SignatureContext::request("POST", url);
        ctx.headers.push("Content-Type", "application/json");
        ctx.headers.push("X-Multi", "a");
        ctx.headers.push("X-Multi", "b");
        ctx
    }

    #[test]
    fn resolves_authority_and_scheme() {
        let ctx = sample_context();
        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::Authority, false))
                .unwrap(),
            "example.com"
        );
        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::Scheme, false))
                .unwrap(),
            "https"
        );
    }

    #[test]
    fn resolves_query_param_by_name() {
        let ctx = sample_context();
        let component = CoveredComponent::derived(DerivedComponentName::QueryParam("b".to_string()), false);
        assert_eq!(ctx.resolve(&component).unwrap(), "2");
    }

    #[test]
    fn combines_repeated_field_lines() {
        let ctx = sample_context();
        let component = CoveredComponent::field("x-multi", FieldFlags::default()).unwrap();
        assert_eq!(ctx.resolve(&component).unwrap(), "a, b");
    }

    #[test]
    fn missing_header_is_reported() {
        let ctx = sample_context();
        let component = CoveredComponent::field("nonexistent", FieldFlags::default()).unwrap();
        assert!(ctx.resolve(&component).is_err());
    }

    #[test]
    fn req_flag_without_related_request_fails() {
        let ctx = sample_context();
        let component =
            CoveredComponent::field("content-type", FieldFlags { req: true, ..Default::default() }).unwrap();
        assert!(matches!(ctx.resolve(&component), Err(Error::MissingRelatedRequest)));
    }

    /// RFC 9421 §2.2.8 worked example: query param encoding edge cases.
    #[test]
    fn query_param_encoding_edge_cases() {
        let url = Url::parse("https://example.com/foo?cat=red&dog=white&ok&blue").unwrap();
        let ctx = SignatureContext::request("GET", url);

        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::QueryParam("blue".to_string()), false))
                .unwrap(),
            ""
        );
        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::QueryParam("dog".to_string()), false))
                .unwrap(),
            "white"
        );
        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::Query, false)).unwrap(),
            "?cat=red&dog=white&ok&blue"
        );
    }

    /// A query-param value is percent-decoded then re-encoded with the
    /// canonical encoder, not form-decoded: `%20` and a literal `+` are
    /// distinct, and the re-encoded result always uses `%20` for space.
    #[test]
    fn query_param_value_is_percent_decoded_then_canonically_re_encoded() {
        let url = Url::parse("https://example.com/foo?x=a%20b&y=a+b&z=a%2Bb").unwrap();
        let ctx = SignatureContext::request("GET", url);

        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::QueryParam("x".to_string()), false))
                .unwrap(),
            "a%20b"
        );
        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::QueryParam("y".to_string()), false))
                .unwrap(),
            "a%2Bb"
        );
        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::QueryParam("z".to_string()), false))
                .unwrap(),
            "a%2Bb"
        );
    }

    #[test]
    fn absent_path_resolves_to_slash_and_absent_query_to_bare_question_mark() {
        let url = Url::parse("https://example.com").unwrap();
        let ctx = SignatureContext::request("GET", url);

        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::Path, false)).unwrap(),
            "/"
        );
        assert_eq!(
            ctx.resolve(&CoveredComponent::derived(DerivedComponentName::Query, false)).unwrap(),
            "?"
        );
    }

    /// RFC 9421 §2.1's `bs` flag: each raw value is wrapped as its own
    /// byte-sequence literal, independently, then joined by `, `.
    #[test]
    fn bs_flag_wraps_each_value_independently() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let mut ctx = SignatureContext::request("GET", url);
        ctx.headers.push("Example-Header", "value, with, lots");
        ctx.headers.push("Example-Header", "of, commas");

        let component =
            CoveredComponent::field("example-header", FieldFlags { bs: true, ..Default::default() }).unwrap();
        assert_eq!(
            ctx.resolve(&component).unwrap(),
            ":dmFsdWUsIHdpdGgsIGxvdHM=:, :b2YsIGNvbW1hcw==:"
        );
    }

    #[test]
    fn req_flag_resolves_against_related_request() {
        let related = sample_context();
        let response = SignatureContext::response(200).with_related_request(related);
        let component =
            CoveredComponent::derived(DerivedComponentName::Authority, true);
        assert_eq!(response.resolve(&component).unwrap(), "example.com");
    }

    /// A multi-line (obs-folded) field value is normalized at insertion
    /// time to per-line strip + blank-drop + space-join.
    #[test]
    fn multiline_field_value_is_sanitized_on_insertion() {
        let url = Url::parse("https://example.com/foo").unwrap();
        let mut ctx = SignatureContext::request("GET", url);
        ctx.headers.push("X-Folded", "  first line  \r\n\r\n   second line\n");

        let component = CoveredComponent::field("x-folded", FieldFlags::default()).unwrap();
        assert_eq!(ctx.resolve(&component).unwrap(), "first line second line");
    }
}
