// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! # structured-fields
//!
//! A precise, round-trip-faithful codec for HTTP Structured Field Values
//! ([RFC 8941](https://www.rfc-editor.org/rfc/rfc8941)).
//!
//! This crate owns the full lexer/serializer over the RFC's small typed
//! algebra (Integer, Decimal, String, Token, Byte Sequence, Boolean, Inner
//! List), with parameter-bearing items and the two top-level containers
//! (List, Dictionary). It underlies `message-signatures`'s component
//! resolution and signature base construction, playing the role the `sfv`
//! crate plays upstream — but implemented as first-party source here, since
//! the codec's exact character classes, numeric precision, and canonical
//! serialization are themselves the subject under implementation.
//!
//! ## Entry points
//!
//! - [`parse_item`], [`parse_list`], [`parse_dictionary`], [`parse_any`]
//! - [`SerializeValue::serialize_value`] on any parsed or hand-built value
//!
//! All values are immutable once constructed; [`Item::with_params_replaced`]
//! returns a new value sharing the underlying bare item.

pub mod bare_item;
pub mod char_class;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod value;

pub use bare_item::{BareItem, Decimal, Integer, Key, SfString, Token};
pub use error::Error;
pub use parser::Parser;
pub use serializer::SerializeValue;
pub use value::{Dictionary, InnerList, Item, List, ListEntry, Parameters, StructuredValue};

/// Parses a single Item (a bare item plus parameters).
pub fn parse_item(input: &str) -> Result<Item, Error> {
    Parser::parse_item_toplevel(input)
}

/// Parses a top-level List.
pub fn parse_list(input: &str) -> Result<List, Error> {
    Parser::parse_list_toplevel(input)
}

/// Parses a top-level Dictionary.
pub fn parse_dictionary(input: &str) -> Result<Dictionary, Error> {
    Parser::parse_dictionary_toplevel(input)
}

/// Attempts List, then Dictionary, then a bare Item (only when there is no
/// top-level comma). See [`StructuredValue`].
pub fn parse_any(input: &str) -> Result<StructuredValue, Error> {
    Parser::parse_any_toplevel(input)
}

/// Parses an Item and checks its bare item matches the expected class,
/// using the supplied predicate (e.g. `BareItem::as_integer`).
pub fn parse_item_expecting<T>(
    input: &str,
    expected: &'static str,
    extract: impl Fn(&BareItem) -> Option<T>,
) -> Result<T, Error> {
    let item = parse_item(input)?;
    extract(&item.bare_item).ok_or(Error::WrongItemClass { expected })
}
