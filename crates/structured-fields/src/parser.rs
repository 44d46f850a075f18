// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

use base64::Engine as _;

use crate::bare_item::{BareItem, Decimal, Key, SfString, Token, MAX_DECIMAL_MILLI_MAGNITUDE};
use crate::char_class::{
    is_digit, is_key_char, is_key_start, is_ows, is_string_char, is_token_char, is_token_start,
    HTAB, SP,
};
use crate::error::Error;
use crate::value::{Dictionary, InnerList, Item, List, ListEntry, Parameters, StructuredValue};

/// A single-pass cursor over the bytes of a Structured Field Value, with
/// one-byte lookahead.
pub struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn err_unexpected(&self) -> Error {
        Error::UnexpectedCharacter {
            position: self.pos,
            found: self.peek().map(|b| b as char),
        }
    }

    fn skip_sp(&mut self) {
        while self.peek() == Some(SP) {
            self.pos += 1;
        }
    }

    fn skip_ows(&mut self) {
        while self.peek().is_some_and(is_ows) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), Error> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(Error::MissingCharacter { expected: b as char })
        }
    }

    /// Ensures the full input was consumed; any remaining non-EOF
    /// character is reported as `UnexpectedCharacter`.
    fn expect_eof(&self) -> Result<(), Error> {
        if self.is_eof() {
            Ok(())
        } else {
            Err(self.err_unexpected())
        }
    }

    // -- top-level entry points -------------------------------------------------

    pub fn parse_item_toplevel(input: &str) -> Result<Item, Error> {
        let trimmed = trim_sp(input)?;
        let mut parser = Parser::new(trimmed);
        let item = parser.parse_item()?;
        parser.expect_eof()?;
        Ok(item)
    }

    pub fn parse_list_toplevel(input: &str) -> Result<List, Error> {
        let trimmed = trim_sp(input)?;
        let mut parser = Parser::new(trimmed);
        let list = parser.parse_list()?;
        parser.expect_eof()?;
        Ok(list)
    }

    pub fn parse_dictionary_toplevel(input: &str) -> Result<Dictionary, Error> {
        let trimmed = trim_sp(input)?;
        let mut parser = Parser::new(trimmed);
        let dict = parser.parse_dictionary()?;
        parser.expect_eof()?;
        Ok(dict)
    }

    /// Attempts List first, then Dictionary, then a bare Item when there is
    /// no top-level comma.
    pub fn parse_any_toplevel(input: &str) -> Result<StructuredValue, Error> {
        let trimmed = trim_sp(input)?;
        if let Ok(list) = Parser::parse_list_toplevel(trimmed) {
            return Ok(StructuredValue::List(list));
        }
        if let Ok(dict) = Parser::parse_dictionary_toplevel(trimmed) {
            return Ok(StructuredValue::Dictionary(dict));
        }
        if !trimmed.as_bytes().contains(&b',') {
            return Ok(StructuredValue::Item(Parser::parse_item_toplevel(trimmed)?));
        }
        // All three forms failed; surface the List parse's error, since it
        // is attempted first and is the most informative default.
        Parser::parse_list_toplevel(trimmed).map(StructuredValue::List)
    }

    // -- list / dictionary --------------------------------------------------

    fn parse_list(&mut self) -> Result<List, Error> {
        let mut entries = Vec::new();
        if self.is_eof() {
            return Ok(entries);
        }
        loop {
            entries.push(self.parse_item_or_inner_list()?);
            self.skip_ows();
            if self.is_eof() {
                break;
            }
            self.expect(b',')?;
            self.skip_ows();
            if self.is_eof() {
                // Trailing comma.
                return Err(self.err_unexpected());
            }
        }
        Ok(entries)
    }

    fn parse_dictionary(&mut self) -> Result<Dictionary, Error> {
        let mut dict = Dictionary::new();
        if self.is_eof() {
            return Ok(dict);
        }
        loop {
            let key = self.parse_key()?;
            let entry = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.parse_item_or_inner_list()?
            } else {
                let params = self.parse_parameters()?;
                ListEntry::Item(Item::with_params(BareItem::Boolean(true), params))
            };
            dict.insert(key, entry);
            self.skip_ows();
            if self.is_eof() {
                break;
            }
            self.expect(b',')?;
            self.skip_ows();
            if self.is_eof() {
                return Err(self.err_unexpected());
            }
        }
        Ok(dict)
    }

    fn parse_item_or_inner_list(&mut self) -> Result<ListEntry, Error> {
        if self.peek() == Some(b'(') {
            Ok(ListEntry::InnerList(self.parse_inner_list()?))
        } else {
            Ok(ListEntry::Item(self.parse_item()?))
        }
    }

    fn parse_inner_list(&mut self) -> Result<InnerList, Error> {
        self.expect(b'(')?;
        let mut items = Vec::new();
        loop {
            self.skip_sp();
            if self.peek() == Some(b')') {
                self.pos += 1;
                break;
            }
            items.push(self.parse_item()?);
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                Some(SP) => continue,
                _ => return Err(self.err_unexpected()),
            }
        }
        let params = self.parse_parameters()?;
        Ok(InnerList::with_params(items, params))
    }

    // -- item / bare item -----------------------------------------------------

    fn parse_item(&mut self) -> Result<Item, Error> {
        let bare_item = self.parse_bare_item()?;
        let params = self.parse_parameters()?;
        Ok(Item::with_params(bare_item, params))
    }

    fn parse_bare_item(&mut self) -> Result<BareItem, Error> {
        match self.peek() {
            Some(b'-') => self.parse_number(),
            Some(b) if is_digit(b) => self.parse_number(),
            Some(b'"') => self.parse_string(),
            Some(b':') => self.parse_byte_sequence(),
            Some(b'?') => self.parse_boolean(),
            Some(b) if is_token_start(b) => self.parse_token(),
            _ => Err(self.err_unexpected()),
        }
    }

    fn parse_number(&mut self) -> Result<BareItem, Error> {
        let mut negative = false;
        if self.peek() == Some(b'-') {
            negative = true;
            self.pos += 1;
        }
        if !self.peek().is_some_and(is_digit) {
            return Err(self.err_unexpected());
        }

        let mut digits = String::new();
        let mut is_decimal = false;
        while let Some(b) = self.peek() {
            if is_digit(b) {
                if !is_decimal && digits.len() == 15 {
                    return Err(Error::WrongNumber("integer part exceeds 15 digits"));
                }
                if is_decimal && digits.len() - (digits.find('.').map(|p| p + 1).unwrap_or(0)) >= 3
                {
                    return Err(Error::WrongNumber("fractional part exceeds 3 digits"));
                }
                digits.push(b as char);
                self.pos += 1;
            } else if b == b'.' && !is_decimal {
                let int_digits = digits.len();
                if int_digits > 12 {
                    return Err(Error::WrongNumber(
                        "decimal integer part exceeds 12 digits",
                    ));
                }
                is_decimal = true;
                digits.push('.');
                self.pos += 1;
                if !self.peek().is_some_and(is_digit) {
                    return Err(Error::WrongNumber("decimal point must be followed by a digit"));
                }
            } else {
                break;
            }
        }

        if is_decimal {
            let frac_digits = digits.len() - digits.find('.').unwrap() - 1;
            if !(1..=3).contains(&frac_digits) {
                return Err(Error::WrongNumber("fractional part must be 1-3 digits"));
            }
            let (int_part, frac_part) = digits.split_once('.').unwrap();
            let int_val: i64 = int_part.parse().map_err(|_| Error::WrongNumber("malformed integer part"))?;
            let mut frac_val: i64 = frac_part.parse().map_err(|_| Error::WrongNumber("malformed fractional part"))?;
            for _ in 0..(3 - frac_digits) {
                frac_val *= 10;
            }
            let mut milli = int_val * 1000 + frac_val;
            if negative {
                milli = -milli;
            }
            if milli.unsigned_abs() as i64 > MAX_DECIMAL_MILLI_MAGNITUDE {
                return Err(Error::WrongNumber("decimal magnitude too large"));
            }
            Ok(BareItem::Decimal(Decimal::from_milli(milli)?))
        } else {
            let mut val: i64 = digits.parse().map_err(|_| Error::WrongNumber("malformed integer"))?;
            if negative {
                val = -val;
            }
            Ok(BareItem::integer(val)?)
        }
    }

    fn parse_string(&mut self) -> Result<BareItem, Error> {
        self.expect(b'"')?;
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(Error::MissingCharacter { expected: '"' }),
                Some(b'"') => break,
                Some(b'\\') => match self.bump() {
                    Some(b'"') => s.push('"'),
                    Some(b'\\') => s.push('\\'),
                    Some(other) => {
                        return Err(Error::UnexpectedCharacter {
                            position: self.pos - 1,
                            found: Some(other as char),
                        })
                    }
                    None => return Err(Error::MissingCharacter { expected: '"' }),
                },
                Some(b) if is_string_char(b) => s.push(b as char),
                Some(b) => {
                    return Err(Error::UnexpectedCharacter {
                        position: self.pos - 1,
                        found: Some(b as char),
                    })
                }
            }
        }
        Ok(BareItem::String(SfString::new_unchecked(s)))
    }

    fn parse_byte_sequence(&mut self) -> Result<BareItem, Error> {
        self.expect(b':')?;
        let start = self.pos;
        while self.peek().is_some_and(|b| b != b':') {
            self.pos += 1;
        }
        let body = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");
        self.expect(b':')?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body)
            .map_err(|_| Error::InvalidBytes)?;
        Ok(BareItem::ByteSequence(bytes))
    }

    fn parse_boolean(&mut self) -> Result<BareItem, Error> {
        self.expect(b'?')?;
        match self.bump() {
            Some(b'0') => Ok(BareItem::Boolean(false)),
            Some(b'1') => Ok(BareItem::Boolean(true)),
            _ => Err(Error::UnexpectedCharacter {
                position: self.pos.saturating_sub(1),
                found: self.input.get(self.pos.saturating_sub(1)).map(|&b| b as char),
            }),
        }
    }

    fn parse_token(&mut self) -> Result<BareItem, Error> {
        let start = self.pos;
        self.pos += 1; // token-start already validated by caller
        while self.peek().is_some_and(is_token_char) {
            self.pos += 1;
        }
        let s = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");
        Ok(BareItem::Token(Token::new_unchecked(s)))
    }

    fn parse_key(&mut self) -> Result<Key, Error> {
        let start = self.pos;
        if !self.peek().is_some_and(is_key_start) {
            return Err(self.err_unexpected());
        }
        self.pos += 1;
        while self.peek().is_some_and(is_key_char) {
            self.pos += 1;
        }
        let s = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");
        Ok(Key::new_unchecked(s))
    }

    fn parse_parameters(&mut self) -> Result<Parameters, Error> {
        let mut params = Parameters::new();
        while self.peek() == Some(b';') {
            self.pos += 1;
            self.skip_sp();
            let key = self.parse_key()?;
            let value = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.parse_bare_item()?
            } else {
                BareItem::Boolean(true)
            };
            params.insert(key, value);
        }
        Ok(params)
    }
}

/// Strips leading/trailing `SP` only (not `HTAB`), and rejects an empty
/// result.
fn trim_sp(input: &str) -> Result<&str, Error> {
    let bytes = input.as_bytes();
    let start = bytes.iter().position(|&b| b != SP).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != SP).map(|p| p + 1).unwrap_or(0);
    if start >= end {
        return Err(Error::EmptyInput);
    }
    // Reject HTAB leaking through the trimmed region's edges is unnecessary:
    // HTAB is only special inside OWS runs around top-level commas.
    let _ = HTAB;
    Ok(&input[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_error() {
        assert_eq!(Parser::parse_item_toplevel(""), Err(Error::EmptyInput));
        assert_eq!(Parser::parse_item_toplevel("   "), Err(Error::EmptyInput));
    }

    #[test]
    fn parses_simple_token() {
        let item = Parser::parse_item_toplevel("foo").unwrap();
        assert_eq!(item.bare_item.as_token().unwrap().as_str(), "foo");
    }

    #[test]
    fn parses_integer_and_decimal() {
        let item = Parser::parse_item_toplevel("42").unwrap();
        assert_eq!(item.bare_item.as_integer(), Some(42));

        let item = Parser::parse_item_toplevel("4.5").unwrap();
        assert_eq!(item.bare_item.as_decimal().unwrap().as_milli(), 4500);

        let item = Parser::parse_item_toplevel("-4.50").unwrap();
        assert_eq!(item.bare_item.as_decimal().unwrap().as_milli(), -4500);
    }

    #[test]
    fn rejects_too_many_integer_digits() {
        assert!(Parser::parse_item_toplevel("1000000000000000").is_err());
        assert!(Parser::parse_item_toplevel("100000000000000").is_ok());
    }

    #[test]
    fn rejects_too_many_decimal_fraction_digits() {
        assert!(Parser::parse_item_toplevel("1.2345").is_err());
        assert!(Parser::parse_item_toplevel("1.234").is_ok());
    }

    #[test]
    fn parses_string_with_escapes() {
        let item = Parser::parse_item_toplevel(r#""a \"quoted\" \\value""#).unwrap();
        assert_eq!(item.bare_item.as_str().unwrap(), "a \"quoted\" \\value");
    }

    #[test]
    fn unterminated_string_is_missing_character() {
        assert_eq!(
            Parser::parse_item_toplevel("\"abc"),
            Err(Error::MissingCharacter { expected: '"' })
        );
    }

    #[test]
    fn parses_byte_sequence() {
        let item = Parser::parse_item_toplevel(":aGVsbG8=:").unwrap();
        assert_eq!(item.bare_item.as_byte_sequence().unwrap(), b"hello");
    }

    #[test]
    fn invalid_base64_is_invalid_bytes() {
        assert_eq!(
            Parser::parse_item_toplevel(":not base64!:"),
            Err(Error::InvalidBytes)
        );
    }

    #[test]
    fn parses_boolean() {
        let item = Parser::parse_item_toplevel("?1").unwrap();
        assert_eq!(item.bare_item.as_boolean(), Some(true));
        let item = Parser::parse_item_toplevel("?0").unwrap();
        assert_eq!(item.bare_item.as_boolean(), Some(false));
    }

    #[test]
    fn parses_item_with_parameters() {
        let item = Parser::parse_item_toplevel(r#"foo;a;b="x""#).unwrap();
        assert_eq!(item.bare_item.as_token().unwrap().as_str(), "foo");
        assert_eq!(item.params.get("a").unwrap().as_boolean(), Some(true));
        assert_eq!(item.params.get("b").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn parses_inner_list_with_params() {
        let list = Parser::parse_list_toplevel(r#"("a" "b");lvl=1"#).unwrap();
        assert_eq!(list.len(), 1);
        let inner = list[0].as_inner_list().unwrap();
        assert_eq!(inner.items.len(), 2);
        assert_eq!(inner.params.get("lvl").unwrap().as_integer(), Some(1));
    }

    #[test]
    fn parses_list_of_items() {
        let list = Parser::parse_list_toplevel("1, 2, 3").unwrap();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn trailing_comma_is_error() {
        assert!(Parser::parse_list_toplevel("1, 2,").is_err());
    }

    #[test]
    fn dictionary_bare_key_is_boolean_true_with_params() {
        let dict = Parser::parse_dictionary_toplevel("a;x=1, b=2").unwrap();
        let a = dict.get("a").unwrap().as_item().unwrap();
        assert_eq!(a.bare_item.as_boolean(), Some(true));
        assert_eq!(a.params.get("x").unwrap().as_integer(), Some(1));
    }

    #[test]
    fn dictionary_duplicate_key_last_wins() {
        let dict = Parser::parse_dictionary_toplevel("a=1, a=2").unwrap();
        assert_eq!(
            dict.get("a").unwrap().as_item().unwrap().bare_item.as_integer(),
            Some(2)
        );
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn trailing_characters_after_toplevel_is_error() {
        assert!(Parser::parse_item_toplevel("1 garbage").is_err());
    }

    #[test]
    fn parse_any_commits_to_list_first() {
        let value = Parser::parse_any_toplevel("ok, not").unwrap();
        assert!(matches!(value, StructuredValue::List(_)));
    }

    #[test]
    fn parse_any_prefers_list_even_for_a_single_bare_token() {
        // A lone token is itself a valid one-element List, so under the
        // "commit to List first" resolution it is reported as a List, not
        // as a bare Item - the Item fallback only matters for inputs that
        // are not valid List syntax at all.
        let value = Parser::parse_any_toplevel("ok").unwrap();
        assert!(matches!(value, StructuredValue::List(_)));
    }

    #[test]
    fn parse_any_falls_back_to_dictionary_for_key_value_syntax() {
        let value = Parser::parse_any_toplevel("a=1").unwrap();
        assert!(matches!(value, StructuredValue::Dictionary(_)));
    }
}
