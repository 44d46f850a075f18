// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

use base64::Engine as _;

use crate::bare_item::{BareItem, Decimal};
use crate::value::{Dictionary, InnerList, Item, List, ListEntry, Parameters};

/// Canonical serialization: the deterministic form such that
/// `parse(serialize(x)) == x` for any well-formed `x`, and
/// `serialize(parse(s))` is a fixed point for any accepted input `s`.
pub trait SerializeValue {
    fn serialize_value(&self) -> String;
}

impl SerializeValue for BareItem {
    fn serialize_value(&self) -> String {
        match self {
            BareItem::Integer(v) => v.to_string(),
            BareItem::Decimal(d) => serialize_decimal(*d),
            BareItem::String(s) => serialize_string(s.as_str()),
            BareItem::Token(t) => t.as_str().to_string(),
            BareItem::ByteSequence(bytes) => {
                format!(":{}:", base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            BareItem::Boolean(b) => {
                if *b {
                    "?1".to_string()
                } else {
                    "?0".to_string()
                }
            }
        }
    }
}

fn serialize_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Renders a decimal's thousandths to the shortest fractional form with at
/// least one digit (half-even rounding is already baked into the stored
/// milli value); an exact integer still emits a trailing ".0".
fn serialize_decimal(d: Decimal) -> String {
    let milli = d.as_milli();
    let negative = milli < 0;
    let magnitude = milli.unsigned_abs();
    let integer_part = magnitude / 1000;
    let mut frac = magnitude % 1000;

    let mut frac_str = if frac == 0 {
        "0".to_string()
    } else {
        // Trim trailing zeros but keep at least one digit.
        let mut digits = 3;
        while frac % 10 == 0 && digits > 1 {
            frac /= 10;
            digits -= 1;
        }
        format!("{frac:0>width$}", width = digits)
    };
    if frac_str.is_empty() {
        frac_str = "0".to_string();
    }

    format!(
        "{sign}{int}.{frac}",
        sign = if negative { "-" } else { "" },
        int = integer_part,
        frac = frac_str
    )
}

fn serialize_parameters(params: &Parameters) -> String {
    let mut out = String::new();
    for (key, value) in params {
        out.push(';');
        out.push_str(key.as_str());
        // Boolean true parameters omit the "=?1" suffix, e.g. `;req` rather
        // than `;req=?1`.
        if value.as_boolean() != Some(true) {
            out.push('=');
            out.push_str(&value.serialize_value());
        }
    }
    out
}

impl SerializeValue for Item {
    fn serialize_value(&self) -> String {
        format!(
            "{}{}",
            self.bare_item.serialize_value(),
            serialize_parameters(&self.params)
        )
    }
}

impl SerializeValue for InnerList {
    fn serialize_value(&self) -> String {
        let items: Vec<String> = self.items.iter().map(SerializeValue::serialize_value).collect();
        format!("({}){}", items.join(" "), serialize_parameters(&self.params))
    }
}

impl SerializeValue for ListEntry {
    fn serialize_value(&self) -> String {
        match self {
            ListEntry::Item(item) => item.serialize_value(),
            ListEntry::InnerList(inner) => inner.serialize_value(),
        }
    }
}

impl SerializeValue for List {
    fn serialize_value(&self) -> String {
        self.iter()
            .map(SerializeValue::serialize_value)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl SerializeValue for Dictionary {
    fn serialize_value(&self) -> String {
        self.iter()
            .map(|(key, entry)| {
                // A Dictionary member whose value is the bare boolean `true`
                // (carrying no bare-item content) serializes as the key
                // alone, plus its parameters - the same omission rule as
                // parameter values.
                match entry {
                    ListEntry::Item(item) if item.bare_item == BareItem::Boolean(true) => {
                        format!("{}{}", key, serialize_parameters(&item.params))
                    }
                    ListEntry::Item(item) => format!("{}={}", key, item.serialize_value()),
                    ListEntry::InnerList(inner) => format!("{}={}", key, inner.serialize_value()),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bare_item::{Key, Token};
    use crate::parser::Parser;

    #[test]
    fn serializes_decimal_integer_form_as_dot_zero() {
        let d = Decimal::from_milli(2000).unwrap();
        assert_eq!(serialize_decimal(d), "2.0");
    }

    #[test]
    fn serializes_decimal_trims_trailing_zeros() {
        assert_eq!(serialize_decimal(Decimal::from_milli(1500).unwrap()), "1.5");
        assert_eq!(serialize_decimal(Decimal::from_milli(1050).unwrap()), "1.05");
        assert_eq!(serialize_decimal(Decimal::from_milli(1005).unwrap()), "1.005");
        assert_eq!(serialize_decimal(Decimal::from_milli(-1500).unwrap()), "-1.5");
    }

    #[test]
    fn serializes_string_escaping_quote_and_backslash() {
        let s = BareItem::string("a \"b\" \\c").unwrap();
        assert_eq!(s.serialize_value(), r#""a \"b\" \\c""#);
    }

    #[test]
    fn serializes_dictionary_bool_true_member_without_suffix() {
        let mut dict = Dictionary::new();
        dict.insert(Key::new("a").unwrap(), ListEntry::Item(Item::new(BareItem::Boolean(true))));
        dict.insert(Key::new("b").unwrap(), ListEntry::Item(Item::new(BareItem::Integer(2))));
        assert_eq!(dict.serialize_value(), "a, b=2");
    }

    #[test]
    fn serializes_parameter_bool_true_without_suffix() {
        let mut params = Parameters::new();
        params.insert(Key::new("req").unwrap(), BareItem::Boolean(true));
        let item = Item::with_params(BareItem::Token(Token::new("foo").unwrap()), params);
        assert_eq!(item.serialize_value(), "foo;req");
    }

    #[test]
    fn canonical_round_trip_item() {
        let original = r#"foo;a;b="x y""#;
        let item = Parser::parse_item_toplevel(original).unwrap();
        assert_eq!(item.serialize_value(), original);
    }

    #[test]
    fn canonical_round_trip_dictionary() {
        let original = r#"a, b=2;x, c=(1 2);y=?0"#;
        let dict = Parser::parse_dictionary_toplevel(original).unwrap();
        assert_eq!(dict.serialize_value(), original);
    }

    #[test]
    fn canonical_fixed_point_on_non_canonical_whitespace() {
        // Accepted (OWS-flexible) input is re-serialized into tight canonical form.
        let parsed = Parser::parse_list_toplevel("1,\t2,  3").unwrap();
        assert_eq!(parsed.serialize_value(), "1, 2, 3");
    }
}
