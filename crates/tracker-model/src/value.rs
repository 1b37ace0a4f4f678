//! Remote value types and value coercion.

use std::fmt;

use serde::Serialize;

/// Value type declared by the remote metadata endpoints.
///
/// Only numeric types change how a value is transmitted: the raw text is
/// converted to an integer. Every other type passes the text through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Number,
    Integer,
    Text,
    /// A declared type with no special handling (e.g. `DATE`, `BOOLEAN`).
    Other(String),
    /// The metadata response carried no type at all.
    Unspecified,
}

impl ValueType {
    /// Interpret a declared type name. Matching is case-insensitive.
    pub fn from_declared(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::Unspecified;
        };
        match raw.to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            "int" | "integer" => Self::Integer,
            "string" | "text" => Self::Text,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }

    /// Convert a raw cell value into the form sent to the remote API.
    pub fn coerce(&self, raw: &str) -> CoercedValue {
        if self.is_numeric() {
            match parse_int_prefix(raw) {
                Some(value) => CoercedValue::Integer(value),
                None => CoercedValue::Invalid,
            }
        } else {
            CoercedValue::Text(raw.to_string())
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => f.write_str("number"),
            Self::Integer => f.write_str("int"),
            Self::Text => f.write_str("string"),
            Self::Other(name) => f.write_str(name),
            Self::Unspecified => f.write_str("unspecified"),
        }
    }
}

/// A value ready for transmission.
///
/// `Invalid` is what a numeric field yields for text with no leading digits;
/// it serializes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CoercedValue {
    Integer(i64),
    Text(String),
    Invalid,
}

impl CoercedValue {
    /// Render the value as query-string text. `Invalid` falls back to the raw input.
    pub fn render(&self, raw: &str) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::Invalid => raw.to_string(),
        }
    }
}

/// Parse the leading integer of `raw`.
///
/// Leading whitespace and a single sign are accepted, then as many digits as
/// are present; anything after them is ignored (`"12abc"` is 12, `"-3.7"` is
/// -3). A `0x`/`0X` prefix reads hexadecimal digits (`"0x10"` is 16).
/// Returns `None` when no digit follows or the value does not fit in an
/// `i64`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, rest) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let digits_len = rest.bytes().take_while(|byte| char::from(*byte).is_digit(radix)).count();
    if digits_len == 0 {
        return None;
    }
    let digits = &rest[..digits_len];
    if negative {
        i64::from_str_radix(&format!("-{digits}"), radix).ok()
    } else {
        i64::from_str_radix(digits, radix).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn declared_types_are_case_insensitive() {
        assert_eq!(ValueType::from_declared(Some("number")), ValueType::Number);
        assert_eq!(ValueType::from_declared(Some("NUMBER")), ValueType::Number);
        assert_eq!(ValueType::from_declared(Some("int")), ValueType::Integer);
        assert_eq!(ValueType::from_declared(Some("INTEGER")), ValueType::Integer);
        assert_eq!(ValueType::from_declared(Some("string")), ValueType::Text);
        assert_eq!(
            ValueType::from_declared(Some("DATE")),
            ValueType::Other("DATE".to_string())
        );
        assert_eq!(ValueType::from_declared(None), ValueType::Unspecified);
        assert_eq!(ValueType::from_declared(Some("  ")), ValueType::Unspecified);
    }

    #[test]
    fn parses_leading_integers() {
        assert_eq!(parse_int_prefix("5"), Some(5));
        assert_eq!(parse_int_prefix("  42"), Some(42));
        assert_eq!(parse_int_prefix("12abc"), Some(12));
        assert_eq!(parse_int_prefix("-3.7"), Some(-3));
        assert_eq!(parse_int_prefix("+8"), Some(8));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), None);
    }

    #[test]
    fn hex_prefix_reads_hex_digits() {
        assert_eq!(parse_int_prefix("0x10"), Some(16));
        assert_eq!(parse_int_prefix("0XfFz"), Some(255));
        assert_eq!(parse_int_prefix(" -0x1a"), Some(-26));
        assert_eq!(parse_int_prefix("0x"), None);
        assert_eq!(parse_int_prefix("0xg"), None);
        assert_eq!(ValueType::Number.coerce("0x10"), CoercedValue::Integer(16));
    }

    #[test]
    fn invalid_numbers_serialize_as_null() {
        let value = ValueType::Number.coerce("n/a");
        assert_eq!(value, CoercedValue::Invalid);
        assert_eq!(serde_json::to_string(&value).unwrap(), "null");
        assert_eq!(value.render("n/a"), "n/a");
    }

    #[test]
    fn text_values_pass_through() {
        let value = ValueType::Other("DATE".into()).coerce("2024-01-01");
        assert_eq!(value, CoercedValue::Text("2024-01-01".into()));
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"2024-01-01\"");
    }

    proptest! {
        #[test]
        fn numeric_coercion_matches_integer_prefix(n in any::<i64>(), suffix in "[a-wyz .]{0,4}") {
            let raw = format!("{n}{suffix}");
            prop_assert_eq!(ValueType::Number.coerce(&raw), CoercedValue::Integer(n));
            prop_assert_eq!(ValueType::Integer.coerce(&raw), CoercedValue::Integer(n));
        }

        #[test]
        fn non_numeric_coercion_is_identity(raw in ".{0,16}") {
            let once = ValueType::Text.coerce(&raw);
            prop_assert_eq!(&once, &CoercedValue::Text(raw.clone()));
            let again = ValueType::Text.coerce(&once.render(&raw));
            prop_assert_eq!(again, once);
        }
    }
}
