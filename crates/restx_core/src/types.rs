//! Parameter types and the conversion rules shared by server and client.

use crate::json::{Number, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire tokens that are reserved but have no conversion
pub const RESERVED_TOKENS: [&str; 2] = ["date", "time"];

/// Textual values that convert to boolean `true`
const TRUE_WORDS: [&str; 5] = ["y", "yes", "t", "true", "1"];

/// Semantic type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// Free text
    String,
    /// Text that should not be echoed
    Password,
    /// Boolean flag
    Boolean,
    /// Arbitrary-precision decimal
    Number,
    /// Text naming a resource
    Uri,
}

impl ParameterType {
    /// All supported types
    pub const ALL: [Self; 5] = [
        Self::String,
        Self::Password,
        Self::Boolean,
        Self::Number,
        Self::Uri,
    ];

    /// Wire token for this type
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Password => "password",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Uri => "uri",
        }
    }

    /// Look up a type by wire token, ignoring case
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let lower = token.to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.token() == lower)
    }

    /// Check whether values of this type are textual
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Password | Self::Uri)
    }

    /// Convert a raw value to this type
    ///
    /// Returns `None` when the value cannot be converted. `None` as input
    /// stands for an absent value.
    #[must_use]
    pub fn convert(self, raw: Option<&Value>) -> Option<Value> {
        match self {
            Self::String | Self::Password | Self::Uri => match raw {
                Some(Value::String(s)) => Some(Value::String(s.clone())),
                _ => None,
            },
            Self::Boolean => convert_bool(raw).map(Value::Bool),
            Self::Number => match raw {
                Some(Value::Number(n)) => Some(Value::Number(n.clone())),
                Some(Value::String(s)) => parse_decimal(s).map(Value::Number),
                _ => None,
            },
        }
    }

    /// Convert the textual form of a value to this type
    #[must_use]
    pub fn convert_text(self, text: &str) -> Option<Value> {
        self.convert(Some(&Value::String(text.to_string())))
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Boolean conversion: textual values outside the true-words are `false`
fn convert_bool(raw: Option<&Value>) -> Option<bool> {
    match raw {
        None | Some(Value::Null) => Some(false),
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => {
            let lower = s.to_ascii_lowercase();
            Some(TRUE_WORDS.contains(&lower.as_str()))
        }
        Some(_) => None,
    }
}

/// Parse decimal text, keeping every digit
///
/// Accepts the forms a `BigDecimal` literal allows and JSON does not: a
/// leading `+`, a bare point on either side (`.5`, `5.`) and leading zeros.
fn parse_decimal(text: &str) -> Option<Number> {
    let normalized = normalize_decimal(text.trim())?;
    serde_json::from_str::<Number>(&normalized).ok()
}

/// Rewrite decimal text into JSON number grammar
fn normalize_decimal(text: &str) -> Option<String> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'+' => (false, &text[1..]),
        b'-' => (true, &text[1..]),
        _ => (false, text),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return None;
    }
    let int_part = match int_part.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    let mut normalized = String::with_capacity(text.len() + 1);
    if negative {
        normalized.push('-');
    }
    normalized.push_str(int_part);
    if !frac_part.is_empty() {
        normalized.push('.');
        normalized.push_str(frac_part);
    }
    if let Some(exponent) = exponent {
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if digits.is_empty() || !all_digits(digits) {
            return None;
        }
        normalized.push('e');
        normalized.push_str(exponent);
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_roundtrip() {
        for t in ParameterType::ALL {
            assert_eq!(ParameterType::from_token(t.token()), Some(t));
        }
        assert_eq!(ParameterType::from_token("NUMBER"), Some(ParameterType::Number));
    }

    #[test]
    fn test_reserved_and_unknown_tokens() {
        for token in RESERVED_TOKENS {
            assert_eq!(ParameterType::from_token(token), None);
        }
        assert_eq!(ParameterType::from_token("blob"), None);
    }

    #[test]
    fn test_bool_conversion() {
        let b = ParameterType::Boolean;
        assert_eq!(b.convert_text("YES"), Some(json!(true)));
        assert_eq!(b.convert_text("t"), Some(json!(true)));
        assert_eq!(b.convert_text("1"), Some(json!(true)));
        assert_eq!(b.convert_text("no"), Some(json!(false)));
        assert_eq!(b.convert_text("banana"), Some(json!(false)));
        assert_eq!(b.convert(None), Some(json!(false)));
        assert_eq!(b.convert(Some(&Value::Null)), Some(json!(false)));
        assert_eq!(b.convert(Some(&json!(true))), Some(json!(true)));
        assert_eq!(b.convert(Some(&json!(1))), None);
    }

    #[test]
    fn test_number_conversion() {
        let n = ParameterType::Number;
        assert_eq!(n.convert_text("10"), Some(json!(10)));
        assert_eq!(n.convert_text(" 10 "), Some(json!(10)));
        assert_eq!(n.convert_text("abc"), None);
        assert_eq!(n.convert_text(""), None);
        assert_eq!(n.convert(Some(&json!(5))), Some(json!(5)));
        assert_eq!(n.convert(None), None);
        assert_eq!(n.convert(Some(&json!(true))), None);
    }

    #[test]
    fn test_number_accepts_decimal_literal_forms() {
        let n = ParameterType::Number;
        let rendered = |text: &str| n.convert_text(text).map(|v| v.to_string());
        assert_eq!(rendered(".5").as_deref(), Some("0.5"));
        assert_eq!(rendered("-.5").as_deref(), Some("-0.5"));
        assert_eq!(rendered("+5").as_deref(), Some("5"));
        assert_eq!(rendered("5.").as_deref(), Some("5"));
        assert_eq!(rendered("007").as_deref(), Some("7"));
        assert_eq!(rendered("000").as_deref(), Some("0"));
        assert_eq!(rendered("1.5E+3").as_deref(), Some("1.5e+3"));
        for bad in [".", "+", "-", "1e", "1.2.3", "1 2", "0x10", "++5"] {
            assert_eq!(n.convert_text(bad), None, "{bad}");
        }
    }

    #[test]
    fn test_number_keeps_precision() {
        let text = "12345678901234567890.000000000000000001";
        let value = ParameterType::Number.convert_text(text).unwrap();
        assert_eq!(value.to_string(), text);
    }

    #[test]
    fn test_textual_conversion() {
        for t in [ParameterType::String, ParameterType::Password, ParameterType::Uri] {
            assert!(t.is_textual());
            assert_eq!(t.convert(Some(&json!("x"))), Some(json!("x")));
            assert_eq!(t.convert(Some(&json!(1))), None);
            assert_eq!(t.convert(None), None);
        }
    }

    #[test]
    fn test_serde_uses_tokens() {
        let text = serde_json::to_string(&ParameterType::Password).unwrap();
        assert_eq!(text, "\"password\"");
    }
}
