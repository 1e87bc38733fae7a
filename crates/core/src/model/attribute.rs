use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::error::{DynamockError, Result};

/// A stored item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// A DynamoDB attribute value, encoded externally tagged (`{"S": "abc"}`).
///
/// Numbers travel as decimal strings and binaries as base64 strings, exactly
/// as they do on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "B")]
    B(String),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(Vec<String>),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    #[serde(rename = "M")]
    M(HashMap<String, AttributeValue>),
}

/// Scalar types allowed for key attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    S,
    N,
    B,
}

impl ScalarAttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarAttributeType::S => "S",
            ScalarAttributeType::N => "N",
            ScalarAttributeType::B => "B",
        }
    }
}

impl AttributeValue {
    /// Returns the wire tag of this value (`"S"`, `"NS"`, `"M"`, ...).
    pub fn type_tag(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
            AttributeValue::Bs(_) => "BS",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
        }
    }

    /// Returns the scalar type if this is a string, number or binary.
    pub fn scalar_type(&self) -> Option<ScalarAttributeType> {
        match self {
            AttributeValue::S(_) => Some(ScalarAttributeType::S),
            AttributeValue::N(_) => Some(ScalarAttributeType::N),
            AttributeValue::B(_) => Some(ScalarAttributeType::B),
            _ => None,
        }
    }

    /// Canonical string used to identify an item by this key value.
    ///
    /// Numbers are normalised so `"1"`, `"1.0"` and `"+1"` name the same item.
    pub fn key_string(&self) -> Option<String> {
        match self {
            AttributeValue::S(s) => Some(s.clone()),
            AttributeValue::N(n) => normalize_number(n),
            AttributeValue::B(b) => Some(b.clone()),
            _ => None,
        }
    }

    /// Rejects values DynamoDB would refuse to store.
    pub fn validate(&self) -> Result<()> {
        match self {
            AttributeValue::S(_) | AttributeValue::Bool(_) => Ok(()),
            AttributeValue::N(n) => validate_number(n),
            AttributeValue::B(b) => validate_binary(b),
            AttributeValue::Null(flag) => {
                if *flag {
                    Ok(())
                } else {
                    Err(DynamockError::validation(
                        "One or more parameter values were invalid: Null attribute value types must have the value of true",
                    ))
                }
            }
            AttributeValue::Ss(values) => validate_set(values, |v| Ok(v.clone())),
            AttributeValue::Ns(values) => validate_set(values, |v| {
                normalize_number(v).ok_or_else(|| invalid_number(v))
            }),
            AttributeValue::Bs(values) => validate_set(values, |v| {
                validate_binary(v)?;
                Ok(v.clone())
            }),
            AttributeValue::L(values) => values.iter().try_for_each(AttributeValue::validate),
            AttributeValue::M(values) => values.values().try_for_each(AttributeValue::validate),
        }
    }

    /// Approximate stored size in bytes.
    pub fn size(&self) -> usize {
        match self {
            AttributeValue::S(s) => s.len(),
            AttributeValue::N(n) => n.len(),
            AttributeValue::B(b) => decode_binary(b).map_or(b.len(), |bytes| bytes.len()),
            AttributeValue::Ss(values) | AttributeValue::Ns(values) => {
                values.iter().map(String::len).sum()
            }
            AttributeValue::Bs(values) => values
                .iter()
                .map(|b| decode_binary(b).map_or(b.len(), |bytes| bytes.len()))
                .sum(),
            AttributeValue::Bool(_) | AttributeValue::Null(_) => 1,
            AttributeValue::L(values) => 3 + values.iter().map(|v| 1 + v.size()).sum::<usize>(),
            AttributeValue::M(values) => {
                3 + values
                    .iter()
                    .map(|(name, v)| 1 + name.len() + v.size())
                    .sum::<usize>()
            }
        }
    }

    /// Orders two scalar values of the same type.
    ///
    /// Strings compare by UTF-8 bytes, numbers numerically and binaries by
    /// their decoded bytes. Returns `None` for mismatched or non-scalar types.
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (AttributeValue::N(a), AttributeValue::N(b)) => {
                Some(parse_number(a)?.cmp(&parse_number(b)?))
            }
            (AttributeValue::B(a), AttributeValue::B(b)) => {
                match (decode_binary(a), decode_binary(b)) {
                    (Some(a), Some(b)) => Some(a.cmp(&b)),
                    _ => Some(a.cmp(b)),
                }
            }
            _ => None,
        }
    }

    /// True if `self` starts with `prefix` (strings and binaries only).
    pub fn begins_with(&self, prefix: &AttributeValue) -> bool {
        match (self, prefix) {
            (AttributeValue::S(s), AttributeValue::S(p)) => s.starts_with(p.as_str()),
            (AttributeValue::B(b), AttributeValue::B(p)) => {
                match (decode_binary(b), decode_binary(p)) {
                    (Some(b), Some(p)) => b.starts_with(&p),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// True if `self` contains `needle`: a substring, a byte subsequence, a
    /// set member, or a list element.
    pub fn contains(&self, needle: &AttributeValue) -> bool {
        match (self, needle) {
            (AttributeValue::S(s), AttributeValue::S(n)) => s.contains(n.as_str()),
            (AttributeValue::B(b), AttributeValue::B(n)) => {
                match (decode_binary(b), decode_binary(n)) {
                    (Some(_), Some(n)) if n.is_empty() => true,
                    (Some(b), Some(n)) => b.windows(n.len()).any(|w| w == n.as_slice()),
                    _ => false,
                }
            }
            (AttributeValue::Ss(set), AttributeValue::S(n)) => set.contains(n),
            (AttributeValue::Bs(set), AttributeValue::B(n)) => set.contains(n),
            (AttributeValue::Ns(set), AttributeValue::N(n)) => {
                let n = normalize_number(n);
                set.iter().any(|v| normalize_number(v) == n)
            }
            (AttributeValue::L(list), needle) => list.iter().any(|v| values_equal(v, needle)),
            _ => false,
        }
    }
}

/// Equality with DynamoDB semantics: numbers by value, sets ignoring order.
pub fn values_equal(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a, b) {
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            normalize_number(a).is_some() && normalize_number(a) == normalize_number(b)
        }
        (AttributeValue::Ss(a), AttributeValue::Ss(b))
        | (AttributeValue::Bs(a), AttributeValue::Bs(b)) => {
            a.len() == b.len() && a.iter().all(|v| b.contains(v))
        }
        (AttributeValue::Ns(a), AttributeValue::Ns(b)) => {
            let b: Vec<_> = b.iter().map(|v| normalize_number(v)).collect();
            a.len() == b.len() && a.iter().all(|v| b.contains(&normalize_number(v)))
        }
        (AttributeValue::L(a), AttributeValue::L(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_equal(a, b))
        }
        (AttributeValue::M(a), AttributeValue::M(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => a == b,
    }
}

/// Most significant digits a number may carry.
const MAX_PRECISION: usize = 38;
/// Largest and smallest decimal exponent of a non-zero number.
const MAX_EXPONENT: i64 = 125;
const MIN_EXPONENT: i64 = -130;

/// Parses a number string into an exact decimal, or `None` if it is not a
/// number DynamoDB can store.
///
/// Accepts an optional sign, a decimal mantissa (`1`, `1.`, `.5`) and an
/// optional exponent (`1e3`, `2.5E-4`).
pub fn parse_number(raw: &str) -> Option<BigDecimal> {
    let raw = raw.trim();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(pos) => (&rest[..pos], rest[pos + 1..].parse::<i64>().ok()?),
        None => (rest, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !is_digits(int_part)
        || !is_digits(frac_part)
        || exponent.unsigned_abs() > 10_000
    {
        return None;
    }

    let canonical = format!(
        "{}{}.{}e{}",
        if negative { "-" } else { "" },
        if int_part.is_empty() { "0" } else { int_part },
        if frac_part.is_empty() { "0" } else { frac_part },
        exponent
    );
    let value = BigDecimal::from_str(&canonical).ok()?.normalized();
    in_range(&value).then_some(value)
}

/// Canonical decimal form of a number string, or `None` if it is not a
/// number.
///
/// The result has no sign for zero or positives, no exponent, no leading
/// zeros in the integer part and no trailing zeros in the fraction.
pub fn normalize_number(raw: &str) -> Option<String> {
    parse_number(raw).map(|value| format_decimal(&value))
}

/// Adds two number strings exactly.
pub fn add_numbers(a: &str, b: &str) -> Option<String> {
    let sum = (parse_number(a)? + parse_number(b)?).normalized();
    in_range(&sum).then(|| format_decimal(&sum))
}

fn in_range(value: &BigDecimal) -> bool {
    let (mantissa, scale) = value.as_bigint_and_exponent();
    let text = mantissa.to_string();
    let digits = text.trim_start_matches('-');
    if digits == "0" {
        return true;
    }
    let exponent = digits.len() as i64 - 1 - scale;
    digits.len() <= MAX_PRECISION && (MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent)
}

fn format_decimal(value: &BigDecimal) -> String {
    let (mantissa, scale) = value.as_bigint_and_exponent();
    let text = mantissa.to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", text.as_str()),
    };
    if digits == "0" {
        return "0".to_string();
    }

    if scale <= 0 {
        format!("{}{}{}", sign, digits, "0".repeat(scale.unsigned_abs() as usize))
    } else {
        let scale = scale as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            format!("{}{}.{}", sign, int_part, frac_part)
        } else {
            format!("{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

fn decode_binary(value: &str) -> Option<Vec<u8>> {
    STANDARD.decode(value).ok()
}

fn validate_binary(value: &str) -> Result<()> {
    decode_binary(value).map(|_| ()).ok_or_else(|| {
        DynamockError::Serialization(format!("Base64 encoded binary is invalid: {}", value))
    })
}

fn validate_number(value: &str) -> Result<()> {
    normalize_number(value)
        .map(|_| ())
        .ok_or_else(|| invalid_number(value))
}

fn invalid_number(value: &str) -> DynamockError {
    DynamockError::validation(format!(
        "A value provided cannot be converted into a number: {}",
        value
    ))
}

fn validate_set<F>(values: &[String], canonical: F) -> Result<()>
where
    F: Fn(&String) -> Result<String>,
{
    if values.is_empty() {
        return Err(DynamockError::validation(
            "One or more parameter values were invalid: An attribute set may not be empty",
        ));
    }
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        let key = canonical(value)?;
        if seen.contains(&key) {
            return Err(DynamockError::validation(
                "One or more parameter values were invalid: Input collection contains duplicates",
            ));
        }
        seen.push(key);
    }
    Ok(())
}
