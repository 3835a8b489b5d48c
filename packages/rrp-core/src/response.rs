//! Response value extraction and ABI encoding.
//!
//! The `_path` reserved parameter selects a value inside the API's JSON
//! response, `_type` picks the Solidity type it is encoded as, and `_times`
//! scales numeric values before encoding (e.g. to keep decimals on chain).
//!
//! Paths are dot separated. A segment addresses an object key, or an array
//! element when it is a number; `items[0]` is accepted as `items.0`.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{hex, Address, Bytes, Sign, B256, I256, U256};
use alloy_sol_types::SolValue;
use serde_json::Value;

/// Solidity type a response value is encoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Int256,
    Uint256,
    Bool,
    Bytes32,
    Address,
    Bytes,
    String,
}

impl FromStr for ResponseType {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int256" => Ok(Self::Int256),
            "uint256" => Ok(Self::Uint256),
            "bool" => Ok(Self::Bool),
            "bytes32" => Ok(Self::Bytes32),
            "address" => Ok(Self::Address),
            "bytes" => Ok(Self::Bytes),
            "string" => Ok(Self::String),
            other => Err(EncodeError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int256 => "int256",
            Self::Uint256 => "uint256",
            Self::Bool => "bool",
            Self::Bytes32 => "bytes32",
            Self::Address => "address",
            Self::Bytes => "bytes",
            Self::String => "string",
        })
    }
}

/// Errors raised while encoding a response value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("unsupported response type: {0}")]
    UnsupportedType(String),
    #[error("value {value} is not a number")]
    NotNumeric { value: String },
    #[error("value {value} does not fit in {ty}")]
    OutOfRange { value: String, ty: ResponseType },
    #[error("invalid _times multiplier: {0}")]
    InvalidTimes(String),
    #[error("value {value} cannot be encoded as {ty}")]
    Mismatch { value: String, ty: ResponseType },
}

// ---------------------------------------------------------------------------
// Path extraction
// ---------------------------------------------------------------------------

/// Returns the value at `path` inside `payload`.
///
/// An empty or absent path selects the whole payload. A path that leads
/// nowhere, or to JSON `null`, yields `None`.
#[must_use]
pub fn extract_value<'a>(payload: &'a Value, path: Option<&str>) -> Option<&'a Value> {
    let path = path.unwrap_or("");
    let mut current = payload;
    if !path.is_empty() {
        for segment in path_segments(path) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
        .flat_map(|part| part.split(['[', ']']))
        .filter(|segment| !segment.is_empty())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// ABI-encodes `value` as `ty`, applying the `_times` multiplier to numbers.
///
/// The result is `abi.encode` of the single value: one word for static
/// types, offset, length and padded data for `bytes` and `string`.
///
/// # Errors
///
/// Returns an `EncodeError` when the value does not match the type, does not
/// fit into 256 bits, or `times` is not a decimal number.
pub fn encode_value(
    value: &Value,
    ty: ResponseType,
    times: Option<&str>,
) -> Result<Bytes, EncodeError> {
    let encoded = match ty {
        ResponseType::Int256 => {
            let (negative, magnitude) = scaled_integer(value, times, ty)?;
            let sign = if negative { Sign::Negative } else { Sign::Positive };
            I256::checked_from_sign_and_abs(sign, magnitude)
                .ok_or_else(|| out_of_range(value, ty))?
                .abi_encode()
        }
        ResponseType::Uint256 => {
            let (negative, magnitude) = scaled_integer(value, times, ty)?;
            if negative && !magnitude.is_zero() {
                return Err(out_of_range(value, ty));
            }
            magnitude.abi_encode()
        }
        ResponseType::Bool => parse_bool(value)?.abi_encode(),
        ResponseType::Bytes32 => parse_bytes32(value)?.abi_encode(),
        ResponseType::Address => value
            .as_str()
            .and_then(|s| Address::from_str(s).ok())
            .ok_or_else(|| mismatch(value, ty))?
            .abi_encode(),
        ResponseType::Bytes => value
            .as_str()
            .and_then(|s| hex::decode(s).ok())
            .map(Bytes::from)
            .ok_or_else(|| mismatch(value, ty))?
            .abi_encode(),
        ResponseType::String => render(value).abi_encode(),
    };
    Ok(Bytes::from(encoded))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn mismatch(value: &Value, ty: ResponseType) -> EncodeError {
    EncodeError::Mismatch {
        value: render(value),
        ty,
    }
}

fn out_of_range(value: &Value, ty: ResponseType) -> EncodeError {
    EncodeError::OutOfRange {
        value: render(value),
        ty,
    }
}

fn parse_bool(value: &Value) -> Result<bool, EncodeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        _ => Err(mismatch(value, ResponseType::Bool)),
    }
}

fn parse_bytes32(value: &Value) -> Result<B256, EncodeError> {
    let text = render(value);
    if text.len() == 66 && text.starts_with("0x") {
        if let Ok(hash) = B256::from_str(&text) {
            return Ok(hash);
        }
    }
    // Short strings are right-padded, leaving room for a terminating zero.
    if text.len() > 31 {
        return Err(mismatch(value, ResponseType::Bytes32));
    }
    Ok(B256::right_padding_from(text.as_bytes()))
}

// ---------------------------------------------------------------------------
// Decimal arithmetic
// ---------------------------------------------------------------------------

/// A parsed decimal: `(-1)^negative * significand * 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    significand: U256,
    exponent: i64,
}

impl Decimal {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, unsigned) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exp) = match unsigned.find(['e', 'E']) {
            Some(pos) => (&unsigned[..pos], unsigned[pos + 1..].parse::<i64>().ok()?),
            None => (unsigned, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let digits: String = int_part.chars().chain(frac_part.chars()).collect();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let significand = U256::from_str_radix(&digits, 10).ok()?;
        let frac_len = i64::try_from(frac_part.len()).ok()?;
        Some(Self {
            negative,
            significand,
            exponent: exp.checked_sub(frac_len)?,
        })
    }

    fn checked_mul(self, other: Self) -> Option<Self> {
        Some(Self {
            negative: self.negative != other.negative,
            significand: self.significand.checked_mul(other.significand)?,
            exponent: self.exponent.checked_add(other.exponent)?,
        })
    }

    /// Integer part, truncated toward zero.
    fn truncate(self) -> Option<(bool, U256)> {
        let ten = U256::from(10u8);
        if self.significand.is_zero() {
            return Some((self.negative, U256::ZERO));
        }
        let magnitude = if self.exponent >= 0 {
            let exp = usize::try_from(self.exponent).ok()?;
            self.significand.checked_mul(ten.checked_pow(U256::from(exp))?)?
        } else {
            let exp = usize::try_from(self.exponent.checked_neg()?).ok()?;
            match ten.checked_pow(U256::from(exp)) {
                Some(divisor) => self.significand / divisor,
                None => U256::ZERO,
            }
        };
        Some((self.negative, magnitude))
    }
}

fn scaled_integer(
    value: &Value,
    times: Option<&str>,
    ty: ResponseType,
) -> Result<(bool, U256), EncodeError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(EncodeError::NotNumeric {
                value: other.to_string(),
            })
        }
    };
    let mut decimal = Decimal::parse(&text).ok_or(EncodeError::NotNumeric { value: text })?;
    if let Some(times) = times.filter(|t| !t.trim().is_empty()) {
        let multiplier =
            Decimal::parse(times).ok_or_else(|| EncodeError::InvalidTimes(times.to_string()))?;
        decimal = decimal
            .checked_mul(multiplier)
            .ok_or_else(|| out_of_range(value, ty))?;
    }
    decimal.truncate().ok_or_else(|| out_of_range(value, ty))
}
