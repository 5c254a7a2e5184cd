//! Input validators.
//!
//! Every validator is total: it returns `Ok` with the (possibly normalized) value or a
//! [ValidationError] naming the offending input. They run before any network call.

use alloy::primitives::U256;
use thiserror::Error;

/// Latest accepted instant: 9999-12-31T23:59:59Z in unix seconds.
pub const MAX_TIME: u64 = 253_402_300_799;

/// Largest fee point accepted (denominator 10000).
pub const MAX_FEE_POINT: u64 = 255;

/// Maximum length of `name` and `remark`, in characters.
pub const MAX_FIELD_LEN: usize = 1024;

/// Predicate deciding whether a string is a well-formed account or object address.
pub type AddressPredicate = fn(&str) -> bool;

/// Errors produced by the input validators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("time {0} is past the maximum representable instant {max}", max = MAX_TIME)]
    TimeOutOfRange(u64),

    #[error("stop time {stop} must be after start time {start}")]
    InvalidTimeRange { start: u64, stop: u64 },

    #[error("interval must be at least one second")]
    ZeroInterval,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("fee point {0} exceeds {max}", max = MAX_FEE_POINT)]
    FeePointTooLarge(u64),

    #[error("malformed coin type: {0}")]
    MalformedCoinType(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("{field} is {len} characters long, at most {max} allowed", max = MAX_FIELD_LEN)]
    FieldTooLong { field: &'static str, len: usize },
}

/// Rejects negative values; returns the value as unsigned.
pub fn ensure_positive_integer(n: i64) -> Result<u64, ValidationError> {
    u64::try_from(n).map_err(|_| ValidationError::InvalidNumber(n.to_string()))
}

/// Parses a decimal amount string. Signs, fractions and exponents are rejected.
pub fn parse_amount(s: &str) -> Result<U256, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidNumber(s.to_string()));
    }
    trimmed
        .parse::<U256>()
        .map_err(|_| ValidationError::InvalidNumber(s.to_string()))
}

pub fn ensure_valid_time(t: i64) -> Result<u64, ValidationError> {
    let t = ensure_positive_integer(t)?;
    if t > MAX_TIME {
        return Err(ValidationError::TimeOutOfRange(t));
    }
    Ok(t)
}

/// Validates both endpoints and requires `start < stop`.
pub fn ensure_valid_time_range(start: i64, stop: i64) -> Result<(u64, u64), ValidationError> {
    let start = ensure_valid_time(start)?;
    let stop = ensure_valid_time(stop)?;
    if stop <= start {
        return Err(ValidationError::InvalidTimeRange { start, stop });
    }
    Ok((start, stop))
}

pub fn ensure_valid_interval(interval: i64) -> Result<u64, ValidationError> {
    let interval = ensure_positive_integer(interval)?;
    if interval == 0 {
        return Err(ValidationError::ZeroInterval);
    }
    Ok(interval)
}

pub fn ensure_nonzero_amount(amount: u64) -> Result<u64, ValidationError> {
    if amount == 0 {
        return Err(ValidationError::ZeroAmount);
    }
    Ok(amount)
}

pub fn ensure_valid_fee_point(p: i64) -> Result<u8, ValidationError> {
    let p = ensure_positive_integer(p)?;
    if p > MAX_FEE_POINT {
        return Err(ValidationError::FeePointTooLarge(p));
    }
    Ok(p as u8)
}

/// Checks `<address>::<module>::<symbol>`.
pub fn ensure_valid_coin_type(s: &str) -> Result<(), ValidationError> {
    let malformed = || ValidationError::MalformedCoinType(s.to_string());
    let parts: Vec<&str> = s.split("::").collect();
    if parts.len() != 3 {
        return Err(malformed());
    }
    if !is_sui_address(parts[0]) || !is_identifier(parts[1]) || !is_identifier(parts[2]) {
        return Err(malformed());
    }
    Ok(())
}

/// Pads the address segment of `<address>::<module>::<symbol>` so that `0x2::sui::SUI` and
/// its 64-digit spelling compare equal. Strings without a valid address segment pass through.
pub fn normalize_coin_type(s: &str) -> String {
    match s.split_once("::") {
        Some((address, rest)) if is_sui_address(address) => {
            format!("{}::{}", normalize_address(address), rest)
        }
        _ => s.to_string(),
    }
}

pub fn ensure_field_length(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > MAX_FIELD_LEN {
        return Err(ValidationError::FieldTooLong { field, len });
    }
    Ok(())
}

/// Validates and normalizes an account address to `0x` + 64 lowercase hex digits.
pub fn ensure_valid_address(s: &str) -> Result<String, ValidationError> {
    ensure_valid_address_with(s, is_sui_address)
}

pub fn ensure_valid_address_with(
    s: &str,
    predicate: AddressPredicate,
) -> Result<String, ValidationError> {
    if !predicate(s) {
        return Err(ValidationError::InvalidAddress(s.to_string()));
    }
    Ok(normalize_address(s))
}

/// Validates and normalizes an object id (same format as addresses).
pub fn ensure_valid_object_id(s: &str) -> Result<String, ValidationError> {
    if !is_sui_address(s) {
        return Err(ValidationError::InvalidObjectId(s.to_string()));
    }
    Ok(normalize_address(s))
}

/// `0x` followed by 1..=64 hex digits. Short forms such as `0x2` are accepted.
pub fn is_sui_address(s: &str) -> bool {
    address_bytes(s).is_ok()
}

/// The 32 raw bytes of an address or object id, left-padded.
pub fn address_bytes(s: &str) -> Result<[u8; 32], ValidationError> {
    let invalid = || ValidationError::InvalidAddress(s.to_string());
    let digits = s.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.is_empty() || digits.len() > 64 {
        return Err(invalid());
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(format!("{:0>64}", digits), &mut bytes).map_err(|_| invalid())?;
    Ok(bytes)
}

/// Left-pads to 64 hex digits and lowercases. Callers validate first.
pub fn normalize_address(s: &str) -> String {
    let digits = s.strip_prefix("0x").unwrap_or(s).to_ascii_lowercase();
    format!("0x{:0>64}", digits)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
