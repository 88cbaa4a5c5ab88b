//! Decoding helpers for raw subgraph entities.
//!
//! The Graph serialises `BigInt`/`BigDecimal` as decimal strings and
//! `Int` as JSON numbers; these helpers accept either.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Decimals of an 18-decimal token amount.
pub const WEI: f64 = 1e18;

/// Decimals of a 27-decimal precise unit (debt ownership).
pub const PRECISE_UNIT: f64 = 1e27;

/// Gas prices are reported in gwei.
pub const GWEI: f64 = 1e9;

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Str(String),
    Num(f64),
}

impl Numeric {
    fn to_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Numeric::Num(n) => Ok(n),
            Numeric::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid number '{}'", s))),
        }
    }
}

/// Any numeric field as `f64`.
pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Numeric::deserialize(d)?.to_f64()
}

/// Optional numeric field as `f64`.
pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Option::<Numeric>::deserialize(d)?
        .map(Numeric::to_f64)
        .transpose()
}

/// Numeric field as `u64` (block numbers, counters, ids).
pub fn uint<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let n = Numeric::deserialize(d)?.to_f64::<D::Error>()?;
    if n < 0.0 {
        return Err(serde::de::Error::custom(format!("negative value {}", n)));
    }
    Ok(n as u64)
}

/// Optional numeric field as `u64`.
pub fn opt_uint<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Option::<Numeric>::deserialize(d)?
        .map(|n| n.to_f64::<D::Error>().map(|v| v.max(0.0) as u64))
        .transpose()
}

/// 18-decimal token amount.
pub fn wei<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(number(d)? / WEI)
}

/// Optional 18-decimal token amount.
pub fn opt_wei<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(opt_number(d)?.map(|n| n / WEI))
}

/// 27-decimal precise amount.
pub fn precise<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(number(d)? / PRECISE_UNIT)
}

/// Gas price in gwei.
pub fn gwei<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(number(d)? / GWEI)
}

/// Optional gas price in gwei.
pub fn opt_gwei<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(opt_number(d)?.map(|n| n / GWEI))
}

/// Subgraph timestamp (seconds) as milliseconds.
pub fn secs_to_millis<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok((number(d)? * 1000.0) as i64)
}

/// Optional subgraph timestamp (seconds) as milliseconds.
pub fn opt_secs_to_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(opt_number(d)?.map(|n| (n * 1000.0) as i64))
}

/// Millisecond timestamp as a UTC date.
pub fn date_from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Transaction hash from an entity id of the form `<hash>-<logIndex>`.
pub fn hash_from_id(id: &str) -> String {
    id.split('-').next().unwrap_or(id).to_string()
}

/// Decode a bytes32 currency key (`0x7a555344...`) into ASCII (`zUSD`).
///
/// Trailing NUL padding is removed; undecodable input is returned as-is.
pub fn hex_to_ascii(hex: &str) -> String {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.len() % 2 != 0 {
        return hex.to_string();
    }

    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for i in (0..digits.len()).step_by(2) {
        match u8::from_str_radix(&digits[i..i + 2], 16) {
            Ok(0) => {}
            Ok(b) => bytes.push(b),
            Err(_) => return hex.to_string(),
        }
    }

    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => hex.to_string(),
    }
}

/// Encode an ASCII currency key as right-padded bytes32 hex.
pub fn ascii_to_bytes32(key: &str) -> String {
    let mut out = String::from("0x");
    for b in key.bytes().take(32) {
        out.push_str(&format!("{:02x}", b));
    }
    while out.len() < 66 {
        out.push('0');
    }
    out
}

/// Whole-token amount expressed as an 18-decimal BigInt literal.
pub fn to_wei_literal(amount: u64) -> String {
    format!("{}000000000000000000", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "wei")]
        amount: f64,
        #[serde(deserialize_with = "uint")]
        block: u64,
        #[serde(deserialize_with = "secs_to_millis")]
        timestamp: i64,
        #[serde(default, deserialize_with = "opt_gwei")]
        gas_price: Option<f64>,
    }

    #[test]
    fn test_numeric_fields() {
        let s: Sample = serde_json::from_value(json!({
            "amount": "1500000000000000000",
            "block": 123,
            "timestamp": "1700000000",
            "gas_price": "5000000000"
        }))
        .unwrap();
        assert_eq!(s.amount, 1.5);
        assert_eq!(s.block, 123);
        assert_eq!(s.timestamp, 1_700_000_000_000);
        assert_eq!(s.gas_price, Some(5.0));
    }

    #[test]
    fn test_missing_optional() {
        let s: Sample = serde_json::from_value(json!({
            "amount": 0, "block": "1", "timestamp": 1
        }))
        .unwrap();
        assert_eq!(s.gas_price, None);
    }

    #[test]
    fn test_invalid_number() {
        let r: Result<Sample, _> = serde_json::from_value(json!({
            "amount": "abc", "block": 1, "timestamp": 1
        }));
        assert!(r.is_err());
    }

    #[test]
    fn test_hex_to_ascii() {
        assert_eq!(
            hex_to_ascii("0x7a55534400000000000000000000000000000000000000000000000000000000"),
            "zUSD"
        );
        assert_eq!(hex_to_ascii("0x485a4e"), "HZN");
        assert_eq!(hex_to_ascii("0xzz"), "0xzz");
        assert_eq!(hex_to_ascii("0x123"), "0x123");
    }

    #[test]
    fn test_ascii_round_trip() {
        let encoded = ascii_to_bytes32("zBTC");
        assert_eq!(encoded.len(), 66);
        assert!(encoded.starts_with("0x7a425443"));
        assert_eq!(hex_to_ascii(&encoded), "zBTC");
    }

    #[test]
    fn test_hash_and_dates() {
        assert_eq!(hash_from_id("0xabc-12"), "0xabc");
        assert_eq!(hash_from_id("0xabc"), "0xabc");
        assert_eq!(
            date_from_millis(1_700_000_000_000).to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
        assert_eq!(to_wei_literal(5), "5000000000000000000");
    }
}
