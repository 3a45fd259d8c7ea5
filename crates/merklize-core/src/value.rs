//! # Entry Values — Typed Leaves and Field Encoding
//!
//! A [`Value`] is one of five kinds: 64-bit signed integer, boolean, UTF-8
//! string, arbitrary-precision integer, or UTC timestamp. Each kind has a
//! fixed mapping into the hasher's prime field:
//!
//! | kind | field element |
//! |---|---|
//! | `Int(v)`, `BigInt(v)` | `v` if `v >= 0`, `p + v` otherwise |
//! | `Bool(b)` | `hash([1])` or `hash([0])` |
//! | `String(s)` | `hash_bytes(utf8(s))` |
//! | `Time(t)` | `(unix_seconds * 10^9 + nanos) mod p` |
//!
//! Integers outside the balanced window `[min_int, p)` fail with
//! "value is too big" / "value is too small".

use std::fmt;

use chrono::{DateTime, Utc};
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use serde::{Deserialize, Serialize};

use crate::error::{MerklizeError, ValueError};
use crate::field::{FieldWindow, Hasher};

/// Typed leaf value of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    BigInt(#[serde(with = "bigint_decimal")] BigInt),
    Time(DateTime<Utc>),
}

impl Value {
    /// Short name of the value kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Time(_) => "time",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::BigInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Integer payload of `Int` and `BigInt` values.
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Value::Int(v) => Some(BigInt::from(*v)),
            Value::BigInt(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Encode the value as a field element of `hasher`'s field.
    ///
    /// # Errors
    ///
    /// Range errors for integers outside the field window, hash errors from
    /// the backend.
    pub fn mt_entry(&self, hasher: &dyn Hasher) -> Result<BigUint, MerklizeError> {
        match self {
            Value::Int(v) => Ok(encode_integer(&BigInt::from(*v), hasher.prime())?),
            Value::BigInt(v) => Ok(encode_integer(v, hasher.prime())?),
            Value::Bool(true) => Ok(hasher.hash(&[BigUint::from(1u8)])?),
            Value::Bool(false) => Ok(hasher.hash(&[BigUint::from(0u8)])?),
            Value::String(s) => Ok(hasher.hash_bytes(s.as_bytes())?),
            Value::Time(t) => Ok(encode_time(t, hasher.prime())),
        }
    }
}

/// Map a signed integer into `[0, p)` through the balanced window.
///
/// # Errors
///
/// [`ValueError::TooBig`] for `v >= p`, [`ValueError::TooSmall`] for
/// `v < min_int`.
pub fn encode_integer(v: &BigInt, prime: &BigUint) -> Result<BigUint, ValueError> {
    let window = FieldWindow::new(prime);
    match v.sign() {
        Sign::Minus => {
            if v < window.min_int() {
                return Err(ValueError::TooSmall(v.clone()));
            }
            let shifted = v + window.prime();
            shifted
                .to_biguint()
                .ok_or_else(|| ValueError::TooSmall(v.clone()))
        }
        _ => {
            if v >= window.prime() {
                return Err(ValueError::TooBig(v.clone()));
            }
            v.to_biguint().ok_or_else(|| ValueError::TooBig(v.clone()))
        }
    }
}

/// Nanoseconds since the Unix epoch, reduced into the field.
pub fn encode_time(t: &DateTime<Utc>, prime: &BigUint) -> BigUint {
    let nanos = BigInt::from(t.timestamp()) * 1_000_000_000i64
        + BigInt::from(t.timestamp_subsec_nanos());
    let p = BigInt::from_biguint(Sign::Plus, prime.clone());
    // mod_floor keeps pre-epoch timestamps inside [0, p).
    nanos.mod_floor(&p).magnitude().clone()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => f.write_str(s),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    /// Values above `i64::MAX` keep their literal magnitude as a `BigInt`.
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::BigInt(BigInt::from(v)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Value::BigInt(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = ValueError;

    /// Accepts JSON booleans, strings and integral numbers. Floats, `null`,
    /// arrays and objects are rejected.
    fn try_from(v: &serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Value::from(u))
                } else {
                    Err(ValueError::UnsupportedType(format!("float {n}")))
                }
            }
            serde_json::Value::Null => Err(ValueError::UnsupportedType("null".into())),
            serde_json::Value::Array(_) => Err(ValueError::UnsupportedType("array".into())),
            serde_json::Value::Object(_) => Err(ValueError::UnsupportedType("object".into())),
        }
    }
}

/// Serde adapter writing arbitrary-precision integers as decimal strings.
pub mod bigint_decimal {
    use std::str::FromStr;

    use num_bigint::BigInt;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &BigInt, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigInt, D::Error> {
        let raw = String::deserialize(d)?;
        BigInt::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::bn254_scalar_prime;
    use crate::field::testutil::FoldHasher;
    use chrono::TimeZone;

    #[test]
    fn non_negative_integer_is_identity() {
        let h = FoldHasher::new();
        assert_eq!(Value::Int(42).mt_entry(&h).unwrap(), BigUint::from(42u32));
        assert_eq!(Value::Int(0).mt_entry(&h).unwrap(), BigUint::from(0u32));
    }

    #[test]
    fn negative_integer_wraps_to_prime() {
        let h = FoldHasher::new();
        let p = bn254_scalar_prime();
        assert_eq!(Value::Int(-1).mt_entry(&h).unwrap(), &p - 1u32);
        assert_eq!(Value::Int(-100).mt_entry(&h).unwrap(), &p - 100u32);
    }

    #[test]
    fn large_unsigned_keeps_literal_value() {
        let h = FoldHasher::new();
        let v = Value::from(u64::MAX);
        assert_eq!(v, Value::BigInt(BigInt::from(u64::MAX)));
        assert_eq!(v.mt_entry(&h).unwrap(), BigUint::from(u64::MAX));
    }

    #[test]
    fn bigint_bounds() {
        let p = bn254_scalar_prime();
        let w = FieldWindow::new(&p);
        let pi = BigInt::from_biguint(Sign::Plus, p.clone());

        assert_eq!(
            encode_integer(&(&pi - 1), &p).unwrap(),
            &p - 1u32,
            "p - 1 is the largest accepted value"
        );
        assert!(matches!(
            encode_integer(&pi, &p),
            Err(ValueError::TooBig(_))
        ));
        assert!(encode_integer(w.min_int(), &p).is_ok());
        assert!(matches!(
            encode_integer(&(w.min_int() - 1), &p),
            Err(ValueError::TooSmall(_))
        ));
    }

    #[test]
    fn too_big_message() {
        let p = bn254_scalar_prime();
        let pi = BigInt::from_biguint(Sign::Plus, p.clone());
        let err = encode_integer(&(pi + 5), &p).unwrap_err();
        assert!(err.to_string().starts_with("value is too big"));
    }

    #[test]
    fn booleans_hash_one_and_zero() {
        let h = FoldHasher::new();
        assert_eq!(
            Value::Bool(true).mt_entry(&h).unwrap(),
            h.hash(&[BigUint::from(1u8)]).unwrap()
        );
        assert_eq!(
            Value::Bool(false).mt_entry(&h).unwrap(),
            h.hash(&[BigUint::from(0u8)]).unwrap()
        );
        assert_ne!(
            Value::Bool(true).mt_entry(&h).unwrap(),
            Value::Int(1).mt_entry(&h).unwrap()
        );
    }

    #[test]
    fn strings_hash_utf8_bytes() {
        let h = FoldHasher::new();
        assert_eq!(
            Value::from("Alice").mt_entry(&h).unwrap(),
            h.hash_bytes("Alice".as_bytes()).unwrap()
        );
    }

    #[test]
    fn time_is_nanoseconds_since_epoch() {
        let h = FoldHasher::new();
        let t = Utc.with_ymd_and_hms(2019, 12, 3, 12, 19, 52).unwrap();
        let expected = BigUint::from(1_575_375_592u64) * 1_000_000_000u64;
        assert_eq!(Value::Time(t).mt_entry(&h).unwrap(), expected);
    }

    #[test]
    fn pre_epoch_time_reduces_mod_prime() {
        let h = FoldHasher::new();
        let p = bn254_scalar_prime();
        let t = Utc.with_ymd_and_hms(1958, 7, 18, 0, 0, 0).unwrap();
        let nanos = BigUint::from(-t.timestamp() as u64) * 1_000_000_000u64;
        assert_eq!(Value::Time(t).mt_entry(&h).unwrap(), &p - nanos);
    }

    #[test]
    fn json_boundary_rejects_floats_and_containers() {
        assert_eq!(
            Value::try_from(&serde_json::json!(5)).unwrap(),
            Value::Int(5)
        );
        assert!(Value::try_from(&serde_json::json!(1.5)).is_err());
        assert!(Value::try_from(&serde_json::json!(null)).is_err());
        assert!(Value::try_from(&serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn bigint_serializes_as_decimal_string() {
        let v = Value::BigInt(BigInt::from(u64::MAX) * 10);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "big_int");
        assert_eq!(json["value"], "184467440737095516150");
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
