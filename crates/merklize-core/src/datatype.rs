//! # XSD Datatypes — Lexical Decoding and Native Conversion
//!
//! Literals arrive from the RDF dataset as `(lexical form, datatype IRI)`
//! pairs. [`decode`] turns such a pair into a typed [`Value`] under the
//! rules of the datatype:
//!
//! - `xsd:boolean` accepts `true`/`1`/`1.0E0` and `false`/`0`/`0.0E0`.
//! - `xsd:integer` and its restricted subtypes parse exact integers and
//!   range-check them against the field window.
//! - `xsd:dateTime` accepts a bare `YYYY-MM-DD` date (UTC midnight) or an
//!   RFC 3339 timestamp with optional fractional seconds.
//! - `xsd:double` is rewritten to its canonical scientific form
//!   (`170000` becomes `1.7E5`) and kept as a string.
//! - Every other datatype keeps the lexical form unchanged.
//!
//! [`hash_value`] is the caller-facing shortcut that converts a native Rust
//! value to the lexical form the datatype expects, decodes it, and encodes
//! the result, so that a verifier hashing `170000.0` under `xsd:double`
//! obtains exactly the leaf the document produced.
//!
//! ## Precision Invariant
//!
//! Numeric conversions never lose precision silently: a float used as an
//! integer must be integral and finite, and an integer used as a double must
//! be exactly representable as `f64`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{FromPrimitive, ToPrimitive};

use crate::error::{MerklizeError, ValueError};
use crate::field::{FieldWindow, Hasher};
use crate::value::Value;

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_NON_NEGATIVE_INTEGER: &str =
    "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
pub const XSD_NON_POSITIVE_INTEGER: &str =
    "http://www.w3.org/2001/XMLSchema#nonPositiveInteger";
pub const XSD_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#negativeInteger";
pub const XSD_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// True for `xsd:integer` and its four restricted subtypes.
pub fn is_integer_datatype(datatype: &str) -> bool {
    matches!(
        datatype,
        XSD_INTEGER
            | XSD_NON_NEGATIVE_INTEGER
            | XSD_NON_POSITIVE_INTEGER
            | XSD_NEGATIVE_INTEGER
            | XSD_POSITIVE_INTEGER
    )
}

/// Decode a lexical form under its XSD datatype.
///
/// # Errors
///
/// Returns a [`ValueError`] when the text is not a valid lexical form of the
/// datatype or an integer falls outside the datatype's range.
pub fn decode(datatype: &str, text: &str, prime: &BigUint) -> Result<Value, ValueError> {
    match datatype {
        XSD_BOOLEAN => parse_boolean(text).map(Value::Bool),
        dt if is_integer_datatype(dt) => {
            let v = parse_integer(text)?;
            check_integer_range(dt, &v, &FieldWindow::new(prime))?;
            Ok(Value::BigInt(v))
        }
        XSD_DATE_TIME => parse_date_time(text).map(Value::Time),
        XSD_DOUBLE => parse_double(text).map(|f| Value::String(canonical_double(f))),
        _ => Ok(Value::String(text.to_owned())),
    }
}

fn parse_boolean(text: &str) -> Result<bool, ValueError> {
    match text {
        "true" | "1" | "1.0E0" => Ok(true),
        "false" | "0" | "0.0E0" => Ok(false),
        other => Err(ValueError::InvalidBoolean(other.to_owned())),
    }
}

/// Exact integer parse: optional sign followed by decimal digits only.
fn parse_integer(text: &str) -> Result<BigInt, ValueError> {
    let invalid = || ValueError::InvalidInteger(text.to_owned());
    let digits = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let magnitude = BigInt::from_str(digits).map_err(|_| invalid())?;
    Ok(if text.starts_with('-') {
        -magnitude
    } else {
        magnitude
    })
}

fn check_integer_range(
    datatype: &str,
    v: &BigInt,
    window: &FieldWindow,
) -> Result<(), ValueError> {
    let zero = BigInt::from(0);
    let (min, max) = match datatype {
        XSD_NON_NEGATIVE_INTEGER => (zero, window.max_element()),
        XSD_POSITIVE_INTEGER => (BigInt::from(1), window.max_element()),
        XSD_NON_POSITIVE_INTEGER => (window.min_int().clone(), zero),
        XSD_NEGATIVE_INTEGER => (window.min_int().clone(), BigInt::from(-1)),
        _ => (window.min_int().clone(), window.max_int().clone()),
    };
    if v > &max {
        return Err(ValueError::AboveMaximum(v.clone()));
    }
    if v < &min {
        return Err(ValueError::BelowMinimum(v.clone()));
    }
    Ok(())
}

fn is_plain_date(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

fn parse_date_time(text: &str) -> Result<DateTime<Utc>, ValueError> {
    let invalid = |reason: String| ValueError::InvalidDateTime {
        value: text.to_owned(),
        reason,
    };
    if is_plain_date(text) {
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| invalid(e.to_string()))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| invalid("no midnight for date".into()))?;
        return Ok(Utc.from_utc_datetime(&midnight));
    }
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| invalid(e.to_string()))
}

fn parse_double(text: &str) -> Result<f64, ValueError> {
    match text {
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    // Rust also parses "inf" and "nan"; XSD only knows the spellings above.
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return Err(ValueError::InvalidDouble(text.to_owned()));
    }
    text.parse::<f64>()
        .map_err(|_| ValueError::InvalidDouble(text.to_owned()))
}

/// Canonical XSD lexical form of a double: one integer digit, trimmed
/// mantissa with at least one fractional digit, bare exponent.
pub fn canonical_double(f: f64) -> String {
    if f.is_nan() {
        return "NaN".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF".into() } else { "-INF".into() };
    }
    // `{:E}` yields the shortest mantissa that round-trips to `f`.
    let formatted = format!("{f:E}");
    match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{mantissa}.0E{exponent}")
        }
        _ => formatted,
    }
}

/// Native value supplied by a caller who wants to hash a leaf without a
/// document, typically a verifier reproducing a committed value.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    BigInt(BigInt),
}

impl From<&str> for NativeValue {
    fn from(v: &str) -> Self {
        NativeValue::String(v.to_owned())
    }
}

impl From<String> for NativeValue {
    fn from(v: String) -> Self {
        NativeValue::String(v)
    }
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        NativeValue::Int(v)
    }
}

impl From<i32> for NativeValue {
    fn from(v: i32) -> Self {
        NativeValue::Int(i64::from(v))
    }
}

impl From<u64> for NativeValue {
    fn from(v: u64) -> Self {
        NativeValue::Uint(v)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::Float(v)
    }
}

impl From<bool> for NativeValue {
    fn from(v: bool) -> Self {
        NativeValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for NativeValue {
    fn from(v: DateTime<Utc>) -> Self {
        NativeValue::Time(v)
    }
}

impl From<BigInt> for NativeValue {
    fn from(v: BigInt) -> Self {
        NativeValue::BigInt(v)
    }
}

/// Lexical form of `native` as expected by `datatype`.
///
/// # Errors
///
/// [`ValueError::NotRepresentable`] when a float is used for an integer
/// datatype without being integral, or an integer is used for `xsd:double`
/// without an exact `f64` representation.
pub fn native_to_lexical(native: &NativeValue, datatype: &str) -> Result<String, ValueError> {
    match native {
        NativeValue::String(s) => Ok(s.clone()),
        NativeValue::Bool(b) => Ok(b.to_string()),
        NativeValue::Time(t) => Ok(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        NativeValue::Int(i) => integer_lexical(&BigInt::from(*i), datatype),
        NativeValue::Uint(u) => integer_lexical(&BigInt::from(*u), datatype),
        NativeValue::BigInt(b) => integer_lexical(b, datatype),
        NativeValue::Float(f) => {
            if is_integer_datatype(datatype) {
                float_to_integer(*f).map(|v| v.to_string())
            } else if datatype == XSD_DOUBLE {
                Ok(canonical_double(*f))
            } else {
                Ok(f.to_string())
            }
        }
    }
}

fn integer_lexical(v: &BigInt, datatype: &str) -> Result<String, ValueError> {
    if datatype == XSD_DOUBLE {
        return integer_to_double(v).map(canonical_double);
    }
    Ok(v.to_string())
}

/// Exact conversion of a float to an integer.
///
/// NaN, infinities and values with a fractional part (subnormals included)
/// are rejected; `-0.0` converts to `0`.
pub fn float_to_integer(f: f64) -> Result<BigInt, ValueError> {
    let not_integral = || ValueError::NotRepresentable {
        value: f.to_string(),
        target: "integer",
    };
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(not_integral());
    }
    BigInt::from_f64(f).ok_or_else(not_integral)
}

/// Exact conversion of an integer to a double.
pub fn integer_to_double(v: &BigInt) -> Result<f64, ValueError> {
    let lossy = || ValueError::NotRepresentable {
        value: v.to_string(),
        target: "double",
    };
    let f = v.to_f64().filter(|f| f.is_finite()).ok_or_else(lossy)?;
    match BigInt::from_f64(f) {
        Some(back) if &back == v => Ok(f),
        _ => Err(lossy()),
    }
}

/// Hash a native value as the leaf value a document literal of `datatype`
/// would produce.
///
/// # Errors
///
/// Conversion, range and hash errors.
pub fn hash_value(
    hasher: &dyn Hasher,
    datatype: &str,
    native: impl Into<NativeValue>,
) -> Result<BigUint, MerklizeError> {
    let lexical = native_to_lexical(&native.into(), datatype)?;
    decode(datatype, &lexical, hasher.prime())?.mt_entry(hasher)
}

/// `p - 1` as a signed integer, the upper bound of the non-negative
/// integer datatypes.
pub fn max_field_integer(prime: &BigUint) -> BigInt {
    BigInt::from_biguint(Sign::Plus, prime.clone()) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::bn254_scalar_prime;
    use crate::field::testutil::FoldHasher;
    use chrono::Timelike;

    fn p() -> BigUint {
        bn254_scalar_prime()
    }

    // -----------------------------------------------------------------------
    // Boolean
    // -----------------------------------------------------------------------

    #[test]
    fn boolean_lexical_forms() {
        for t in ["true", "1", "1.0E0"] {
            assert_eq!(decode(XSD_BOOLEAN, t, &p()).unwrap(), Value::Bool(true));
        }
        for t in ["false", "0", "0.0E0"] {
            assert_eq!(decode(XSD_BOOLEAN, t, &p()).unwrap(), Value::Bool(false));
        }
        let err = decode(XSD_BOOLEAN, "yes", &p()).unwrap_err();
        assert!(err.to_string().contains("incorrect boolean value"));
    }

    // -----------------------------------------------------------------------
    // Integers
    // -----------------------------------------------------------------------

    #[test]
    fn integer_decodes_to_bigint() {
        assert_eq!(
            decode(XSD_INTEGER, "-42", &p()).unwrap(),
            Value::BigInt(BigInt::from(-42))
        );
        assert_eq!(
            decode(XSD_INTEGER, "+7", &p()).unwrap(),
            Value::BigInt(BigInt::from(7))
        );
        assert_eq!(
            decode(XSD_INTEGER, "007", &p()).unwrap(),
            Value::BigInt(BigInt::from(7))
        );
    }

    #[test]
    fn integer_rejects_fractions_and_junk() {
        for t in ["1.5", "3.000", "3.0", "abc", "", "1_000", "--1", "1e3", "3.", "-"] {
            assert!(
                matches!(decode(XSD_INTEGER, t, &p()), Err(ValueError::InvalidInteger(_))),
                "{t:?} should be rejected"
            );
        }
    }

    #[test]
    fn integer_window_bounds() {
        let w = FieldWindow::new(&p());
        let max = w.max_int().to_string();
        let over = (w.max_int() + 1i32).to_string();
        let min = w.min_int().to_string();
        let under = (w.min_int() - 1i32).to_string();
        assert!(decode(XSD_INTEGER, &max, &p()).is_ok());
        assert!(decode(XSD_INTEGER, &min, &p()).is_ok());
        assert!(matches!(
            decode(XSD_INTEGER, &over, &p()),
            Err(ValueError::AboveMaximum(_))
        ));
        assert!(matches!(
            decode(XSD_INTEGER, &under, &p()),
            Err(ValueError::BelowMinimum(_))
        ));
    }

    #[test]
    fn restricted_integer_subtypes() {
        let top = max_field_integer(&p()).to_string();
        assert!(decode(XSD_NON_NEGATIVE_INTEGER, "0", &p()).is_ok());
        assert!(decode(XSD_NON_NEGATIVE_INTEGER, &top, &p()).is_ok());
        assert!(decode(XSD_NON_NEGATIVE_INTEGER, "-1", &p()).is_err());
        assert!(decode(XSD_POSITIVE_INTEGER, "0", &p()).is_err());
        assert!(decode(XSD_POSITIVE_INTEGER, &top, &p()).is_ok());
        assert!(decode(XSD_NON_POSITIVE_INTEGER, "0", &p()).is_ok());
        assert!(decode(XSD_NON_POSITIVE_INTEGER, "1", &p()).is_err());
        assert!(decode(XSD_NEGATIVE_INTEGER, "-1", &p()).is_ok());
        assert!(matches!(
            decode(XSD_NEGATIVE_INTEGER, "0", &p()),
            Err(ValueError::AboveMaximum(_))
        ));
    }

    #[test]
    fn positive_integer_below_minimum() {
        let h = FoldHasher::new();
        let err = hash_value(&h, XSD_POSITIVE_INTEGER, "-100500").unwrap_err();
        assert!(err.to_string().contains("integer is below minimum value"));
    }

    #[test]
    fn integer_minus_one_hashes_to_prime_minus_one() {
        let h = FoldHasher::new();
        assert_eq!(hash_value(&h, XSD_INTEGER, "-1").unwrap(), p() - 1u32);
    }

    // -----------------------------------------------------------------------
    // dateTime
    // -----------------------------------------------------------------------

    #[test]
    fn plain_date_is_utc_midnight() {
        let v = decode(XSD_DATE_TIME, "1958-07-18", &p()).unwrap();
        let t = v.as_time().unwrap();
        assert_eq!(t.to_rfc3339(), "1958-07-18T00:00:00+00:00");
    }

    #[test]
    fn rfc3339_with_offset_and_nanos() {
        let v = decode(XSD_DATE_TIME, "2019-12-03T14:19:52.123456789+02:00", &p()).unwrap();
        let t = v.as_time().unwrap();
        assert_eq!(t.hour(), 12);
        assert_eq!(t.nanosecond(), 123_456_789);
    }

    #[test]
    fn invalid_date_time() {
        assert!(decode(XSD_DATE_TIME, "2019-13-03", &p()).is_err());
        assert!(decode(XSD_DATE_TIME, "yesterday", &p()).is_err());
    }

    // -----------------------------------------------------------------------
    // double
    // -----------------------------------------------------------------------

    #[test]
    fn canonical_double_forms() {
        assert_eq!(canonical_double(170000.0), "1.7E5");
        assert_eq!(canonical_double(1.0), "1.0E0");
        assert_eq!(canonical_double(0.0), "0.0E0");
        assert_eq!(canonical_double(-1.5), "-1.5E0");
        assert_eq!(canonical_double(0.000_000_1), "1.0E-7");
        assert_eq!(canonical_double(123.456), "1.23456E2");
        assert_eq!(canonical_double(f64::INFINITY), "INF");
        assert_eq!(canonical_double(f64::NEG_INFINITY), "-INF");
        assert_eq!(canonical_double(f64::NAN), "NaN");
    }

    #[test]
    fn canonical_double_keeps_every_significant_digit() {
        let sum = 0.1 + 0.2;
        assert_ne!(sum, 0.3);
        assert_eq!(canonical_double(0.3), "3.0E-1");
        assert_eq!(canonical_double(sum), "3.0000000000000004E-1");
        assert_ne!(canonical_double(sum), canonical_double(0.3));
        assert_eq!(canonical_double(f64::MAX), "1.7976931348623157E308");
        assert_eq!(canonical_double(5e-324), "5.0E-324");
    }

    #[test]
    fn double_decodes_to_canonical_string() {
        assert_eq!(
            decode(XSD_DOUBLE, "170000", &p()).unwrap(),
            Value::String("1.7E5".into())
        );
        assert_eq!(
            decode(XSD_DOUBLE, "1.7E5", &p()).unwrap(),
            Value::String("1.7E5".into())
        );
        assert_eq!(
            decode(XSD_DOUBLE, "-INF", &p()).unwrap(),
            Value::String("-INF".into())
        );
        assert!(decode(XSD_DOUBLE, "inf", &p()).is_err());
        assert!(decode(XSD_DOUBLE, "1.2.3", &p()).is_err());
    }

    #[test]
    fn double_hash_matches_canonical_bytes() {
        let h = FoldHasher::new();
        assert_eq!(
            hash_value(&h, XSD_DOUBLE, 170000.0).unwrap(),
            h.hash_bytes(b"1.7E5").unwrap()
        );
        assert_eq!(
            hash_value(&h, XSD_DOUBLE, 170000i64).unwrap(),
            h.hash_bytes(b"1.7E5").unwrap()
        );
    }

    #[test]
    fn integer_as_double_must_be_exact() {
        let h = FoldHasher::new();
        let exact = 1i64 << 53;
        assert!(hash_value(&h, XSD_DOUBLE, exact).is_ok());
        let err = hash_value(&h, XSD_DOUBLE, exact + 1).unwrap_err();
        assert!(err.to_string().contains("not exactly representable as double"));
        assert!(hash_value(&h, XSD_DOUBLE, u64::MAX).is_err());
    }

    // -----------------------------------------------------------------------
    // Float coercion into integer datatypes
    // -----------------------------------------------------------------------

    #[test]
    fn integral_float_as_integer() {
        let h = FoldHasher::new();
        assert_eq!(
            hash_value(&h, XSD_INTEGER, 42.0).unwrap(),
            BigUint::from(42u32)
        );
        assert_eq!(hash_value(&h, XSD_INTEGER, -1.0).unwrap(), p() - 1u32);
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(float_to_integer(-0.0).unwrap(), BigInt::from(0));
    }

    #[test]
    fn non_integral_floats_rejected() {
        assert!(float_to_integer(1.5).is_err());
        assert!(float_to_integer(f64::NAN).is_err());
        assert!(float_to_integer(f64::INFINITY).is_err());
        assert!(float_to_integer(f64::MIN_POSITIVE / 2.0).is_err());
    }

    #[test]
    fn float_under_plain_datatype_uses_shortest_form() {
        assert_eq!(
            native_to_lexical(&NativeValue::Float(1.5), XSD_STRING).unwrap(),
            "1.5"
        );
    }

    #[test]
    fn time_lexical_round_trip() {
        let t = Utc.with_ymd_and_hms(2019, 12, 3, 12, 19, 52).unwrap();
        let lex = native_to_lexical(&NativeValue::Time(t), XSD_DATE_TIME).unwrap();
        assert_eq!(lex, "2019-12-03T12:19:52Z");
        assert_eq!(decode(XSD_DATE_TIME, &lex, &p()).unwrap(), Value::Time(t));
    }

    #[test]
    fn unknown_datatype_passes_text_through() {
        assert_eq!(
            decode("http://example.com/custom", "  raw ", &p()).unwrap(),
            Value::String("  raw ".into())
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn integer_text_round_trip(v in any::<i64>()) {
                let native = NativeValue::Int(v);
                let lex = native_to_lexical(&native, XSD_INTEGER).unwrap();
                prop_assert_eq!(
                    decode(XSD_INTEGER, &lex, &p()).unwrap(),
                    Value::BigInt(BigInt::from(v))
                );
            }

            #[test]
            fn boolean_text_round_trip(b in any::<bool>()) {
                let lex = native_to_lexical(&NativeValue::Bool(b), XSD_BOOLEAN).unwrap();
                prop_assert_eq!(decode(XSD_BOOLEAN, &lex, &p()).unwrap(), Value::Bool(b));
            }

            #[test]
            fn date_text_round_trip(days in 0i64..100_000) {
                let t = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::days(days);
                let lex = native_to_lexical(&NativeValue::Time(t), XSD_DATE_TIME).unwrap();
                prop_assert_eq!(decode(XSD_DATE_TIME, &lex, &p()).unwrap(), Value::Time(t));
            }

            #[test]
            fn field_window_round_trip(v in any::<i128>()) {
                let v = BigInt::from(v);
                let fe = crate::value::encode_integer(&v, &p()).unwrap();
                prop_assert_eq!(crate::field::decode_field_element(&fe, &p()), v);
            }
        }
    }
}
