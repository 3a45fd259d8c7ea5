//! # Paths — Addressing Leaves of a Merklized Document
//!
//! A [`Path`] is an ordered list of segments, each either an expanded term
//! IRI or a non-negative array index. Its field-element key is computed by
//! byte-hashing every string segment, passing indices through unchanged and
//! hashing the mixed sequence once. Index `2` and term `"2"` therefore
//! produce different keys.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{MerklizeError, PathError};
use crate::field::Hasher;

/// One component of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Term(String),
}

impl PathSegment {
    pub fn as_term(&self) -> Option<&str> {
        match self {
            PathSegment::Term(t) => Some(t),
            PathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Term(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Term(t) => f.write_str(t),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(v: usize) -> Self {
        PathSegment::Index(v)
    }
}

impl From<&str> for PathSegment {
    fn from(v: &str) -> Self {
        PathSegment::Term(v.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(v: String) -> Self {
        PathSegment::Term(v)
    }
}

impl TryFrom<i64> for PathSegment {
    type Error = PathError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        usize::try_from(v)
            .map(PathSegment::Index)
            .map_err(|_| PathError::InvalidSegment(format!("negative index {v}")))
    }
}

impl TryFrom<&serde_json::Value> for PathSegment {
    type Error = PathError;

    fn try_from(v: &serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::String(s) => Ok(PathSegment::Term(s.clone())),
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|u| usize::try_from(u).ok())
                .map(PathSegment::Index)
                .ok_or_else(|| PathError::InvalidSegment(format!("number {n}"))),
            other => Err(PathError::InvalidSegment(other.to_string())),
        }
    }
}

/// Ordered sequence of segments addressing one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    parts: Vec<PathSegment>,
}

impl Path {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a path from dynamic JSON segments.
    ///
    /// # Errors
    ///
    /// [`PathError::InvalidSegment`] for anything other than strings and
    /// non-negative integers.
    pub fn from_json(values: &[serde_json::Value]) -> Result<Self, PathError> {
        let parts = values
            .iter()
            .map(PathSegment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[PathSegment] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn append<I, S>(&mut self, segments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.parts.extend(segments.into_iter().map(Into::into));
    }

    pub fn prepend<I, S>(&mut self, segments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        let mut parts: Vec<PathSegment> = segments.into_iter().map(Into::into).collect();
        parts.append(&mut self.parts);
        self.parts = parts;
    }

    /// Field-element key of the path.
    ///
    /// # Errors
    ///
    /// [`PathError::Empty`] for a path without segments, hash errors from the
    /// backend.
    pub fn mt_entry(&self, hasher: &dyn Hasher) -> Result<BigUint, MerklizeError> {
        if self.parts.is_empty() {
            return Err(PathError::Empty.into());
        }
        let mut inputs = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            match part {
                PathSegment::Term(t) => inputs.push(hasher.hash_bytes(t.as_bytes())?),
                PathSegment::Index(i) => inputs.push(BigUint::from(*i)),
            }
        }
        Ok(hasher.hash(&inputs)?)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(parts: Vec<PathSegment>) -> Self {
        Self { parts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::testutil::FoldHasher;
    use serde_json::json;

    const SUBJECT: &str = "https://www.w3.org/2018/credentials#credentialSubject";
    const BIRTH_DATE: &str = "http://schema.org/birthDate";

    fn sample() -> Path {
        Path::new([
            PathSegment::from(SUBJECT),
            PathSegment::from(1usize),
            PathSegment::from(BIRTH_DATE),
        ])
    }

    #[test]
    fn equality_is_segmentwise() {
        assert_eq!(sample(), sample());
        let other = Path::new([
            PathSegment::from(SUBJECT),
            PathSegment::from("1"),
            PathSegment::from(BIRTH_DATE),
        ]);
        assert_ne!(sample(), other);
    }

    #[test]
    fn index_and_numeric_term_hash_differently() {
        let h = FoldHasher::new();
        let a = Path::new([PathSegment::from("a"), PathSegment::from(2usize)]);
        let b = Path::new([PathSegment::from("a"), PathSegment::from("2")]);
        assert_ne!(a.mt_entry(&h).unwrap(), b.mt_entry(&h).unwrap());
    }

    #[test]
    fn hash_is_content_sensitive() {
        let h = FoldHasher::new();
        let a = Path::new(["x", "y"]);
        let b = Path::new(["y", "x"]);
        assert_ne!(a.mt_entry(&h).unwrap(), b.mt_entry(&h).unwrap());
        assert_eq!(a.mt_entry(&h).unwrap(), Path::new(["x", "y"]).mt_entry(&h).unwrap());
    }

    #[test]
    fn hash_composition() {
        let h = FoldHasher::new();
        let expected = h
            .hash(&[
                h.hash_bytes(SUBJECT.as_bytes()).unwrap(),
                BigUint::from(1u8),
                h.hash_bytes(BIRTH_DATE.as_bytes()).unwrap(),
            ])
            .unwrap();
        assert_eq!(sample().mt_entry(&h).unwrap(), expected);
    }

    #[test]
    fn empty_path_has_no_key() {
        let h = FoldHasher::new();
        let err = Path::default().mt_entry(&h).unwrap_err();
        assert!(matches!(err, MerklizeError::Path(PathError::Empty)));
    }

    #[test]
    fn append_and_prepend() {
        let mut p = Path::new([PathSegment::from(1usize)]);
        p.append([BIRTH_DATE]);
        p.prepend([SUBJECT]);
        assert_eq!(p, sample());
    }

    #[test]
    fn json_boundary() {
        let p = Path::from_json(&[json!(SUBJECT), json!(1), json!(BIRTH_DATE)]).unwrap();
        assert_eq!(p, sample());
        assert!(Path::from_json(&[json!(-1)]).is_err());
        assert!(Path::from_json(&[json!(1.5)]).is_err());
        assert!(Path::from_json(&[json!({"k": "v"})]).is_err());
        assert!(Path::from_json(&[json!(null)]).is_err());
        assert!(PathSegment::try_from(-3i64).is_err());
    }

    #[test]
    fn display_marks_indices() {
        let p = Path::new([PathSegment::from("a"), PathSegment::from(5usize)]);
        assert_eq!(p.to_string(), "a / [5]");
    }

    #[test]
    fn serde_keeps_segment_kinds() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json, json!([SUBJECT, 1, BIRTH_DATE]));
        let back: Path = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }
}
