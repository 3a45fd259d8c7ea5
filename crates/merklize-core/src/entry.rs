//! # Entries — (Path, Value, Datatype) Leaves
//!
//! An [`Entry`] is one committed leaf. The path hash is its tree key, the
//! encoded value its tree value. The datatype records the XSD type IRI the
//! value was decoded from; it is empty for IRI references.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{MerklizeError, PathError};
use crate::field::Hasher;
use crate::path::Path;
use crate::value::Value;

/// Immutable merklized leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    path: Path,
    value: Value,
    #[serde(default)]
    datatype: String,
}

impl Entry {
    /// Entry without a datatype.
    ///
    /// # Errors
    ///
    /// [`PathError::Empty`] when `path` has no segments.
    pub fn new(path: Path, value: impl Into<Value>) -> Result<Self, PathError> {
        Self::with_datatype(path, value, String::new())
    }

    pub fn with_datatype(
        path: Path,
        value: impl Into<Value>,
        datatype: impl Into<String>,
    ) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self {
            path,
            value: value.into(),
            datatype: datatype.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    pub fn key_mt_entry(&self, hasher: &dyn Hasher) -> Result<BigUint, MerklizeError> {
        self.path.mt_entry(hasher)
    }

    pub fn value_mt_entry(&self, hasher: &dyn Hasher) -> Result<BigUint, MerklizeError> {
        self.value.mt_entry(hasher)
    }

    /// Key and value field elements, in that order.
    pub fn key_value_mt_entries(
        &self,
        hasher: &dyn Hasher,
    ) -> Result<(BigUint, BigUint), MerklizeError> {
        Ok((self.key_mt_entry(hasher)?, self.value_mt_entry(hasher)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::XSD_INTEGER;
    use crate::field::testutil::FoldHasher;
    use crate::path::PathSegment;
    use num_bigint::BigInt;

    #[test]
    fn empty_path_rejected() {
        assert_eq!(Entry::new(Path::default(), 1i64), Err(PathError::Empty));
    }

    #[test]
    fn key_value_pair() {
        let h = FoldHasher::new();
        let path = Path::new([PathSegment::from("http://example.com/age")]);
        let entry =
            Entry::with_datatype(path.clone(), BigInt::from(-1), XSD_INTEGER).unwrap();
        let (k, v) = entry.key_value_mt_entries(&h).unwrap();
        assert_eq!(k, path.mt_entry(&h).unwrap());
        assert_eq!(v, h.prime() - 1u32);
        assert_eq!(entry.datatype(), XSD_INTEGER);
    }

    #[test]
    fn iri_entry_has_empty_datatype() {
        let entry = Entry::new(
            Path::new(["http://www.w3.org/1999/02/22-rdf-syntax-ns#type"]),
            "https://www.w3.org/2018/credentials#VerifiableCredential",
        )
        .unwrap();
        assert_eq!(entry.datatype(), "");
        assert_eq!(
            entry.value().as_str(),
            Some("https://www.w3.org/2018/credentials#VerifiableCredential")
        );
    }
}
