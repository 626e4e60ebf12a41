use std::fmt;

use serde::de::{DeserializeSeed, IgnoredAny, MapAccess, Visitor};
use serde::Deserializer;

use crate::error::Error;

/// Default name of the top-level key holding the version number.
pub const VERSION_KEY: &str = "Version";

/// Version assumed when the version key is missing or zero.
pub const IMPLICIT_VERSION: u64 = 1;

/// Read the version number of a JSON object without decoding the rest.
///
/// Every other key is skipped. A missing, `null` or zero version means
/// [`IMPLICIT_VERSION`], so data written before versioning was introduced
/// reads as version 1.
///
/// # Example
///
/// ```
/// use vjson::{peek_version, VERSION_KEY};
///
/// assert_eq!(peek_version(br#"{"Version":3,"Name":"x"}"#, VERSION_KEY).unwrap(), 3);
/// assert_eq!(peek_version(br#"{"Name":"x"}"#, VERSION_KEY).unwrap(), 1);
/// assert!(peek_version(br#"{"Version":-1}"#, VERSION_KEY).is_err());
/// ```
pub fn peek_version(data: &[u8], key: &str) -> Result<u64, Error> {
    let mut de = serde_json::Deserializer::from_slice(data);
    let version = VersionProbe { key }.deserialize(&mut de)?;
    de.end()?;

    match version.unwrap_or(0) {
        v if v < 0 => Err(Error::NegativeVersion(v)),
        0 => Ok(IMPLICIT_VERSION),
        v => Ok(v as u64),
    }
}

/// Whether the input is the JSON literal `null`.
pub(crate) fn is_null(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &data[start..end] == b"null"
}

struct VersionProbe<'k> {
    key: &'k str,
}

impl<'de, 'k> DeserializeSeed<'de> for VersionProbe<'k> {
    type Value = Option<i64>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'k> Visitor<'de> for VersionProbe<'k> {
    type Value = Option<i64>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a JSON object with an optional integer `{}` key", self.key)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        // An exact key beats a case-insensitive one; among equals the last wins.
        let mut exact = None;
        let mut folded = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == self.key {
                exact = Some(map.next_value::<Option<i64>>()?);
            } else if key.eq_ignore_ascii_case(self.key) {
                folded = Some(map.next_value::<Option<i64>>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(exact.or(folded).flatten())
    }
}
