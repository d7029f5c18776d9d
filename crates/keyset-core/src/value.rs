//! Nullable scalar values carried by sort keys, predicates, and page tokens.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A nullable scalar observed in a sort-key column.
///
/// `Null` is a first-class state. It is never compared with `=`, `<` or `>`
/// when rendered into a predicate; the builder emits `IS NULL` / `IS NOT NULL`
/// tests for it instead.
///
/// The serialized form is self-describing (`"null"`, `{"integer":5}`,
/// `{"timestamp":"2020-02-01T00:00:00Z"}`, …) so page tokens can be decoded
/// without knowing the keyset that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
   Null,
   Integer(i64),
   /// Must be finite to round-trip through a page token.
   Real(f64),
   Text(String),
   Blob(#[serde(with = "blob")] Vec<u8>),
   Bool(bool),
   /// Bound as sqlx encodes `OffsetDateTime`. SQLite compares date text as
   /// plain strings, so this only pages correctly over columns written with
   /// that same encoding. Columns holding SQLite's native
   /// `YYYY-MM-DD HH:MM:SS` text (`CURRENT_TIMESTAMP`, `datetime()`) should be
   /// read as `String` and keyed with [`Value::Text`] instead.
   Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),
}

impl Value {
   pub fn is_null(&self) -> bool {
      matches!(self, Value::Null)
   }
}

impl From<i64> for Value {
   fn from(value: i64) -> Self {
      Value::Integer(value)
   }
}

impl From<i32> for Value {
   fn from(value: i32) -> Self {
      Value::Integer(value.into())
   }
}

impl From<f64> for Value {
   fn from(value: f64) -> Self {
      Value::Real(value)
   }
}

impl From<String> for Value {
   fn from(value: String) -> Self {
      Value::Text(value)
   }
}

impl From<&str> for Value {
   fn from(value: &str) -> Self {
      Value::Text(value.to_owned())
   }
}

impl From<Vec<u8>> for Value {
   fn from(value: Vec<u8>) -> Self {
      Value::Blob(value)
   }
}

impl From<bool> for Value {
   fn from(value: bool) -> Self {
      Value::Bool(value)
   }
}

impl From<OffsetDateTime> for Value {
   fn from(value: OffsetDateTime) -> Self {
      Value::Timestamp(value)
   }
}

impl<T: Into<Value>> From<Option<T>> for Value {
   fn from(value: Option<T>) -> Self {
      value.map_or(Value::Null, Into::into)
   }
}

/// Blobs travel as URL-safe base64 strings inside the token envelope.
mod blob {
   use base64::Engine;
   use base64::engine::general_purpose::URL_SAFE_NO_PAD;
   use serde::{Deserialize, Deserializer, Serializer};

   pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
      serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
   }

   pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
      let encoded = String::deserialize(deserializer)?;
      URL_SAFE_NO_PAD
         .decode(encoded.as_bytes())
         .map_err(serde::de::Error::custom)
   }
}
