//! Opaque page tokens.
//!
//! A token carries the sort-key values of the last row on a page. It is a
//! URL-safe base64 string (no padding) wrapping a small JSON envelope:
//!
//! ```text
//! {"v":1,"k":[{"integer":20},"null",{"timestamp":"2020-02-01T00:00:00Z"}]}
//! ```
//!
//! Only this module builds or parses tokens. The codec does not know which
//! keyset produced a token; checking that its arity matches is the caller's job.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Error, Result, Value};

const TOKEN_VERSION: u8 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
   v: u8,
   k: &'a [Value],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
   v: u8,
   k: Vec<Value>,
}

/// Encode last-row values into an opaque, URL-safe token.
pub fn encode(values: &[Value]) -> Result<String> {
   if let Some(real) = values.iter().find_map(|v| match v {
      Value::Real(r) if !r.is_finite() => Some(*r),
      _ => None,
   }) {
      return Err(Error::UnencodableValue {
         reason: format!("non-finite real {real}"),
      });
   }

   let json = serde_json::to_vec(&EnvelopeRef {
      v: TOKEN_VERSION,
      k: values,
   })
   .map_err(|e| Error::UnencodableValue {
      reason: e.to_string(),
   })?;

   trace!(values = values.len(), "Encoded page token");
   Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token produced by [`encode`] back into its values.
pub fn decode(token: &str) -> Result<Vec<Value>> {
   let json = URL_SAFE_NO_PAD
      .decode(token.as_bytes())
      .map_err(|e| Error::malformed(format!("invalid base64: {e}")))?;

   let envelope: Envelope = serde_json::from_slice(&json)
      .map_err(|e| Error::malformed(format!("invalid envelope: {e}")))?;

   if envelope.v != TOKEN_VERSION {
      return Err(Error::malformed(format!(
         "unsupported token version {}",
         envelope.v
      )));
   }

   trace!(values = envelope.k.len(), "Decoded page token");
   Ok(envelope.k)
}

/// Typed handle for an encoded page token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
   pub fn encode(values: &[Value]) -> Result<Self> {
      encode(values).map(Self)
   }

   pub fn decode(&self) -> Result<Vec<Value>> {
      decode(&self.0)
   }

   pub fn as_str(&self) -> &str {
      &self.0
   }
}

impl fmt::Display for PageToken {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.0)
   }
}

/// Parsing checks that the string decodes; the values are discarded.
impl FromStr for PageToken {
   type Err = Error;

   fn from_str(s: &str) -> Result<Self> {
      decode(s)?;
      Ok(Self(s.to_string()))
   }
}

impl From<PageToken> for String {
   fn from(token: PageToken) -> Self {
      token.0
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use time::macros::datetime;

   fn roundtrip(values: Vec<Value>) {
      let token = encode(&values).unwrap();
      assert_eq!(decode(&token).unwrap(), values);
   }

   // ─── round trip ───

   #[test]
   fn roundtrip_empty_sequence() {
      roundtrip(vec![]);
   }

   #[test]
   fn roundtrip_nulls_at_any_position() {
      roundtrip(vec![Value::Null]);
      roundtrip(vec![Value::Null, Value::Integer(1)]);
      roundtrip(vec![Value::Integer(1), Value::Null]);
      roundtrip(vec![Value::Null, Value::Null, Value::Null]);
   }

   #[test]
   fn roundtrip_every_scalar_kind() {
      roundtrip(vec![
         Value::Integer(i64::MIN),
         Value::Integer(i64::MAX),
         Value::Real(-0.5),
         Value::Text("it's \"quoted\" / ünïcödé".into()),
         Value::Blob(vec![0, 1, 254, 255]),
         Value::Bool(true),
         Value::Timestamp(datetime!(2020-01-31 13:45:10.123456789 +02:00)),
      ]);
   }

   #[test]
   fn token_is_url_safe() {
      let token = encode(&[Value::Text("??>>//++".repeat(8)), Value::Null]).unwrap();
      assert!(
         token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
      );
   }

   #[test]
   fn token_envelope_layout() {
      let token = encode(&[Value::Integer(20), Value::Null]).unwrap();
      let json = URL_SAFE_NO_PAD.decode(token).unwrap();
      assert_eq!(
         String::from_utf8(json).unwrap(),
         r#"{"v":1,"k":[{"integer":20},"null"]}"#
      );
   }

   // ─── malformed input ───

   #[test]
   fn decode_rejects_bad_base64() {
      assert!(matches!(
         decode("not a token!"),
         Err(Error::MalformedToken { .. })
      ));
   }

   #[test]
   fn decode_rejects_empty_string() {
      assert!(matches!(decode(""), Err(Error::MalformedToken { .. })));
   }

   #[test]
   fn decode_rejects_non_envelope_json() {
      let token = URL_SAFE_NO_PAD.encode(r#"[1,2,3]"#);
      assert!(matches!(
         decode(&token),
         Err(Error::MalformedToken { .. })
      ));
   }

   #[test]
   fn decode_rejects_illegal_value() {
      let token = URL_SAFE_NO_PAD.encode(r#"{"v":1,"k":[{"integer":"x"}]}"#);
      assert!(matches!(
         decode(&token),
         Err(Error::MalformedToken { .. })
      ));
   }

   #[test]
   fn decode_rejects_unknown_version() {
      let token = URL_SAFE_NO_PAD.encode(r#"{"v":2,"k":[]}"#);
      let err = decode(&token).unwrap_err();
      assert!(err.to_string().contains("unsupported token version 2"));
   }

   #[test]
   fn decode_rejects_extra_fields() {
      let token = URL_SAFE_NO_PAD.encode(r#"{"v":1,"k":[],"x":0}"#);
      assert!(decode(&token).is_err());
   }

   // ─── encode errors ───

   #[test]
   fn encode_rejects_non_finite_real() {
      assert!(matches!(
         encode(&[Value::Real(f64::NAN)]),
         Err(Error::UnencodableValue { .. })
      ));
      assert!(encode(&[Value::Real(f64::INFINITY)]).is_err());
   }

   // ─── PageToken ───

   #[test]
   fn page_token_parse_validates() {
      let token = PageToken::encode(&[Value::Integer(3)]).unwrap();
      let parsed: PageToken = token.as_str().parse().unwrap();
      assert_eq!(parsed, token);
      assert_eq!(parsed.decode().unwrap(), vec![Value::Integer(3)]);
      assert!("%%%".parse::<PageToken>().is_err());
   }
}
