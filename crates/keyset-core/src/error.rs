/// Result type alias for keyset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building keyset predicates or handling page tokens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// A keyset must contain at least one sort key.
   #[error("keyset pagination requires at least one sort key")]
   EmptySortKeys,

   /// The number of last-row values does not match the number of sort keys.
   #[error("got {values_len} last-row values but keyset has {keys_len} sort keys")]
   ValueCountMismatch { values_len: usize, keys_len: usize },

   /// Column name contains characters that are not safe to interpolate.
   ///
   /// Column names must match `[a-zA-Z_][a-zA-Z0-9_]*`, optionally qualified
   /// with dots (`table.column`).
   #[error("invalid sort key column name '{name}': must match [a-zA-Z_][a-zA-Z0-9_.]*")]
   InvalidColumnName { name: String },

   /// The same expression appears more than once in a keyset.
   #[error("sort key '{expression}' appears more than once in the keyset")]
   DuplicateSortKey { expression: String },

   /// Page token is not a validly formed token.
   #[error("malformed page token: {reason}")]
   MalformedToken { reason: String },

   /// Value cannot be represented in a page token.
   #[error("value cannot be encoded in a page token: {reason}")]
   UnencodableValue { reason: String },
}

impl Error {
   /// Machine-readable error code.
   pub fn error_code(&self) -> String {
      match self {
         Error::EmptySortKeys => "EMPTY_SORT_KEYS".to_string(),
         Error::ValueCountMismatch { .. } => "VALUE_COUNT_MISMATCH".to_string(),
         Error::InvalidColumnName { .. } => "INVALID_COLUMN_NAME".to_string(),
         Error::DuplicateSortKey { .. } => "DUPLICATE_SORT_KEY".to_string(),
         Error::MalformedToken { .. } => "MALFORMED_TOKEN".to_string(),
         Error::UnencodableValue { .. } => "UNENCODABLE_VALUE".to_string(),
      }
   }

   pub(crate) fn malformed(reason: impl Into<String>) -> Self {
      Error::MalformedToken {
         reason: reason.into(),
      }
   }
}
