/// Result type alias for pager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for keyset pagination over SQLite.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Keyset construction or page token error.
   #[error(transparent)]
   Keyset(#[from] keyset_core::Error),

   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from a caller-supplied query executor.
   #[error("query executor failed: {0}")]
   Executor(#[source] Box<dyn std::error::Error + Send + Sync>),

   /// I/O error when accessing database files.
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   /// Decoded page token does not match the keyset it is used with.
   #[error("page token has {token_len} values but keyset has {keys_len} sort keys")]
   TokenArityMismatch { token_len: usize, keys_len: usize },

   /// Page size plus the look-ahead row does not fit in a SQLite LIMIT.
   #[error("page size is too large")]
   InvalidPageSize,

   /// Requested page size is above the configured maximum.
   #[error("page size {requested} exceeds the maximum of {max}")]
   PageSizeExceeded { requested: usize, max: usize },

   /// A page size of zero (fetch everything) is disabled by configuration.
   #[error("unbounded pages (page size 0) are not allowed")]
   UnboundedPageNotAllowed,

   /// Base query contains a clause the pager appends itself.
   #[error(
      "pagination base query must not contain top-level ORDER BY, LIMIT, OFFSET, or compound SELECT clauses (wrap it in a subquery instead)"
   )]
   InvalidPaginationQuery,

   /// Sort key column not found in a returned row.
   #[error("sort key column '{column}' not found in query results")]
   CursorColumnNotFound { column: String },
}

impl Error {
   /// Wrap an error raised by a custom [`QueryExecutor`](crate::QueryExecutor).
   pub fn executor(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
      Error::Executor(error.into())
   }

   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::Keyset(e) => e.error_code(),
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::Executor(_) => "EXECUTOR_ERROR".to_string(),
         Error::Io(_) => "IO_ERROR".to_string(),
         Error::TokenArityMismatch { .. } => "TOKEN_ARITY_MISMATCH".to_string(),
         Error::InvalidPageSize => "INVALID_PAGE_SIZE".to_string(),
         Error::PageSizeExceeded { .. } => "PAGE_SIZE_EXCEEDED".to_string(),
         Error::UnboundedPageNotAllowed => "UNBOUNDED_PAGE_NOT_ALLOWED".to_string(),
         Error::InvalidPaginationQuery => "INVALID_PAGINATION_QUERY".to_string(),
         Error::CursorColumnNotFound { .. } => "CURSOR_COLUMN_NOT_FOUND".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_keyset_passthrough() {
      let err: Error = keyset_core::Error::EmptySortKeys.into();
      assert_eq!(err.error_code(), "EMPTY_SORT_KEYS");
      assert!(err.to_string().contains("at least one sort key"));
   }

   #[test]
   fn test_error_code_malformed_token() {
      let err: Error = keyset_core::Error::MalformedToken {
         reason: "invalid base64".into(),
      }
      .into();
      assert_eq!(err.error_code(), "MALFORMED_TOKEN");
   }

   #[test]
   fn test_error_code_sqlx_non_database() {
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
   }

   #[test]
   fn test_error_code_executor() {
      let err = Error::executor("connection reset");
      assert_eq!(err.error_code(), "EXECUTOR_ERROR");
      assert!(err.to_string().contains("connection reset"));
   }

   #[test]
   fn test_error_code_io() {
      let err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
      assert_eq!(err.error_code(), "IO_ERROR");
   }

   #[test]
   fn test_error_code_token_arity_mismatch() {
      let err = Error::TokenArityMismatch {
         token_len: 1,
         keys_len: 2,
      };
      assert_eq!(err.error_code(), "TOKEN_ARITY_MISMATCH");
      assert!(err.to_string().contains("1 values"));
      assert!(err.to_string().contains("2 sort keys"));
   }

   #[test]
   fn test_error_code_page_size() {
      assert_eq!(Error::InvalidPageSize.error_code(), "INVALID_PAGE_SIZE");
      let err = Error::PageSizeExceeded {
         requested: 500,
         max: 100,
      };
      assert_eq!(err.error_code(), "PAGE_SIZE_EXCEEDED");
      assert!(err.to_string().contains("500"));
      assert_eq!(
         Error::UnboundedPageNotAllowed.error_code(),
         "UNBOUNDED_PAGE_NOT_ALLOWED"
      );
   }

   #[test]
   fn test_error_code_invalid_pagination_query() {
      let err = Error::InvalidPaginationQuery;
      assert_eq!(err.error_code(), "INVALID_PAGINATION_QUERY");
      assert!(err.to_string().contains("top-level ORDER BY, LIMIT"));
   }

   #[test]
   fn test_error_code_cursor_column_not_found() {
      let err = Error::CursorColumnNotFound {
         column: "score".into(),
      };
      assert_eq!(err.error_code(), "CURSOR_COLUMN_NOT_FOUND");
      assert!(err.to_string().contains("score"));
   }
}
