//! Configuration for the SQLite pool and for page size policy

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for the [`SqliteDatabase`](crate::SqliteDatabase) read pool
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_pager::SqliteDatabaseConfig;
/// use std::time::Duration;
///
/// let config = SqliteDatabaseConfig {
///    max_read_connections: 3,
///    ..Default::default()
/// };
/// assert_eq!(config.idle_timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct SqliteDatabaseConfig {
   /// Maximum number of pooled connections
   ///
   /// Default: 6
   pub max_read_connections: u32,

   /// Connections idle for this long are closed
   ///
   /// Default: 30 seconds
   pub idle_timeout: Duration,
}

impl Default for SqliteDatabaseConfig {
   fn default() -> Self {
      Self {
         max_read_connections: 6,
         idle_timeout: Duration::from_secs(30),
      }
   }
}

/// Page size policy applied by a [`Paginator`](crate::Paginator).
///
/// The default places no cap and allows `page_size == 0` to fetch every
/// matching row in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageConfig {
   /// Largest page size a caller may request.
   pub max_page_size: Option<usize>,

   /// Whether `page_size == 0` (no limit) is accepted.
   pub allow_unbounded: bool,
}

impl Default for PageConfig {
   fn default() -> Self {
      Self {
         max_page_size: None,
         allow_unbounded: true,
      }
   }
}

impl PageConfig {
   pub(crate) fn check_page_size(&self, page_size: usize) -> Result<()> {
      if page_size == 0 && !self.allow_unbounded {
         return Err(Error::UnboundedPageNotAllowed);
      }
      if let Some(max) = self.max_page_size
         && page_size > max
      {
         return Err(Error::PageSizeExceeded {
            requested: page_size,
            max,
         });
      }
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn default_allows_everything() {
      let config = PageConfig::default();
      assert!(config.check_page_size(0).is_ok());
      assert!(config.check_page_size(usize::MAX).is_ok());
   }

   #[test]
   fn max_page_size_is_inclusive() {
      let config = PageConfig {
         max_page_size: Some(100),
         ..Default::default()
      };
      assert!(config.check_page_size(100).is_ok());
      assert!(matches!(
         config.check_page_size(101),
         Err(Error::PageSizeExceeded {
            requested: 101,
            max: 100
         })
      ));
   }

   #[test]
   fn unbounded_can_be_disabled() {
      let config = PageConfig {
         allow_unbounded: false,
         ..Default::default()
      };
      assert!(matches!(
         config.check_page_size(0),
         Err(Error::UnboundedPageNotAllowed)
      ));
      assert!(config.check_page_size(1).is_ok());
   }

   #[test]
   fn deserializes_with_defaults() {
      let config: PageConfig = serde_json::from_str(r#"{"maxPageSize":50}"#).unwrap();
      assert_eq!(config.max_page_size, Some(50));
      assert!(config.allow_unbounded);
   }
}
