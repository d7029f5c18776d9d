//! File-backed SQLite database with a pooled set of connections

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::{Result, SqliteDatabaseConfig};

/// SQLite database backed by a sqlx connection pool.
///
/// WAL journal mode is enabled so page reads can run alongside a writer.
/// Implements [`QueryExecutor`](crate::QueryExecutor) for any `FromRow` type.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
   pool: SqlitePool,
   path: PathBuf,
}

impl SqliteDatabase {
   /// Open (creating if needed) the database file at `path`.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Self> {
      let path = path.as_ref().to_path_buf();
      let config = custom_config.unwrap_or_default();

      let options = SqliteConnectOptions::new()
         .filename(&path)
         .create_if_missing(true)
         .journal_mode(SqliteJournalMode::Wal);

      let pool = SqlitePoolOptions::new()
         .max_connections(config.max_read_connections)
         .idle_timeout(config.idle_timeout)
         .connect_with(options)
         .await?;

      debug!(path = %path.display(), max_connections = config.max_read_connections, "Opened SQLite database");
      Ok(Self { pool, path })
   }

   /// Pool used for page queries. Also usable for writes.
   pub fn read_pool(&self) -> &SqlitePool {
      &self.pool
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Close every pooled connection.
   pub async fn close(self) -> Result<()> {
      self.pool.close().await;
      debug!(path = %self.path.display(), "Closed SQLite database");
      Ok(())
   }

   /// Close the database and delete its file along with WAL/SHM siblings.
   pub async fn remove(self) -> Result<()> {
      let path = self.path.clone();
      self.close().await?;

      for suffix in ["", "-wal", "-shm"] {
         let mut file = path.clone().into_os_string();
         file.push(suffix);
         match std::fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
         }
      }

      Ok(())
   }
}
