//! The seam between the pager and whatever runs SQL.

use futures::future::BoxFuture;
use keyset_core::Value;
use sqlx::Sqlite;
use sqlx::query::QueryAs;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};

use crate::Result;
use crate::database::SqliteDatabase;

/// A fully composed SQL statement and every value bound to it, in
/// placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
   pub sql: String,
   pub values: Vec<Value>,
}

/// Runs a statement and materializes its rows as `R`.
///
/// The pager calls this exactly once per page. Implementations own retries,
/// timeouts, and transaction scope; errors are passed through unchanged.
pub trait QueryExecutor<R>: Send + Sync {
   fn fetch_all(&self, statement: Statement) -> BoxFuture<'_, Result<Vec<R>>>;
}

impl<R> QueryExecutor<R> for SqlitePool
where
   R: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin + 'static,
{
   fn fetch_all(&self, statement: Statement) -> BoxFuture<'_, Result<Vec<R>>> {
      Box::pin(async move {
         let mut q = sqlx::query_as::<_, R>(&statement.sql);
         for value in statement.values.iter().cloned() {
            q = bind_value(q, value);
         }
         Ok(q.fetch_all(self).await?)
      })
   }
}

impl<R> QueryExecutor<R> for SqliteDatabase
where
   R: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin + 'static,
{
   fn fetch_all(&self, statement: Statement) -> BoxFuture<'_, Result<Vec<R>>> {
      QueryExecutor::<R>::fetch_all(self.read_pool(), statement)
   }
}

/// Bind a keyset value using its native SQLite type.
pub(crate) fn bind_value<'q, R>(
   query: QueryAs<'q, Sqlite, R, SqliteArguments<'q>>,
   value: Value,
) -> QueryAs<'q, Sqlite, R, SqliteArguments<'q>> {
   match value {
      Value::Null => query.bind(None::<i64>),
      Value::Integer(v) => query.bind(v),
      Value::Real(v) => query.bind(v),
      Value::Text(v) => query.bind(v),
      Value::Blob(v) => query.bind(v),
      Value::Bool(v) => query.bind(v),
      Value::Timestamp(v) => query.bind(v),
   }
}
