//! # sqlx-sqlite-pager
//!
//! Keyset (seek) pagination for SQLite over sqlx, with per-column sort
//! direction and NULL placement and opaque page tokens.
//!
//! ## Core Types
//!
//! - **[`Paginator`]**: base query + keyset, validated once and reused per page
//! - **[`FetchPageBuilder`]**: one page request; `.after(token)` then `.await`
//! - **[`Page`]**: rows plus the token for the following page
//! - **[`QueryExecutor`]**: where SQL runs; implemented for [`SqliteDatabase`]
//!   and `sqlx::SqlitePool`
//! - **[`Record`]**: dynamically shaped row for use without a `FromRow` type
//!
//! ## Example
//!
//! ```no_run
//! use sqlx_sqlite_pager::{Paginator, SortKey, SqliteDatabase, Value};
//!
//! #[derive(sqlx::FromRow)]
//! struct Post {
//!    id: i64,
//!    score: Option<i64>,
//! }
//!
//! # async fn run() -> sqlx_sqlite_pager::Result<()> {
//! let db = SqliteDatabase::connect("posts.db", None).await?;
//! let paginator = Paginator::new(
//!    "SELECT id, score FROM posts",
//!    vec![
//!       SortKey::desc("score", |p: &Post| p.score.into()).nulls_last(),
//!       SortKey::asc("id", |p: &Post| Value::from(p.id)),
//!    ],
//! )?;
//!
//! let mut token = String::new();
//! loop {
//!    let page = paginator.fetch_page(&db, 50).after(token.as_str()).await?;
//!    // ... use page.rows ...
//!    match page.next_token {
//!       Some(next) => token = next,
//!       None => break,
//!    }
//! }
//! # Ok(())
//! # }
//! ```

mod builders;
mod config;
mod database;
mod error;
mod executor;
mod query;
pub mod record;

pub use builders::{FetchPageBuilder, Page, Paginator, paginate};
pub use config::{PageConfig, SqliteDatabaseConfig};
pub use database::SqliteDatabase;
pub use error::{Error, Result};
pub use executor::{QueryExecutor, Statement};
pub use record::Record;

pub use keyset_core::{
   Condition, Direction, NullPlacement, PageToken, SortExpression, SortKey, Value,
   build_after_condition, build_order_by, token,
};
