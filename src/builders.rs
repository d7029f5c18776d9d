//! Paginated query orchestration.
//!
//! A [`Paginator`] captures one query shape: the base SQL, its bind values,
//! and the keyset that orders it. Each call to [`Paginator::fetch_page`]
//! returns a [`FetchPageBuilder`] that resolves to one [`Page`].
//!
//! # How It Works
//!
//! ```text
//! token ──decode──▶ last values ──▶ WHERE (after condition)
//!                                   ORDER BY keyset
//!                                   LIMIT page_size + 1   ──▶ executor (once)
//!
//! rows > page_size ? truncate, extract keys from last row ──encode──▶ next token
//! ```
//!
//! The extra row is a sentinel: if it comes back, another page exists.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use keyset_core::{SortKey, Value, token, validate_sort_keys};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PageConfig;
use crate::executor::QueryExecutor;
use crate::query::{BaseQuery, build_paginated_query};
use crate::{Error, Result};

/// One page of keyset-paginated results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
   /// Rows in keyset order
   pub rows: Vec<R>,
   /// Token for the following page, or `None` when this is the last page.
   pub next_token: Option<String>,
   /// Whether rows remain after this page
   pub has_more: bool,
}

impl<R> Page<R> {
   /// The next token, with the last page reported as `""`.
   pub fn next_token_str(&self) -> &str {
      self.next_token.as_deref().unwrap_or_default()
   }
}

/// A reusable paginated query over rows of type `R`.
pub struct Paginator<R> {
   query: String,
   values: Vec<Value>,
   sort_keys: Vec<SortKey<R>>,
   config: PageConfig,
}

impl<R> Paginator<R> {
   /// Create a paginator, validating the base query and keyset up front.
   ///
   /// The base query must not carry its own top-level `ORDER BY` or `LIMIT`.
   /// Sort key expressions must name columns of the base query's result.
   pub fn new(query: impl Into<String>, sort_keys: Vec<SortKey<R>>) -> Result<Self> {
      let query = query.into();
      BaseQuery::parse(&query)?;
      validate_sort_keys(&sort_keys)?;

      Ok(Self {
         query,
         values: Vec::new(),
         sort_keys,
         config: PageConfig::default(),
      })
   }

   /// Bind values for the base query's own `$1`, `$2`, … placeholders.
   pub fn bind(mut self, values: Vec<Value>) -> Self {
      self.values = values;
      self
   }

   pub fn with_config(mut self, config: PageConfig) -> Self {
      self.config = config;
      self
   }

   pub fn sort_keys(&self) -> &[SortKey<R>] {
      &self.sort_keys
   }

   /// Start building a page request. `page_size == 0` fetches every row.
   pub fn fetch_page<'a, E>(&'a self, executor: &'a E, page_size: usize) -> FetchPageBuilder<'a, R, E>
   where
      E: QueryExecutor<R> + ?Sized,
   {
      FetchPageBuilder {
         paginator: self,
         executor,
         page_size,
         token: None,
      }
   }

   /// Encode the token that resumes iteration after `row`.
   pub fn token_after(&self, row: &R) -> Result<String> {
      let mut values = Vec::with_capacity(self.sort_keys.len());
      for key in &self.sort_keys {
         let value = key
            .extract(row)
            .ok_or_else(|| Error::CursorColumnNotFound {
               column: key.expression().to_string(),
            })?;
         values.push(value);
      }
      Ok(token::encode(&values)?)
   }

   fn decode_token(&self, token: &str) -> Result<Vec<Value>> {
      let values = token::decode(token).inspect_err(|e| warn!(error = %e, "Rejected page token"))?;

      if values.len() != self.sort_keys.len() {
         warn!(
            token_len = values.len(),
            keys_len = self.sort_keys.len(),
            "Page token does not match keyset"
         );
         return Err(Error::TokenArityMismatch {
            token_len: values.len(),
            keys_len: self.sort_keys.len(),
         });
      }

      Ok(values)
   }
}

impl<R> Clone for Paginator<R> {
   fn clone(&self) -> Self {
      Self {
         query: self.query.clone(),
         values: self.values.clone(),
         sort_keys: self.sort_keys.clone(),
         config: self.config.clone(),
      }
   }
}

impl<R> std::fmt::Debug for Paginator<R> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("Paginator")
         .field("query", &self.query)
         .field("values", &self.values)
         .field("sort_keys", &self.sort_keys)
         .field("config", &self.config)
         .finish()
   }
}

/// Builder for a single page request
pub struct FetchPageBuilder<'a, R, E: ?Sized> {
   paginator: &'a Paginator<R>,
   executor: &'a E,
   page_size: usize,
   token: Option<String>,
}

impl<'a, R, E> FetchPageBuilder<'a, R, E>
where
   R: Send,
   E: QueryExecutor<R> + ?Sized,
{
   /// Resume after the page that produced `token`.
   ///
   /// An empty string means "first page", so the `next_token_str()` of a
   /// previous page can be passed straight through.
   pub fn after(mut self, token: impl Into<String>) -> Self {
      let token = token.into();
      self.token = (!token.is_empty()).then_some(token);
      self
   }

   /// Execute the paginated query and return a page of results
   pub async fn execute(self) -> Result<Page<R>> {
      let paginator = self.paginator;
      paginator.config.check_page_size(self.page_size)?;

      let last_values = match self.token.as_deref() {
         Some(token) => Some(paginator.decode_token(token)?),
         None => None,
      };

      let statement = build_paginated_query(
         &paginator.query,
         &paginator.values,
         &paginator.sort_keys,
         last_values.as_deref(),
         self.page_size,
      )?;

      debug!(sql = %statement.sql, binds = statement.values.len(), "Executing paginated query");
      let mut rows = self.executor.fetch_all(statement).await?;

      let has_more = self.page_size > 0 && rows.len() > self.page_size;
      if has_more {
         rows.truncate(self.page_size);
      }

      let next_token = match rows.last() {
         Some(row) if has_more => Some(paginator.token_after(row)?),
         _ => None,
      };

      debug!(rows = rows.len(), has_more, "Fetched page");
      Ok(Page {
         rows,
         next_token,
         has_more,
      })
   }
}

impl<'a, R, E> IntoFuture for FetchPageBuilder<'a, R, E>
where
   R: Send + 'a,
   E: QueryExecutor<R> + ?Sized,
{
   type Output = Result<Page<R>>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Fetch one page in a single call.
///
/// `token` is the previous page's `next_token_str()`, or `""` for the first
/// page.
pub async fn paginate<R, E>(
   executor: &E,
   query: &str,
   sort_keys: Vec<SortKey<R>>,
   page_size: usize,
   token: &str,
) -> Result<Page<R>>
where
   R: Send,
   E: QueryExecutor<R> + ?Sized,
{
   let paginator = Paginator::new(query, sort_keys)?;
   paginator.fetch_page(executor, page_size).after(token).await
}
