//! Sort key descriptors and ORDER BY rendering.
//!
//! A [`SortKey`] declares one column of a composite order: the SQL expression
//! it sorts by, its [`Direction`], where it places NULLs, and how to read the
//! same column's value back out of a materialized row. The extractor is what
//! turns the last row of a page into the values stored in the next page token.
//!
//! # Example
//!
//! ```
//! use keyset_core::{SortKey, Value, build_order_by};
//!
//! struct Post {
//!    category: Option<String>,
//!    id: i64,
//! }
//!
//! let keyset = vec![
//!    SortKey::asc("category", |p: &Post| p.category.clone().into()).nulls_first(),
//!    SortKey::desc("id", |p: &Post| Value::from(p.id)),
//! ];
//!
//! assert_eq!(
//!    build_order_by(&keyset).unwrap(),
//!    r#"ORDER BY "category" ASC NULLS FIRST, "id" DESC NULLS LAST"#
//! );
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Value};

/// Sort direction for a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
   /// Ascending order (smallest first)
   Asc,
   /// Descending order (largest first)
   Desc,
}

impl Direction {
   /// Comparison operator selecting values that come after a boundary.
   pub(crate) fn after_operator(self) -> &'static str {
      match self {
         Direction::Asc => ">",
         Direction::Desc => "<",
      }
   }

   fn keyword(self) -> &'static str {
      match self {
         Direction::Asc => "ASC",
         Direction::Desc => "DESC",
      }
   }
}

/// Where NULLs sort relative to non-NULL values of the same column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NullPlacement {
   First,
   Last,
}

impl NullPlacement {
   fn keyword(self) -> &'static str {
      match self {
         NullPlacement::First => "NULLS FIRST",
         NullPlacement::Last => "NULLS LAST",
      }
   }
}

/// The SQL expression a sort key orders by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortExpression {
   /// A plain or dot-qualified column name. Validated and quoted on render.
   Column(String),
   /// A trusted SQL expression rendered verbatim inside parentheses.
   ///
   /// Never build one of these from user input.
   Raw(String),
}

impl SortExpression {
   pub fn column(name: impl Into<String>) -> Self {
      SortExpression::Column(name.into())
   }

   pub fn raw(sql: impl Into<String>) -> Self {
      SortExpression::Raw(sql.into())
   }

   /// The expression as written by the caller, before quoting.
   pub fn as_str(&self) -> &str {
      match self {
         SortExpression::Column(name) | SortExpression::Raw(name) => name,
      }
   }

   fn validate(&self) -> Result<()> {
      match self {
         SortExpression::Column(name) => validate_column_name(name),
         SortExpression::Raw(sql) if sql.trim().is_empty() => Err(Error::InvalidColumnName {
            name: sql.clone(),
         }),
         SortExpression::Raw(_) => Ok(()),
      }
   }

   /// SQL text for this expression, safe to interpolate once validated.
   pub(crate) fn render(&self) -> String {
      match self {
         SortExpression::Column(name) => name
            .split('.')
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join("."),
         SortExpression::Raw(sql) => format!("({})", sql.trim()),
      }
   }
}

impl From<&str> for SortExpression {
   fn from(name: &str) -> Self {
      SortExpression::column(name)
   }
}

impl From<String> for SortExpression {
   fn from(name: String) -> Self {
      SortExpression::Column(name)
   }
}

impl fmt::Display for SortExpression {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

type Extractor<R> = Arc<dyn Fn(&R) -> Option<Value> + Send + Sync>;

/// One column of a composite keyset order.
///
/// `R` is the materialized row type the extractor reads from. Sort keys are
/// immutable once built and cheap to clone.
pub struct SortKey<R> {
   expression: SortExpression,
   direction: Direction,
   nulls: NullPlacement,
   extractor: Extractor<R>,
}

impl<R> SortKey<R> {
   /// Create a sort key with an explicit direction and NULL placement.
   pub fn new<F>(
      expression: impl Into<SortExpression>,
      direction: Direction,
      nulls: NullPlacement,
      extractor: F,
   ) -> Self
   where
      F: Fn(&R) -> Value + Send + Sync + 'static,
   {
      Self::with_lookup(expression, direction, nulls, move |row| Some(extractor(row)))
   }

   /// Create a sort key whose extractor may fail to find the column.
   ///
   /// Used for dynamically shaped rows; a `None` from the lookup is reported
   /// as a missing column when the next page token is produced.
   pub fn with_lookup<F>(
      expression: impl Into<SortExpression>,
      direction: Direction,
      nulls: NullPlacement,
      lookup: F,
   ) -> Self
   where
      F: Fn(&R) -> Option<Value> + Send + Sync + 'static,
   {
      Self {
         expression: expression.into(),
         direction,
         nulls,
         extractor: Arc::new(lookup),
      }
   }

   /// Ascending sort key with NULLs last.
   pub fn asc<F>(expression: impl Into<SortExpression>, extractor: F) -> Self
   where
      F: Fn(&R) -> Value + Send + Sync + 'static,
   {
      Self::new(expression, Direction::Asc, NullPlacement::Last, extractor)
   }

   /// Descending sort key with NULLs last.
   pub fn desc<F>(expression: impl Into<SortExpression>, extractor: F) -> Self
   where
      F: Fn(&R) -> Value + Send + Sync + 'static,
   {
      Self::new(expression, Direction::Desc, NullPlacement::Last, extractor)
   }

   pub fn nulls_first(mut self) -> Self {
      self.nulls = NullPlacement::First;
      self
   }

   pub fn nulls_last(mut self) -> Self {
      self.nulls = NullPlacement::Last;
      self
   }

   pub fn expression(&self) -> &SortExpression {
      &self.expression
   }

   pub fn direction(&self) -> Direction {
      self.direction
   }

   pub fn nulls(&self) -> NullPlacement {
      self.nulls
   }

   /// Read this key's value from a row, or `None` if the row lacks the column.
   pub fn extract(&self, row: &R) -> Option<Value> {
      (self.extractor)(row)
   }
}

impl<R> Clone for SortKey<R> {
   fn clone(&self) -> Self {
      Self {
         expression: self.expression.clone(),
         direction: self.direction,
         nulls: self.nulls,
         extractor: Arc::clone(&self.extractor),
      }
   }
}

impl<R> fmt::Debug for SortKey<R> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("SortKey")
         .field("expression", &self.expression)
         .field("direction", &self.direction)
         .field("nulls", &self.nulls)
         .finish_non_exhaustive()
   }
}

/// Validate that an identifier segment list is safe for SQL interpolation.
///
/// Accepts `[a-zA-Z_][a-zA-Z0-9_]*` segments joined by single dots, which
/// covers plain columns and qualified names like `posts.id`.
fn validate_column_name(name: &str) -> Result<()> {
   let valid_segment = |segment: &str| {
      let mut chars = segment.chars();
      match chars.next() {
         Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
         }
         _ => false,
      }
   };

   if name.split('.').all(valid_segment) {
      Ok(())
   } else {
      Err(Error::InvalidColumnName {
         name: name.to_string(),
      })
   }
}

/// Quote an identifier with double quotes, doubling any embedded quote.
fn quote_identifier(name: &str) -> String {
   format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check that a keyset is usable: non-empty, valid names, no duplicates.
pub fn validate_sort_keys<R>(keys: &[SortKey<R>]) -> Result<()> {
   if keys.is_empty() {
      return Err(Error::EmptySortKeys);
   }

   let mut seen = HashSet::with_capacity(keys.len());
   for key in keys {
      key.expression.validate()?;
      if !seen.insert(key.expression.render()) {
         return Err(Error::DuplicateSortKey {
            expression: key.expression.to_string(),
         });
      }
   }

   Ok(())
}

/// Build the ORDER BY clause for a keyset, one entry per key in order.
pub fn build_order_by<R>(keys: &[SortKey<R>]) -> Result<String> {
   validate_sort_keys(keys)?;

   let parts: Vec<String> = keys
      .iter()
      .map(|k| {
         format!(
            "{} {} {}",
            k.expression.render(),
            k.direction.keyword(),
            k.nulls.keyword()
         )
      })
      .collect();

   Ok(format!("ORDER BY {}", parts.join(", ")))
}

#[cfg(test)]
mod tests {
   use super::*;

   fn key(name: &str) -> SortKey<()> {
      SortKey::asc(name, |_: &()| Value::Null)
   }

   // ─── validate_column_name ───

   #[test]
   fn column_name_valid_simple() {
      assert!(validate_column_name("id").is_ok());
      assert!(validate_column_name("_private").is_ok());
      assert!(validate_column_name("col_123").is_ok());
   }

   #[test]
   fn column_name_valid_qualified() {
      assert!(validate_column_name("posts.id").is_ok());
      assert!(validate_column_name("main.posts.id").is_ok());
   }

   #[test]
   fn column_name_rejects_injection() {
      assert!(validate_column_name("").is_err());
      assert!(validate_column_name("id; DROP TABLE posts --").is_err());
      assert!(validate_column_name("id)--").is_err());
      assert!(validate_column_name("1bad").is_err());
      assert!(validate_column_name("col name").is_err());
   }

   #[test]
   fn column_name_rejects_empty_segments() {
      assert!(validate_column_name("posts.").is_err());
      assert!(validate_column_name(".id").is_err());
      assert!(validate_column_name("posts..id").is_err());
   }

   // ─── render ───

   #[test]
   fn render_quotes_each_segment() {
      assert_eq!(SortExpression::column("id").render(), r#""id""#);
      assert_eq!(SortExpression::column("t.id").render(), r#""t"."id""#);
   }

   #[test]
   fn render_wraps_raw_expression() {
      assert_eq!(
         SortExpression::raw(" lower(title) ").render(),
         "(lower(title))"
      );
   }

   // ─── validate_sort_keys ───

   #[test]
   fn validate_rejects_empty_keyset() {
      let keys: Vec<SortKey<()>> = vec![];
      assert!(matches!(
         validate_sort_keys(&keys),
         Err(Error::EmptySortKeys)
      ));
   }

   #[test]
   fn validate_rejects_duplicate_expression() {
      let keys = vec![key("a"), key("b"), key("a")];
      assert!(matches!(
         validate_sort_keys(&keys),
         Err(Error::DuplicateSortKey { expression }) if expression == "a"
      ));
   }

   #[test]
   fn validate_rejects_blank_raw_expression() {
      let keys = vec![SortKey::asc(SortExpression::raw("  "), |_: &()| Value::Null)];
      assert!(matches!(
         validate_sort_keys(&keys),
         Err(Error::InvalidColumnName { .. })
      ));
   }

   #[test]
   fn validate_rejects_invalid_column() {
      let keys = vec![key("id; DROP TABLE posts --")];
      assert!(matches!(
         validate_sort_keys(&keys),
         Err(Error::InvalidColumnName { .. })
      ));
   }

   // ─── build_order_by ───

   #[test]
   fn order_by_mixed_directions_and_nulls() {
      let keys = vec![
         key("category").nulls_first(),
         SortKey::desc("score", |_: &()| Value::Null),
         SortKey::new("id", Direction::Asc, NullPlacement::Last, |_: &()| {
            Value::Null
         }),
      ];

      assert_eq!(
         build_order_by(&keys).unwrap(),
         r#"ORDER BY "category" ASC NULLS FIRST, "score" DESC NULLS LAST, "id" ASC NULLS LAST"#
      );
   }

   #[test]
   fn order_by_raw_expression() {
      let keys = vec![SortKey::desc(SortExpression::raw("length(title)"), |_: &()| {
         Value::Null
      })
      .nulls_first()];

      assert_eq!(
         build_order_by(&keys).unwrap(),
         "ORDER BY (length(title)) DESC NULLS FIRST"
      );
   }

   // ─── SortKey ───

   #[test]
   fn extract_reads_row() {
      let key = SortKey::asc("n", |row: &(i64, Option<i64>)| row.1.into());
      assert_eq!(key.extract(&(1, Some(7))), Some(Value::Integer(7)));
      assert_eq!(key.extract(&(1, None)), Some(Value::Null));
   }

   #[test]
   fn with_lookup_may_miss() {
      let key = SortKey::with_lookup("n", Direction::Asc, NullPlacement::Last, |_: &()| None);
      assert_eq!(key.extract(&()), None);
   }

   #[test]
   fn clone_shares_extractor() {
      let key = SortKey::desc("n", |row: &i64| Value::from(*row)).nulls_first();
      let copy = key.clone();
      assert_eq!(copy.extract(&3), Some(Value::Integer(3)));
      assert_eq!(copy.direction(), Direction::Desc);
      assert_eq!(copy.nulls(), NullPlacement::First);
   }

   #[test]
   fn direction_serializes_to_camel_case() {
      assert_eq!(serde_json::to_string(&Direction::Asc).unwrap(), "\"asc\"");
      assert_eq!(
         serde_json::to_string(&NullPlacement::Last).unwrap(),
         "\"last\""
      );
      let desc: Direction = serde_json::from_str("\"desc\"").unwrap();
      assert_eq!(desc, Direction::Desc);
   }
}
