//! "Strictly after" predicates for keyset pagination.
//!
//! Given a keyset and the values of the last row on the previous page, the
//! builder produces a WHERE fragment that matches exactly the rows sorting
//! after that row. Each key may be ascending or descending and may place NULLs
//! first or last, so the familiar row-value comparison `(a, b) > (?, ?)` is not
//! enough: SQL comparisons against NULL are never true.
//!
//! # How It Works
//!
//! For one key `c` with last value `v`, two fragments are defined:
//!
//! - **advance**: rows strictly past `v` on `c` alone
//!   - `v` NULL, NULLs last: none (NULL is the final position)
//!   - `v` NULL, NULLs first: `c IS NOT NULL`
//!   - `v` set, NULLs last: `(c > $n OR c IS NULL)`
//!   - `v` set, NULLs first: `c > $n`
//! - **tie**: `c = $n`, or `c IS NULL` when `v` is NULL
//!
//! (`<` replaces `>` for descending keys.) The composite predicate expands
//! most-significant key first:
//!
//! ```text
//! after([c, rest..]) = advance(c) OR (tie(c) AND after(rest..))
//! after([c])         = advance(c)
//! ```
//!
//! When `advance` has no rows the OR arm is dropped, and for the last key it
//! becomes the unsatisfiable `(c IS NULL AND c IS NOT NULL)`.

use tracing::trace;

use crate::sort_key::validate_sort_keys;
use crate::{Error, Result, SortKey, Value};

/// A SQL boolean fragment plus the values for its placeholders.
///
/// Placeholders are `$N` and appear in `sql` in the same order as `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
   pub sql: String,
   pub values: Vec<Value>,
}

impl Condition {
   /// Count of `$N` placeholders in the SQL text.
   pub fn placeholder_count(&self) -> usize {
      let bytes = self.sql.as_bytes();
      bytes
         .windows(2)
         .filter(|w| w[0] == b'$' && w[1].is_ascii_digit())
         .count()
   }
}

/// Hands out `$N` placeholders and records the value bound to each.
struct Binder {
   next: usize,
   values: Vec<Value>,
}

impl Binder {
   fn new(param_offset: usize) -> Self {
      Self {
         next: param_offset + 1,
         values: Vec::new(),
      }
   }

   fn bind(&mut self, value: &Value) -> String {
      let placeholder = format!("${}", self.next);
      self.next += 1;
      self.values.push(value.clone());
      placeholder
   }
}

/// Build the predicate selecting rows strictly after `last_values`.
///
/// `param_offset` is the number of bind values that precede the condition in
/// the final statement. Placeholders are numbered from `param_offset + 1` so
/// they never collide with a base query's own `$1`, `$2`, … parameters.
pub fn build_after_condition<R>(
   keys: &[SortKey<R>],
   last_values: &[Value],
   param_offset: usize,
) -> Result<Condition> {
   validate_sort_keys(keys)?;
   if keys.len() != last_values.len() {
      return Err(Error::ValueCountMismatch {
         values_len: last_values.len(),
         keys_len: keys.len(),
      });
   }

   let mut binder = Binder::new(param_offset);
   let sql = after(keys, last_values, &mut binder);
   trace!(keys = keys.len(), binds = binder.values.len(), "Built keyset condition");

   Ok(Condition {
      sql,
      values: binder.values,
   })
}

// `keys` and `values` are non-empty and of equal length.
fn after<R>(keys: &[SortKey<R>], values: &[Value], binder: &mut Binder) -> String {
   let key = &keys[0];
   let value = &values[0];
   let column = key.expression().render();

   let advance = advance(&column, key, value, binder);

   if keys.len() == 1 {
      return advance.unwrap_or_else(|| format!("({column} IS NULL AND {column} IS NOT NULL)"));
   }

   let tie = tie(&column, value, binder);
   let rest = after(&keys[1..], &values[1..], binder);

   match advance {
      Some(advance) => format!("({advance} OR ({tie} AND {rest}))"),
      None => format!("({tie} AND {rest})"),
   }
}

/// Rows strictly past `value` on this column alone, or `None` if there are none.
fn advance<R>(column: &str, key: &SortKey<R>, value: &Value, binder: &mut Binder) -> Option<String> {
   use crate::NullPlacement::{First, Last};

   let op = key.direction().after_operator();
   match (value.is_null(), key.nulls()) {
      (true, Last) => None,
      (true, First) => Some(format!("{column} IS NOT NULL")),
      (false, Last) => Some(format!(
         "({column} {op} {} OR {column} IS NULL)",
         binder.bind(value)
      )),
      (false, First) => Some(format!("{column} {op} {}", binder.bind(value))),
   }
}

/// Rows equal to `value` on this column, NULL included.
fn tie(column: &str, value: &Value, binder: &mut Binder) -> String {
   if value.is_null() {
      format!("{column} IS NULL")
   } else {
      format!("{column} = {}", binder.bind(value))
   }
}
