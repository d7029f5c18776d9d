//! Base query inspection and paginated SQL composition.
//!
//! The caller's base query is treated as opaque SQL except for a shallow scan
//! of its top-level words (outside parentheses, quotes, and comments). That
//! scan is enough to reject clauses the pager must own (`ORDER BY`, `LIMIT`,
//! compound selects) and to find where a keyset condition can be spliced in
//! without changing the meaning of an existing `WHERE`.

use keyset_core::{SortKey, Value, build_after_condition, build_order_by};

use crate::executor::Statement;
use crate::{Error, Result};

/// A word (identifier or keyword) found at paren depth 0.
#[derive(Debug, Clone, Copy)]
struct Word<'a> {
   start: usize,
   end: usize,
   text: &'a str,
}

impl Word<'_> {
   fn is(&self, keyword: &str) -> bool {
      self.text.eq_ignore_ascii_case(keyword)
   }
}

/// Index just past the closing `close` byte, honoring doubled-quote escapes.
/// Unterminated sections run to the end of input.
fn skip_quoted(bytes: &[u8], open: usize, close: u8) -> usize {
   let mut i = open + 1;
   while i < bytes.len() {
      if bytes[i] == close {
         if close != b']' && bytes.get(i + 1) == Some(&close) {
            i += 2;
            continue;
         }
         return i + 1;
      }
      i += 1;
   }
   bytes.len()
}

fn is_word_start(b: u8) -> bool {
   b.is_ascii_alphabetic() || b == b'_'
}

fn is_word_byte(b: u8) -> bool {
   b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Collect the top-level words of a query in order.
fn top_level_words(query: &str) -> Vec<Word<'_>> {
   let bytes = query.as_bytes();
   let mut words = Vec::new();
   let mut depth: i32 = 0;
   let mut i = 0;

   while i < bytes.len() {
      match bytes[i] {
         b'(' => {
            depth += 1;
            i += 1;
         }
         b')' => {
            depth -= 1;
            i += 1;
         }
         b'\'' => i = skip_quoted(bytes, i, b'\''),
         b'"' => i = skip_quoted(bytes, i, b'"'),
         b'`' => i = skip_quoted(bytes, i, b'`'),
         b'[' => i = skip_quoted(bytes, i, b']'),
         b'-' if bytes.get(i + 1) == Some(&b'-') => {
            i = bytes[i..]
               .iter()
               .position(|&b| b == b'\n')
               .map_or(bytes.len(), |p| i + p);
         }
         b'/' if bytes.get(i + 1) == Some(&b'*') => {
            i = query[i + 2..]
               .find("*/")
               .map_or(bytes.len(), |p| i + 2 + p + 2);
         }
         b if is_word_start(b) => {
            let start = i;
            // `t.limit` names a column, not a clause
            let qualified = i > 0 && bytes[i - 1] == b'.';
            while i < bytes.len() && is_word_byte(bytes[i]) {
               i += 1;
            }
            if depth == 0 && !qualified {
               words.push(Word {
                  start,
                  end: i,
                  text: &query[start..i],
               });
            }
         }
         // Skip the rest of numeric literals and `$N` / `?N` parameters so
         // their tails are not mistaken for words.
         b if b.is_ascii_digit() || b == b'$' || b == b'?' => {
            i += 1;
            while i < bytes.len() && is_word_byte(bytes[i]) {
               i += 1;
            }
         }
         _ => i += 1,
      }
   }

   words
}

/// Where a keyset condition goes inside a validated base query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BaseQuery<'a> {
   sql: &'a str,
   /// Byte offset just past a top-level `WHERE` keyword.
   where_end: Option<usize>,
   /// Byte offset of the first top-level `GROUP`, `HAVING`, or `WINDOW`.
   tail_start: Option<usize>,
}

impl<'a> BaseQuery<'a> {
   /// Validate a base query and locate its splice points.
   ///
   /// Rejects top-level `ORDER BY`, `LIMIT`, `OFFSET`, and compound selects
   /// (`UNION`, `INTERSECT`, `EXCEPT`); the pager appends its own ordering and
   /// limit. Wrap such queries in a subquery instead. A trailing `;` is
   /// dropped.
   pub(crate) fn parse(query: &'a str) -> Result<Self> {
      let sql = query.trim_end().trim_end_matches(';').trim_end();
      let words = top_level_words(sql);

      let mut where_end = None;
      let mut tail_start = None;
      let mut seen_from = false;

      for (idx, word) in words.iter().enumerate() {
         let next_is_by = words.get(idx + 1).is_some_and(|w| w.is("BY"));
         // `WINDOW` is only a fallback keyword; as a clause it reads `WINDOW name AS (...)`
         let starts_window = seen_from
            && word.is("WINDOW")
            && words.get(idx + 2).is_some_and(|w| w.is("AS"));
         if (word.is("ORDER") && next_is_by)
            || word.is("LIMIT")
            || word.is("OFFSET")
            || word.is("UNION")
            || word.is("INTERSECT")
            || word.is("EXCEPT")
         {
            return Err(Error::InvalidPaginationQuery);
         }

         if word.is("FROM") {
            seen_from = true;
         } else if word.is("WHERE") && where_end.is_none() && tail_start.is_none() {
            where_end = Some(word.end);
         } else if (word.is("GROUP") && next_is_by) || word.is("HAVING") || starts_window {
            tail_start.get_or_insert(word.start);
         }
      }

      Ok(Self {
         sql,
         where_end,
         tail_start,
      })
   }

   /// Base query with `condition` ANDed into its top-level filter.
   ///
   /// An existing `WHERE` body is parenthesized first so a top-level `OR` in
   /// it cannot swallow the condition.
   pub(crate) fn with_condition(&self, condition: &str) -> String {
      let tail_start = self.tail_start.unwrap_or(self.sql.len());
      let (head, tail) = self.sql.split_at(tail_start);
      let tail = tail.trim();

      let filtered = match self.where_end {
         Some(where_end) => {
            let (select, body) = head.split_at(where_end);
            format!("{} ({}) AND ({})", select, body.trim(), condition)
         }
         None => format!("{} WHERE ({})", head.trim_end(), condition),
      };

      if tail.is_empty() {
         filtered
      } else {
         format!("{filtered} {tail}")
      }
   }

   pub(crate) fn sql(&self) -> &str {
      self.sql
   }
}

/// Build the complete paginated statement.
///
/// `user_values` are the base query's own bind values; keyset placeholders
/// are numbered after them and their values appended. `page_size == 0`
/// fetches every matching row; otherwise one row beyond the page is
/// requested so the caller can tell whether another page exists.
pub(crate) fn build_paginated_query<R>(
   base_query: &str,
   user_values: &[Value],
   keys: &[SortKey<R>],
   last_values: Option<&[Value]>,
   page_size: usize,
) -> Result<Statement> {
   let base = BaseQuery::parse(base_query)?;
   let order_by = build_order_by(keys)?;

   let mut values = user_values.to_vec();
   let filtered = match last_values {
      Some(last_values) => {
         let condition = build_after_condition(keys, last_values, user_values.len())?;
         values.extend(condition.values);
         base.with_condition(&condition.sql)
      }
      None => base.sql().to_string(),
   };

   let mut sql = format!("{filtered} {order_by}");
   if page_size > 0 {
      let limit = page_size
         .checked_add(1)
         .and_then(|limit| i64::try_from(limit).ok())
         .ok_or(Error::InvalidPageSize)?;
      sql = format!("{sql} LIMIT {limit}");
   }

   Ok(Statement { sql, values })
}
