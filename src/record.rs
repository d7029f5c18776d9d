//! Dynamically shaped rows and sort keys that read them by column name.

use std::ops::Deref;

use indexmap::IndexMap;
use keyset_core::{Direction, NullPlacement, SortKey, Value};
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Column, Decode, Row, TypeInfo, ValueRef};

/// A result row keyed by column name, in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(IndexMap<String, Value>);

impl Record {
   pub fn into_inner(self) -> IndexMap<String, Value> {
      self.0
   }
}

impl Deref for Record {
   type Target = IndexMap<String, Value>;

   fn deref(&self) -> &Self::Target {
      &self.0
   }
}

impl From<IndexMap<String, Value>> for Record {
   fn from(fields: IndexMap<String, Value>) -> Self {
      Self(fields)
   }
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for Record {
   fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
      let mut fields = IndexMap::with_capacity(row.columns().len());
      for (index, column) in row.columns().iter().enumerate() {
         let raw = row.try_get_raw(index)?;
         let value = decode_value(raw)
            .map_err(|source| sqlx::Error::ColumnDecode {
               index: column.name().to_string(),
               source,
            })?;
         fields.insert(column.name().to_string(), value);
      }
      Ok(Self(fields))
   }
}

/// Map a SQLite value to a keyset value by its storage class.
///
/// Dates stored as TEXT stay `Value::Text`; they compare correctly because the
/// token binds them back as the same text.
fn decode_value(raw: SqliteValueRef<'_>) -> Result<Value, sqlx::error::BoxDynError> {
   if raw.is_null() {
      return Ok(Value::Null);
   }

   let type_name = raw.type_info().name().to_string();
   match type_name.as_str() {
      "INTEGER" | "BOOLEAN" => Ok(Value::Integer(<i64 as Decode<sqlx::Sqlite>>::decode(raw)?)),
      "REAL" | "NUMERIC" => Ok(Value::Real(<f64 as Decode<sqlx::Sqlite>>::decode(raw)?)),
      "TEXT" | "DATE" | "TIME" | "DATETIME" => {
         Ok(Value::Text(<String as Decode<sqlx::Sqlite>>::decode(raw)?))
      }
      "BLOB" => Ok(Value::Blob(<Vec<u8> as Decode<sqlx::Sqlite>>::decode(raw)?)),
      other => Err(format!("unsupported datatype: {other}").into()),
   }
}

/// Result-set name for a possibly qualified column (`posts.id` → `id`).
fn result_column(column: &str) -> String {
   column.rsplit('.').next().unwrap_or(column).to_string()
}

fn record_key(column: &str, direction: Direction) -> SortKey<Record> {
   let name = result_column(column);
   SortKey::with_lookup(column, direction, NullPlacement::Last, move |row: &Record| {
      row.get(&name).cloned()
   })
}

/// Ascending, NULLs-last sort key over a [`Record`] column.
pub fn asc(column: &str) -> SortKey<Record> {
   record_key(column, Direction::Asc)
}

/// Descending, NULLs-last sort key over a [`Record`] column.
pub fn desc(column: &str) -> SortKey<Record> {
   record_key(column, Direction::Desc)
}

#[cfg(test)]
mod tests {
   use super::*;

   fn record(fields: &[(&str, Value)]) -> Record {
      fields
         .iter()
         .map(|(k, v)| (k.to_string(), v.clone()))
         .collect::<IndexMap<_, _>>()
         .into()
   }

   #[test]
   fn key_reads_named_column() {
      let row = record(&[("id", Value::Integer(4)), ("title", Value::Null)]);
      assert_eq!(asc("id").extract(&row), Some(Value::Integer(4)));
      assert_eq!(desc("title").extract(&row), Some(Value::Null));
   }

   #[test]
   fn key_reports_missing_column() {
      let row = record(&[("id", Value::Integer(4))]);
      assert_eq!(asc("score").extract(&row), None);
   }

   #[test]
   fn qualified_key_reads_unqualified_column() {
      let row = record(&[("id", Value::Integer(9))]);
      let key = asc("posts.id");
      assert_eq!(key.expression().as_str(), "posts.id");
      assert_eq!(key.extract(&row), Some(Value::Integer(9)));
   }

   #[test]
   fn record_keys_default_to_nulls_last() {
      assert_eq!(asc("a").nulls(), NullPlacement::Last);
      assert_eq!(desc("a").nulls_first().nulls(), NullPlacement::First);
   }
}
