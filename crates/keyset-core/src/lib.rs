//! # keyset-core
//!
//! Storage-agnostic building blocks for keyset (seek) pagination over a
//! composite order where every column chooses its own direction and NULL
//! placement.
//!
//! ## Core Types
//!
//! - **[`SortKey`]**: one column of the order, with an extractor that reads its
//!   value from a materialized row
//! - **[`Value`]**: nullable scalar carried by predicates and page tokens
//! - **[`Condition`]**: SQL fragment plus its bind values
//! - **[`PageToken`]**: opaque, URL-safe encoding of the last row's key values
//!
//! ## Operations
//!
//! - [`build_after_condition`]: predicate for rows strictly after a given row
//! - [`build_order_by`]: matching `ORDER BY` clause
//! - [`token::encode`] / [`token::decode`]: page token codec

mod condition;
mod error;
mod sort_key;
pub mod token;
mod value;

pub use condition::{Condition, build_after_condition};
pub use error::{Error, Result};
pub use sort_key::{
   Direction, NullPlacement, SortExpression, SortKey, build_order_by, validate_sort_keys,
};
pub use token::PageToken;
pub use value::Value;
