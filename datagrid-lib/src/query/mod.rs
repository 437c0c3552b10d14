//! Predicate, ordering and query types.
//!
//! The grid engine composes search and column filters into a [`Filter`] tree
//! and sort state into an [`OrderBy`]. In-memory datasources evaluate the tree
//! directly; queryable stores receive a [`Query`] and may render it with the
//! [`sql`] helpers.
//!
//! # Types
//!
//! - [`Filter`] - Predicate tree evaluated in memory or rendered to SQL
//! - [`OrderBy`] - Ordering specification, including numeric-string terms
//! - [`Query`] - Table, filter, ordering and limits handed to a store

mod builder;
mod filter;
mod order;
pub mod sql;

pub use builder::Query;
pub use filter::Filter;
pub use order::Direction;
pub use order::OrderBy;
pub use order::OrderTerm;
