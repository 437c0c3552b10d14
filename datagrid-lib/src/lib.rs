//! Tabular data grid engine
//!
//! Turns a datasource (in-memory records or a queryable store) plus the
//! grid's search, filter, sort and page state into one page of records and
//! the identifiers of every matching record. Materialized in-memory
//! collections are cached per grid identity.

pub mod cache;
pub mod engine;
pub mod error;
pub mod grid;
pub mod model;
pub mod query;
pub mod response;
pub mod store;

pub use engine::Grid;
pub use engine::Pipeline;
pub use error::Error;
pub use response::CacheStatus;
pub use response::Response;
