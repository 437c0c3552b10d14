//! Grid data resolution
//!
//! The pieces a [`Pipeline`] composes: datasource classification, the
//! filter engine, sort resolution, pagination, computed columns and inline
//! update outcomes. Each piece is usable on its own.

mod datasource;
mod filter;
mod paginate;
mod pipeline;
mod sort;
mod transform;
mod update;

pub use datasource::*;
pub use filter::*;
pub use paginate::*;
pub use pipeline::*;
pub use sort::*;
pub use transform::*;
pub use update::*;
