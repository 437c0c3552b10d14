//! Grid configuration and collaborator-owned state.
//!
//! - [`Column`] and [`RelationSearch`] - what the grid shows and searches
//! - [`FilterSpec`] / [`FilterSet`] - column filters from filter widgets
//! - [`GridState`] - search, filters, sort and page position
//! - [`GridConfig`] - settings shared by every run

mod column;
mod config;
mod filter_spec;
mod state;

pub use column::*;
pub use config::*;
pub use filter_spec::*;
pub use state::*;
