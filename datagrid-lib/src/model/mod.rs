//! Typed models

mod collection;
mod record;
mod record_serde;
mod value;

pub use collection::*;
pub use record::*;
pub use value::*;
