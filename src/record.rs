//! Records and the parameter mappings extracted from them.
//!
//! A record is any value that can expose its fields by name: either a type
//! implementing [`Record`] directly, or any `serde::Serialize` type passed
//! through [`extract`].

pub mod extract;
pub mod params;

pub use extract::{extract, from_json, Record};
pub use params::ParameterMapping;
