//! Core definitions (error type, result alias, verification macros and version
//! identifiers), relied upon by all quarry-* crates.

pub mod error;
pub mod macros;
pub mod result;
pub mod version;

pub use result::Result;
