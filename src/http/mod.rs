//! HTTP protocol layer module
//!
//! Protocol-level helpers (content types, validators, range parsing,
//! response builders) decoupled from the file-serving logic.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_internal_error, build_method_not_allowed, build_not_found, build_not_modified,
    build_range_not_satisfiable,
};
