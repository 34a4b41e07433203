//! Platform helpers: fixed paths and path expansion.

pub mod path;
