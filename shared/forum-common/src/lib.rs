//! Forum Common Library
//!
//! Shared types used by the forum server and its clients.

pub mod types;

pub use types::*;
