//! Shared Types

mod actor;

pub use actor::*;
