//! eardiff Core Library
//!
//! This crate provides the fingerprint types, the textual fingerprint
//! encoding, and the error handling shared across all eardiff components.

pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, Result, ResultExt};
pub use types::*;
