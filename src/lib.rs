//! eardiff
//!
//! Compares two Java enterprise archives by content. Both archives are
//! flattened, nested WARs and JARs included, into `(path, CRC-32)`
//! fingerprints which are then diffed as multisets.
//!
//! The heavy lifting lives in the workspace crates:
//! - `eardiff-core`: fingerprint types and errors
//! - `eardiff-archive`: ZIP reading and recursive flattening
//! - `eardiff-diff`: the multiset differ and report rendering

pub mod compare;

pub use compare::{compare, Comparison, Outcome, Verdict};
