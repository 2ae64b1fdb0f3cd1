//! eardiff-archive
//!
//! Reads ZIP-based Java archives (EAR, WAR, JAR) and flattens them, nested
//! archives included, into ordered lists of content fingerprints.
//!
//! # Layout
//!
//! | Module      | Purpose |
//! |-------------|---------|
//! | [`zip`]     | Central directory parsing and verified entry extraction |
//! | [`source`]  | Opening top-level archive files (buffered or memory mapped) |
//! | [`options`] | Nested extensions, depth limit, extraction strategy |
//! | [`flatten`] | Recursive descent producing [`Fingerprint`]s |
//! | [`logging`] | Tracing subscriber setup and scan log macros |
//!
//! # Example
//!
//! ```rust,ignore
//! use eardiff_archive::{flatten_file, ScanOptions};
//!
//! let tree = flatten_file("app.ear".as_ref(), &ScanOptions::default())?;
//! for fingerprint in tree.iter() {
//!     println!("{}", fingerprint);
//! }
//! ```

pub mod flatten;
pub mod logging;
pub mod options;
pub mod source;
pub mod zip;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod fixture;

pub use eardiff_core::{Error, ErrorKind, Fingerprint, QualifiedPath, Result};
pub use flatten::{flatten_file, ArchiveTree, Flattener};
pub use options::{ExtractionStrategy, ScanOptions, DEFAULT_NESTED_EXTENSIONS};
pub use source::FileSource;
pub use zip::{CompressionMethod, ZipArchive, ZipCompression, ZipEntry};
