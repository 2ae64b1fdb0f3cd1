//! eardiff-diff
//!
//! Three-way multiset comparison of two flattened fingerprint lists, and
//! rendering of the result as a text or JSON report.
//!
//! ```rust,ignore
//! use eardiff_diff::{diff, render_text};
//!
//! let result = diff(&first, &second);
//! print!("{}", render_text(&result));
//! ```

pub mod differ;
pub mod report;
pub mod result;

pub use differ::diff;
pub use report::{render_json, render_text, JsonReport, ReportFormat};
pub use result::{ChangedEntry, DiffResult, DiffSummary};
