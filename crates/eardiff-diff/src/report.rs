//! Report rendering
//!
//! The text report lists every difference under fixed headings; the JSON
//! report carries the same content plus a summary block.

use std::fmt::{self, Write};
use std::str::FromStr;

use serde::Serialize;

use eardiff_core::Fingerprint;

use crate::result::{ChangedEntry, DiffResult, DiffSummary};

/// Output format for the comparison report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => f.write_str("text"),
            ReportFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render the plain text report
///
/// Changed entries are listed by path, entries unique to one side by their
/// full fingerprint.
pub fn render_text(result: &DiffResult) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "{} identical files found", result.identical.len());
    let _ = writeln!(out, "CHANGED:");
    for changed in &result.changed {
        let _ = writeln!(out, "{}", changed.path);
    }
    let _ = writeln!(out, "Only in EAR1:");
    for fp in &result.only_in_first {
        let _ = writeln!(out, "{}", fp);
    }
    let _ = writeln!(out, "Only in EAR2:");
    for fp in &result.only_in_second {
        let _ = writeln!(out, "{}", fp);
    }

    out
}

/// Serializable form of a comparison report
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Path of the first archive as given
    pub first: &'a str,
    /// Path of the second archive as given
    pub second: &'a str,
    pub summary: DiffSummary,
    /// Changed entries, identical ones are only counted
    pub changed: &'a [ChangedEntry],
    pub only_in_first: &'a [Fingerprint],
    pub only_in_second: &'a [Fingerprint],
}

impl<'a> JsonReport<'a> {
    /// Borrow the report contents from `result`
    pub fn new(first: &'a str, second: &'a str, result: &'a DiffResult) -> Self {
        Self {
            first,
            second,
            summary: result.summary(),
            changed: &result.changed,
            only_in_first: &result.only_in_first,
            only_in_second: &result.only_in_second,
        }
    }
}

/// Render the pretty-printed JSON report
pub fn render_json(first: &str, second: &str, result: &DiffResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::new(first, second, result))
}
