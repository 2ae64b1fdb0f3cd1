//! One comparison run: flatten both archives, then diff them

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eardiff_archive::{flatten_file, ScanOptions};
use eardiff_core::{Error, Result};
use eardiff_diff::{diff, DiffResult};

/// How a comparison run ended
#[derive(Debug)]
pub enum Outcome {
    /// Both archives were scanned and diffed
    Completed(DiffResult),
    /// A scan aborted; no diff was computed
    Incomplete(Error),
}

/// Final verdict of a comparison run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Identical,
    Different,
    Incomplete,
}

impl Verdict {
    /// Process exit status for this verdict
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Identical => 0,
            Verdict::Different => 1,
            Verdict::Incomplete => 2,
        }
    }
}

/// Result of comparing two archive files
#[derive(Debug)]
pub struct Comparison {
    /// First archive, as passed to [`compare`]
    pub first: PathBuf,
    /// Second archive, as passed to [`compare`]
    pub second: PathBuf,
    /// Diff result or the error that stopped the run
    pub outcome: Outcome,
    /// Wall time of both scans plus the diff
    pub elapsed: Duration,
}

impl Comparison {
    /// Identical, different, or incomplete
    pub fn verdict(&self) -> Verdict {
        match &self.outcome {
            Outcome::Completed(result) if result.archives_equal() => Verdict::Identical,
            Outcome::Completed(_) => Verdict::Different,
            Outcome::Incomplete(_) => Verdict::Incomplete,
        }
    }

    /// The diff, when both scans completed
    pub fn result(&self) -> Option<&DiffResult> {
        match &self.outcome {
            Outcome::Completed(result) => Some(result),
            Outcome::Incomplete(_) => None,
        }
    }

    /// The scan error, when the run did not complete
    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            Outcome::Completed(_) => None,
            Outcome::Incomplete(error) => Some(error),
        }
    }

    /// Closing line printed after the report
    pub fn status_line(&self) -> String {
        let what = match self.verdict() {
            Verdict::Identical => "no differences found",
            Verdict::Different => "differences found",
            Verdict::Incomplete => "comparison incomplete",
        };
        format!("Done - {} in {} ms.", what, self.elapsed.as_millis())
    }
}

/// Flatten `first`, then `second`, then diff the two trees
///
/// Never fails: a scan error is captured as [`Outcome::Incomplete`].
pub fn compare(first: &Path, second: &Path, options: &ScanOptions) -> Comparison {
    let start = Instant::now();

    tracing::info!(
        first = %first.display(),
        second = %second.display(),
        extraction = %options.extraction,
        "Comparing archives"
    );

    let outcome = match scan_both(first, second, options) {
        Ok(result) => Outcome::Completed(result),
        Err(error) => {
            tracing::error!(error = %error, kind = %error.kind(), "Comparison incomplete");
            Outcome::Incomplete(error)
        }
    };

    Comparison {
        first: first.to_path_buf(),
        second: second.to_path_buf(),
        outcome,
        elapsed: start.elapsed(),
    }
}

fn scan_both(first: &Path, second: &Path, options: &ScanOptions) -> Result<DiffResult> {
    let first_tree = flatten_file(first, options)?;
    let second_tree = flatten_file(second, options)?;
    Ok(diff(&first_tree.fingerprints, &second_tree.fingerprints))
}
