//! Diff result types

use serde::Serialize;

use eardiff_core::{Fingerprint, QualifiedPath};

/// An entry present in both trees under the same path with different checksums
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedEntry {
    /// Path shared by both entries
    pub path: QualifiedPath,
    /// CRC-32 in the first archive
    pub first_checksum: u32,
    /// CRC-32 in the second archive
    pub second_checksum: u32,
}

/// Outcome of comparing two fingerprint multisets
///
/// `identical`, `changed` and `only_in_first` follow the first tree's order,
/// `only_in_second` follows the second tree's order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// Same path and checksum on both sides
    pub identical: Vec<Fingerprint>,
    /// Same path, different checksum
    pub changed: Vec<ChangedEntry>,
    /// Paths with no counterpart in the second archive
    pub only_in_first: Vec<Fingerprint>,
    /// Paths with no counterpart in the first archive
    pub only_in_second: Vec<Fingerprint>,
}

/// Aggregate counts of a [`DiffResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Length of [`DiffResult::identical`]
    pub identical: usize,
    /// Length of [`DiffResult::changed`]
    pub changed: usize,
    /// Length of [`DiffResult::only_in_first`]
    pub only_in_first: usize,
    /// Length of [`DiffResult::only_in_second`]
    pub only_in_second: usize,
    /// See [`DiffResult::archives_equal`]
    pub archives_equal: bool,
}

impl DiffResult {
    /// True when nothing changed and nothing is unique to either side
    pub fn archives_equal(&self) -> bool {
        self.changed.is_empty() && self.only_in_first.is_empty() && self.only_in_second.is_empty()
    }

    /// Number of differing entries across all three difference lists
    pub fn difference_count(&self) -> usize {
        self.changed.len() + self.only_in_first.len() + self.only_in_second.len()
    }

    /// Counts of every list plus the verdict
    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            identical: self.identical.len(),
            changed: self.changed.len(),
            only_in_first: self.only_in_first.len(),
            only_in_second: self.only_in_second.len(),
            archives_equal: self.archives_equal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_equal() {
        let result = DiffResult::default();
        assert!(result.archives_equal());
        assert_eq!(result.difference_count(), 0);
    }

    #[test]
    fn test_identical_does_not_affect_equality() {
        let result = DiffResult {
            identical: vec![Fingerprint::new(QualifiedPath::new(["a.txt"]), 1)],
            ..DiffResult::default()
        };
        assert!(result.archives_equal());
        assert_eq!(result.summary().identical, 1);
    }

    #[test]
    fn test_summary_counts() {
        let result = DiffResult {
            identical: Vec::new(),
            changed: vec![ChangedEntry {
                path: QualifiedPath::new(["y.txt"]),
                first_checksum: 2,
                second_checksum: 3,
            }],
            only_in_first: Vec::new(),
            only_in_second: vec![Fingerprint::new(QualifiedPath::new(["z.txt"]), 4)],
        };

        let summary = result.summary();
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.only_in_second, 1);
        assert!(!summary.archives_equal);
        assert_eq!(result.difference_count(), 2);
    }
}
