//! Multiset three-way diff
//!
//! ```text
//!  first ──┐                     ┌── identical
//!          ├─ full fingerprint ──┤
//!  second ─┘   intersection      └── leftovers ─┬─ path-only ─┬── changed
//!                                               │ intersection ├── only_in_first
//!                                               │              └── only_in_second
//! ```
//!
//! Every pass is a counting-map intersection, so `N` copies on one side and
//! `M` on the other contribute `min(N, M)` matches and the whole diff runs in
//! linear time.

use std::collections::{HashMap, VecDeque};

use eardiff_core::{Fingerprint, QualifiedPath};

use crate::result::{ChangedEntry, DiffResult};

/// Compare two fingerprint multisets
pub fn diff(first: &[Fingerprint], second: &[Fingerprint]) -> DiffResult {
    let mut result = DiffResult::default();

    // Identical pass
    let mut available = count(second);
    let mut matched: HashMap<&Fingerprint, usize> = HashMap::new();
    let mut first_rest = Vec::new();

    for fp in first {
        match available.get_mut(fp) {
            Some(n) if *n > 0 => {
                *n -= 1;
                *matched.entry(fp).or_insert(0) += 1;
                result.identical.push(fp.clone());
            }
            _ => first_rest.push(fp),
        }
    }

    let second_rest: Vec<&Fingerprint> = second
        .iter()
        .filter(|fp| match matched.get_mut(*fp) {
            Some(n) if *n > 0 => {
                *n -= 1;
                false
            }
            _ => true,
        })
        .collect();

    // Changed pass, on path-only keys
    let mut by_path: HashMap<&QualifiedPath, VecDeque<usize>> = HashMap::new();
    for (idx, fp) in second_rest.iter().enumerate() {
        by_path.entry(&fp.path).or_default().push_back(idx);
    }

    let mut consumed = vec![false; second_rest.len()];
    for fp in first_rest {
        match by_path.get_mut(&fp.path).and_then(VecDeque::pop_front) {
            Some(idx) => {
                consumed[idx] = true;
                result.changed.push(ChangedEntry {
                    path: fp.path.clone(),
                    first_checksum: fp.checksum,
                    second_checksum: second_rest[idx].checksum,
                });
            }
            None => result.only_in_first.push(fp.clone()),
        }
    }

    result.only_in_second = second_rest
        .into_iter()
        .zip(consumed)
        .filter(|(_, used)| !used)
        .map(|(fp, _)| fp.clone())
        .collect();

    tracing::debug!(
        identical = result.identical.len(),
        changed = result.changed.len(),
        only_in_first = result.only_in_first.len(),
        only_in_second = result.only_in_second.len(),
        "Diff complete"
    );

    result
}

fn count(fingerprints: &[Fingerprint]) -> HashMap<&Fingerprint, usize> {
    let mut counts = HashMap::with_capacity(fingerprints.len());
    for fp in fingerprints {
        *counts.entry(fp).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(path: &str, checksum: u32) -> Fingerprint {
        Fingerprint::new(path.parse().unwrap(), checksum)
    }

    #[test]
    fn test_scenario() {
        let a = vec![fp("x.txt", 1), fp("y.txt", 2)];
        let b = vec![fp("x.txt", 1), fp("y.txt", 3), fp("z.txt", 4)];

        let result = diff(&a, &b);
        assert_eq!(result.identical, vec![fp("x.txt", 1)]);
        assert_eq!(
            result.changed,
            vec![ChangedEntry {
                path: "y.txt".parse().unwrap(),
                first_checksum: 2,
                second_checksum: 3,
            }]
        );
        assert!(result.only_in_first.is_empty());
        assert_eq!(result.only_in_second, vec![fp("z.txt", 4)]);
        assert!(!result.archives_equal());
    }

    #[test]
    fn test_changed_not_reported_as_added_and_removed() {
        let result = diff(&[fp("a.txt", 111)], &[fp("a.txt", 222)]);
        assert_eq!(result.changed.len(), 1);
        assert!(result.only_in_first.is_empty());
        assert!(result.only_in_second.is_empty());
    }

    #[test]
    fn test_duplicates_against_self() {
        let a = vec![fp("dup.txt", 7), fp("dup.txt", 7)];
        let result = diff(&a, &a);
        assert_eq!(result.identical.len(), 2);
        assert!(result.archives_equal());
    }

    #[test]
    fn test_duplicates_min_count() {
        let a = vec![fp("dup.txt", 7), fp("dup.txt", 7), fp("dup.txt", 7)];
        let b = vec![fp("dup.txt", 7)];

        let result = diff(&a, &b);
        assert_eq!(result.identical.len(), 1);
        assert_eq!(result.only_in_first, vec![fp("dup.txt", 7), fp("dup.txt", 7)]);
        assert!(result.only_in_second.is_empty());
    }

    #[test]
    fn test_changed_pairs_in_occurrence_order() {
        let a = vec![fp("lib:a", 1), fp("lib:a", 2), fp("lib:a", 3)];
        let b = vec![fp("lib:a", 3), fp("lib:a", 8), fp("lib:a", 9)];

        let result = diff(&a, &b);
        assert_eq!(result.identical, vec![fp("lib:a", 3)]);
        let pairs: Vec<_> = result
            .changed
            .iter()
            .map(|c| (c.first_checksum, c.second_checksum))
            .collect();
        assert_eq!(pairs, [(1, 8), (2, 9)]);
    }

    #[test]
    fn test_only_in_lists_keep_their_side_order() {
        let a = vec![fp("c", 1), fp("a", 1), fp("b", 1)];
        let b = vec![fp("z", 1), fp("x", 1), fp("y", 1)];

        let result = diff(&a, &b);
        assert_eq!(result.only_in_first, a);
        assert_eq!(result.only_in_second, b);
    }

    #[test]
    fn test_nested_paths_are_distinct_from_flat_lookalikes() {
        let nested = Fingerprint::new(QualifiedPath::new(["a.jar", "b.txt"]), 5);
        let flat = Fingerprint::new(QualifiedPath::new(["a.jar:b.txt"]), 5);

        let result = diff(&[nested], &[flat]);
        assert!(result.identical.is_empty());
        assert!(result.changed.is_empty());
        assert_eq!(result.only_in_first.len(), 1);
        assert_eq!(result.only_in_second.len(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(diff(&[], &[]).archives_equal());
        assert_eq!(diff(&[fp("a", 1)], &[]).only_in_first.len(), 1);
        assert_eq!(diff(&[], &[fp("a", 1)]).only_in_second.len(), 1);
    }
}
