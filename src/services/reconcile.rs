// src/services/reconcile.rs

use std::collections::HashSet;
use std::hash::Hash;

/// Operações mínimas para levar `current` até `desired`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<T> {
    pub to_delete: Vec<T>,
    pub to_create: Vec<T>,
}

impl<T> Diff<T> {
    pub fn is_noop(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty()
    }
}

/// Diferença de conjuntos. Duplicatas colapsam; a saída segue a ordem de primeira aparição.
pub fn diff<T>(current: &[T], desired: &[T]) -> Diff<T>
where
    T: Copy + Eq + Hash,
{
    let current_set: HashSet<T> = current.iter().copied().collect();
    let desired_set: HashSet<T> = desired.iter().copied().collect();

    let mut seen = HashSet::new();
    let to_delete = current
        .iter()
        .copied()
        .filter(|id| !desired_set.contains(id) && seen.insert(*id))
        .collect();

    let mut seen = HashSet::new();
    let to_create = desired
        .iter()
        .copied()
        .filter(|id| !current_set.contains(id) && seen.insert(*id))
        .collect();

    Diff { to_delete, to_create }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_a_with_c() {
        let d = diff(&['A', 'B'], &['B', 'C']);
        assert_eq!(d.to_delete, vec!['A']);
        assert_eq!(d.to_create, vec!['C']);
    }

    #[test]
    fn equal_sets_are_noop() {
        let d = diff(&[1, 2, 3], &[3, 1, 2]);
        assert!(d.is_noop());
    }

    #[test]
    fn empty_desired_removes_everything() {
        let d = diff(&[1, 2], &[]);
        assert_eq!(d.to_delete, vec![1, 2]);
        assert!(d.to_create.is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let d = diff(&[], &[7, 7, 8, 7]);
        assert_eq!(d.to_create, vec![7, 8]);
    }
}
