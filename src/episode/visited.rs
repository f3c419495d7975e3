use std::collections::HashMap;

use crate::grid::Coordinate;

/// Per-episode visit counts, used only to shape exploration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedTiles {
    counts: HashMap<Coordinate, u32>,
}

impl VisitedTiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more visit to `at` and returns the new count.
    pub fn visit(&mut self, at: Coordinate) -> u32 {
        let count = self.counts.entry(at).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn count(&self, at: Coordinate) -> u32 {
        self.counts.get(&at).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Number of distinct tiles visited.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all visit counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| u64::from(*c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_increase_per_visit() {
        let mut visited = VisitedTiles::new();
        let at = Coordinate::new(2, 3);
        assert_eq!(visited.count(at), 0);
        assert_eq!(visited.visit(at), 1);
        assert_eq!(visited.visit(at), 2);
        visited.visit(Coordinate::new(0, 0));
        assert_eq!(visited.len(), 2);
        assert_eq!(visited.total(), 3);
        visited.clear();
        assert!(visited.is_empty());
        assert_eq!(visited.count(at), 0);
    }
}
