//! Known tile classifications merged under a fixed priority.

use std::collections::{HashMap, HashSet};

use crate::grid::{Coordinate, TileType};

/// Tile knowledge derived from policy artifacts.
///
/// Merging is priority-based (`Goal > Trap > Floor > Hole`) so the final
/// classification of a coordinate never depends on observation order.
/// Coordinates never observed are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapMemory {
    tiles: HashMap<Coordinate, TileType>,
    danger: HashSet<Coordinate>,
}

impl MapMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation, keeping the higher-priority classification.
    pub fn observe(&mut self, at: Coordinate, tile: TileType) {
        self.tiles
            .entry(at)
            .and_modify(|known| *known = known.merge(tile))
            .or_insert(tile);
    }

    /// Records many observations.
    pub fn observe_all(&mut self, observations: impl IntoIterator<Item = (Coordinate, TileType)>) {
        for (at, tile) in observations {
            self.observe(at, tile);
        }
    }

    /// Marks `at` as the goal regardless of earlier evidence.
    pub fn mark_goal(&mut self, at: Coordinate) {
        self.tiles.insert(at, TileType::Goal);
    }

    pub fn mark_danger(&mut self, at: Coordinate) {
        self.danger.insert(at);
    }

    pub fn get(&self, at: Coordinate) -> Option<TileType> {
        self.tiles.get(&at).copied()
    }

    /// `live` upgraded by what is remembered at `at`. A live hole stays a hole.
    pub fn refine(&self, at: Coordinate, live: TileType) -> TileType {
        match (live, self.get(at)) {
            (TileType::Hole, _) | (_, None) => live,
            (_, Some(known)) => live.merge(known),
        }
    }

    pub fn is_danger(&self, at: Coordinate) -> bool {
        self.danger.contains(&at)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.danger.is_empty()
    }

    pub fn danger_count(&self) -> usize {
        self.danger.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, TileType)> + '_ {
        self.tiles.iter().map(|(c, t)| (*c, *t))
    }

    /// Copy with every coordinate reflected across `x = 0`.
    pub fn mirrored(&self) -> Self {
        Self {
            tiles: self.tiles.iter().map(|(c, t)| (c.mirrored(), *t)).collect(),
            danger: self.danger.iter().map(Coordinate::mirrored).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn floor_is_not_downgraded_by_hole() {
        let mut memory = MapMemory::new();
        let at = Coordinate::new(1, 1);
        memory.observe(at, TileType::Floor);
        memory.observe(at, TileType::Hole);
        assert_eq!(memory.get(at), Some(TileType::Floor));
        memory.observe(at, TileType::Goal);
        memory.observe(at, TileType::Trap);
        assert_eq!(memory.get(at), Some(TileType::Goal));
    }

    #[test]
    fn refine_upgrades_live_floor_only() {
        let mut memory = MapMemory::new();
        let goal = Coordinate::new(0, 3);
        let pit = Coordinate::new(1, 3);
        memory.observe(goal, TileType::Goal);
        memory.observe(pit, TileType::Hole);
        assert_eq!(memory.refine(goal, TileType::Floor), TileType::Goal);
        assert_eq!(memory.refine(goal, TileType::Hole), TileType::Hole);
        assert_eq!(memory.refine(pit, TileType::Floor), TileType::Floor);
        assert_eq!(
            memory.refine(Coordinate::new(9, 9), TileType::Trap),
            TileType::Trap
        );
    }

    #[test]
    fn unknown_is_absent() {
        let memory = MapMemory::new();
        assert_eq!(memory.get(Coordinate::new(0, 0)), None);
        assert!(memory.is_empty());
    }

    #[test]
    fn mirror_reflects_tiles_and_danger() {
        let mut memory = MapMemory::new();
        memory.observe(Coordinate::new(2, 5), TileType::Trap);
        memory.mark_danger(Coordinate::new(-3, 1));
        let mirrored = memory.mirrored();
        assert_eq!(mirrored.get(Coordinate::new(-2, 5)), Some(TileType::Trap));
        assert!(mirrored.is_danger(Coordinate::new(3, 1)));
        assert_eq!(mirrored.mirrored(), memory);
    }

    fn arb_tile() -> impl Strategy<Value = TileType> {
        prop_oneof![
            Just(TileType::Hole),
            Just(TileType::Floor),
            Just(TileType::Goal),
            Just(TileType::Trap),
        ]
    }

    fn arb_observations() -> impl Strategy<Value = Vec<(Coordinate, TileType)>> {
        prop::collection::vec(
            ((-3i32..3, -3i32..3), arb_tile())
                .prop_map(|((x, z), t)| (Coordinate::new(x, z), t)),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn merge_is_order_independent(
            observations in arb_observations(),
            seed in any::<u64>(),
        ) {
            use rand::seq::SliceRandom;
            use rand::SeedableRng;

            let mut forward = MapMemory::new();
            forward.observe_all(observations.iter().copied());

            let mut shuffled = observations.clone();
            shuffled.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed));
            let mut other = MapMemory::new();
            other.observe_all(shuffled);

            prop_assert_eq!(&forward, &other);
        }

        #[test]
        fn merge_is_idempotent(observations in arb_observations()) {
            let mut once = MapMemory::new();
            once.observe_all(observations.iter().copied());
            let mut twice = once.clone();
            twice.observe_all(observations.iter().copied());
            prop_assert_eq!(once, twice);
        }
    }
}
