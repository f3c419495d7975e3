//! Policy trait driven by the episode controller.

use rand::seq::SliceRandom;

use super::decision::TickContext;
use crate::grid::{Action, Coordinate};

/// Anything that picks one move per think-tick.
pub trait Policy: Send + Sync {
    /// Selects the next move from `position`.
    ///
    /// Implementations record the chosen destination in `ctx.visited`.
    fn select_action(&mut self, position: Coordinate, ctx: &mut TickContext<'_>) -> Action;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}

/// Uniformly random moves.
///
/// Ignores every table and the live grid. Used as a lower-bound baseline.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPolicy;

impl RandomPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Policy for RandomPolicy {
    fn select_action(&mut self, position: Coordinate, ctx: &mut TickContext<'_>) -> Action {
        let mut rng = rand::thread_rng();
        let action = *Action::ALL.choose(&mut rng).unwrap_or(&Action::Up);
        ctx.visited.visit(position.step(action));
        action
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::VisitedTiles;
    use crate::grid::{TileGrid, TileType};

    #[test]
    fn random_policy_records_destination() {
        let env = TileGrid::filled(0, 0, 3, 3, TileType::Floor);
        let mut visited = VisitedTiles::new();
        let mut policy = RandomPolicy::new();
        let at = Coordinate::new(1, 1);
        for _ in 0..20 {
            let mut ctx = TickContext::new(&env, &mut visited);
            let action = policy.select_action(at, &mut ctx);
            assert!(Action::ALL.contains(&action));
        }
        assert_eq!(visited.total(), 20);
        assert_eq!(policy.name(), "random");
    }
}
