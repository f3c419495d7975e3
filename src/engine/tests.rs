//! Test suite for the decision engine.

use super::*;
use crate::config::{EngineConfig, ForestConfig};
use crate::episode::VisitedTiles;
use crate::grid::{Action, Coordinate, GridEnvironment, TileGrid, TileType};
use crate::memory::StageVariant;
use crate::policy::artifacts::table_from;
use crate::policy::{
    ActionValueRow, ArtifactPaths, BehaviorCloningEntry, ImitationEntry, PolicyStore,
};
use crate::state::{KeyEncoding, StateEncoder};

/// Engine with exploration disabled.
fn engine(config: EngineConfig, seed: u64) -> DecisionEngine {
    DecisionEngine::new(
        EngineConfig {
            exploration_rate: 0.0,
            ..config
        },
        StateEncoder::default(),
        Some(seed),
    )
}

/// Pure learned-tier chain: no forest, no behaviour cloning.
fn learned_only() -> EngineConfig {
    EngineConfig {
        exploration_rate: 0.0,
        ensemble_weight: 0.0,
        bc_weight: 0.0,
        ..EngineConfig::default()
    }
}

/// Open 5x5 floor centred on the origin.
fn open_floor() -> TileGrid {
    TileGrid::filled(-2, -2, 5, 5, TileType::Floor)
}

fn decide_once(engine: &mut DecisionEngine, env: &dyn GridEnvironment, at: Coordinate) -> Action {
    let mut visited = VisitedTiles::new();
    let mut ctx = TickContext::new(env, &mut visited);
    engine.decide(at, &mut ctx)
}

#[cfg(test)]
mod scenarios {
    use super::*;

    /// Only the cell to the right of (1, 1) is floor.
    fn single_exit() -> TileGrid {
        TileGrid::from_rows(Coordinate::new(0, 0), &["ooo", "o##", "ooo"]).unwrap()
    }

    #[test]
    fn test_empty_store_takes_the_only_floor() {
        let env = single_exit();
        for seed in 0..100 {
            let mut engine = engine(EngineConfig::default(), seed);
            assert_eq!(
                decide_once(&mut engine, &env, Coordinate::new(1, 1)),
                Action::Right
            );
        }
    }

    #[test]
    fn test_empty_store_fallback_chain_takes_the_only_floor() {
        let env = single_exit();
        let mut engine = engine(learned_only(), 11);
        let mut visited = VisitedTiles::new();
        for _ in 0..100 {
            let mut ctx = TickContext::new(&env, &mut visited);
            let decision = engine.evaluate(Coordinate::new(1, 1), &mut ctx);
            assert_eq!(decision.action, Action::Right);
            assert_eq!(decision.tier, DecisionTier::SafeFallback);
        }
        assert_eq!(visited.count(Coordinate::new(2, 1)), 100);
    }

    #[test]
    fn test_action_value_row_from_disk_returns_up() {
        let dir = std::env::temp_dir().join(format!("tilepilot-engine-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let env = open_floor();
        let key = StateEncoder::default().encode(&env, Coordinate::new(0, 0));
        std::fs::write(
            dir.join("ai-model_q_table.json"),
            format!(r#"{{"{key}": [0, 10, -5, -5, -5]}}"#),
        )
        .unwrap();

        let (store, report) = PolicyStore::load(&ArtifactPaths::in_dir(&dir));
        assert!(report.any_loaded());

        let mut engine = engine(learned_only(), 3);
        engine.install(store);
        for _ in 0..100 {
            assert_eq!(decide_once(&mut engine, &env, Coordinate::new(0, 0)), Action::Up);
        }
        std::fs::remove_dir_all(dir).ok();
    }
}

#[cfg(test)]
mod fusion {
    use super::*;

    #[test]
    fn test_exploration_rate_one_ignores_tables() {
        let env = open_floor();
        let key = StateEncoder::default().encode(&env, Coordinate::new(0, 0));
        let store = PolicyStore::default()
            .with_action_values(table_from([(key, ActionValueRow([100.0, 0.0, 0.0, 0.0]))]));
        let mut engine = DecisionEngine::new(
            EngineConfig {
                exploration_rate: 1.0,
                ..learned_only()
            },
            StateEncoder::default(),
            Some(5),
        );
        engine.install(store);

        let mut seen = [0u32; 4];
        let mut visited = VisitedTiles::new();
        for _ in 0..400 {
            let mut ctx = TickContext::new(&env, &mut visited);
            let decision = engine.evaluate(Coordinate::new(0, 0), &mut ctx);
            assert_eq!(decision.tier, DecisionTier::Exploration);
            assert!(decision.scores.is_none());
            seen[decision.action.index()] += 1;
        }
        assert!(seen.iter().all(|n| *n > 50), "{seen:?}");
    }

    #[test]
    fn test_fusion_weights_combine_sources() {
        let env = open_floor();
        let key = StateEncoder::default().encode(&env, Coordinate::new(0, 0));
        let store = PolicyStore::default()
            .with_action_values(table_from([(key, ActionValueRow([4.0, 0.0, 0.0, 0.0]))]))
            .with_behavior_cloning(table_from([(
                key,
                BehaviorCloningEntry {
                    weights: [0.0, 1.0, 0.0, 0.0],
                    samples: 40,
                },
            )]));
        let config = EngineConfig {
            ensemble_weight: 0.5,
            bc_weight: 0.5,
            forest: ForestConfig {
                tree_noise: 0.0,
                ..ForestConfig::default()
            },
            ..EngineConfig::default()
        };
        let mut engine = engine(config, 1);
        engine.install(store);

        let mut visited = VisitedTiles::new();
        let mut ctx = TickContext::new(&env, &mut visited);
        let decision = engine.evaluate(Coordinate::new(0, 0), &mut ctx);
        let scores = decision.scores.unwrap();
        assert_eq!(decision.tier, DecisionTier::ActionValue);
        assert_eq!(scores.learned, [4.0, 0.0, 0.0, 0.0]);
        assert_eq!(scores.cloning, [0.0, 10.0, 0.0, 0.0]);
        assert_eq!(scores.forest, [5.0; 4]);
        // up: 0.5 × (0.5×5 + 0.5×4) = 2.25; right: 0.5 × 2.5 + 0.5 × 10 = 6.25
        assert_eq!(scores.fused[Action::Up.index()], 2.25);
        assert_eq!(scores.fused[Action::Right.index()], 6.25);
        assert_eq!(decision.action, Action::Right);
    }

    #[test]
    fn test_bc_weight_one_follows_cloning() {
        let env = open_floor();
        let key = StateEncoder::default().encode(&env, Coordinate::new(0, 0));
        let store = PolicyStore::default().with_behavior_cloning(table_from([(
            key,
            BehaviorCloningEntry {
                weights: [0.1, 0.1, 0.1, 0.7],
                samples: 3,
            },
        )]));
        let mut engine = engine(
            EngineConfig {
                bc_weight: 1.0,
                ..EngineConfig::default()
            },
            8,
        );
        engine.install(store);
        for _ in 0..20 {
            assert_eq!(decide_once(&mut engine, &env, Coordinate::new(0, 0)), Action::Left);
        }
    }

    #[test]
    fn test_imitation_veto_steers_away_from_hole() {
        // Below the origin is a hole.
        let env = TileGrid::from_rows(Coordinate::new(-1, -1), &["###", "###", "#o#"]).unwrap();
        let at = Coordinate::new(0, 0);
        let key = StateEncoder::default().encode(&env, at);
        let store = PolicyStore::default()
            .with_imitation(table_from([(key, ImitationEntry::Frequencies([0, 1, 5, 0]))]));

        let mut vetoed = engine(learned_only(), 2);
        vetoed.install(store.clone());
        assert_eq!(decide_once(&mut vetoed, &env, at), Action::Right);

        let mut trusting = engine(
            EngineConfig {
                imitation_hole_veto: false,
                ..learned_only()
            },
            2,
        );
        trusting.install(store);
        assert_eq!(decide_once(&mut trusting, &env, at), Action::Down);
    }

    #[test]
    fn test_decide_records_destination_once() {
        let env = open_floor();
        let mut engine = engine(EngineConfig::default(), 4);
        let mut visited = VisitedTiles::new();
        let at = Coordinate::new(0, 0);
        for expected in 1..=5u64 {
            let mut ctx = TickContext::new(&env, &mut visited);
            engine.decide(at, &mut ctx);
            assert_eq!(visited.total(), expected);
        }
    }

    #[test]
    fn test_policy_trait_name() {
        let engine = engine(EngineConfig::default(), 0);
        assert_eq!(Policy::name(&engine), "fusion");
    }
}

#[cfg(test)]
mod knowledge {
    use super::*;

    fn goal_store() -> PolicyStore {
        let key = "(4, 2, 1, 1, 1, 1, 1)".parse().unwrap();
        PolicyStore::default()
            .with_action_values(table_from([(key, ActionValueRow([500.0, 0.0, 0.0, 0.0]))]))
    }

    #[test]
    fn test_install_derives_goal() {
        let mut engine = engine(EngineConfig::default(), 0);
        assert_eq!(engine.knowledge().goal, None);
        engine.install(goal_store());
        assert_eq!(engine.knowledge().goal, Some(Coordinate::new(4, 2)));
    }

    #[test]
    fn test_set_stage_mirrors_and_restores() {
        let mut engine = engine(EngineConfig::default(), 0);
        engine.install(goal_store());
        engine.set_stage(StageVariant::Mirrored);
        assert_eq!(engine.knowledge().goal, Some(Coordinate::new(-4, 2)));
        engine.set_stage(StageVariant::Normal);
        assert_eq!(engine.knowledge().goal, Some(Coordinate::new(4, 2)));
    }

    #[test]
    fn test_goal_pulls_fallback_toward_it() {
        let env = open_floor();
        let mut engine = engine(learned_only(), 0);
        engine.install(goal_store());
        assert_eq!(decide_once(&mut engine, &env, Coordinate::new(0, 0)), Action::Right);
    }

    #[test]
    fn test_position_dependent_lookup() {
        let env = open_floor();
        let encoder = StateEncoder::new(KeyEncoding::PositionDependent);
        let key = encoder.encode(&env, Coordinate::new(1, 1));
        assert_eq!(key.position, Some(Coordinate::new(1, 1)));
        let store = PolicyStore::default()
            .with_action_values(table_from([(key, ActionValueRow([0.0, 0.0, 0.0, 9.0]))]));
        let mut engine = DecisionEngine::new(learned_only(), encoder, Some(0));
        engine.install(store);
        assert_eq!(decide_once(&mut engine, &env, Coordinate::new(1, 1)), Action::Left);
        // Same pattern elsewhere is a different key.
        let mut visited = VisitedTiles::new();
        let mut ctx = TickContext::new(&env, &mut visited);
        let decision = engine.evaluate(Coordinate::new(0, 0), &mut ctx);
        assert_ne!(decision.tier, DecisionTier::ActionValue);
    }

    /// A signal-free positioned row still teaches the map: (0, 1) is a goal.
    fn remembered_goal_store() -> PolicyStore {
        let key = "(0, 1, 2, 1, 1, 1, 1)".parse().unwrap();
        PolicyStore::default()
            .with_action_values(table_from([(key, ActionValueRow([0.0; 4]))]))
    }

    #[test]
    fn test_remembered_goal_steers_fallback_and_forest() {
        let env = open_floor();
        let at = Coordinate::new(0, 0);

        let mut blind = engine(learned_only(), 0);
        let mut visited = VisitedTiles::new();
        let mut ctx = TickContext::new(&env, &mut visited);
        let scores = blind.evaluate(at, &mut ctx).scores.unwrap().learned;
        assert_eq!(scores, [1.0; 4]);

        for seed in 0..20 {
            let mut fallback = engine(learned_only(), seed);
            fallback.install(remembered_goal_store());
            assert_eq!(fallback.knowledge().goal, None);
            assert_eq!(
                fallback.knowledge().memory.get(Coordinate::new(0, 1)),
                Some(TileType::Goal)
            );
            assert_eq!(decide_once(&mut fallback, &env, at), Action::Up);

            let mut forest = engine(EngineConfig::default(), seed);
            forest.install(remembered_goal_store());
            assert_eq!(decide_once(&mut forest, &env, at), Action::Up);
        }
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use crate::engine::selection::best_actions;
    use proptest::prelude::*;

    fn row_with_signal() -> impl Strategy<Value = [f64; 4]> {
        prop::array::uniform4(-20i32..20)
            .prop_filter("needs signal", |row| row.iter().any(|v| *v != 0))
            .prop_map(|row| row.map(f64::from))
    }

    proptest! {
        #[test]
        fn test_learned_only_returns_exact_argmax(row in row_with_signal(), seed in any::<u64>()) {
            let env = open_floor();
            let at = Coordinate::new(0, 0);
            let key = StateEncoder::default().encode(&env, at);
            let mut engine = engine(learned_only(), seed);
            engine.install(
                PolicyStore::default().with_action_values(table_from([(key, ActionValueRow(row))])),
            );
            let action = decide_once(&mut engine, &env, at);
            prop_assert!(best_actions(&row).contains(&action));
        }
    }

    #[test]
    fn test_ties_spread_across_tied_actions() {
        let env = open_floor();
        let at = Coordinate::new(0, 0);
        let key = StateEncoder::default().encode(&env, at);
        let mut engine = engine(learned_only(), 21);
        engine.install(
            PolicyStore::default()
                .with_action_values(table_from([(key, ActionValueRow([5.0, 5.0, 1.0, 5.0]))])),
        );
        let mut seen = [0u32; 4];
        for _ in 0..600 {
            seen[decide_once(&mut engine, &env, at).index()] += 1;
        }
        assert_eq!(seen[Action::Down.index()], 0);
        for action in [Action::Up, Action::Right, Action::Left] {
            assert!(seen[action.index()] > 120, "{seen:?}");
        }
    }
}
