//! The fused decision engine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::cloning::cloning_scores;
use super::forest::ForestScorer;
use super::policy::Policy;
use super::tiers::{learned_scores, DecisionTier, TierInputs};
use crate::config::{EngineConfig, InferenceConfig};
use crate::episode::VisitedTiles;
use crate::grid::{Action, Coordinate, GridEnvironment};
use crate::memory::{infer, MapKnowledge, StageVariant};
use crate::policy::{ParameterSummary, PolicyStore};
use crate::state::{StateEncoder, StateKey};

/// Per-tick view of the world handed to a [`Policy`].
pub struct TickContext<'a> {
    /// Live tile queries.
    pub env: &'a dyn GridEnvironment,
    /// Visit counts of the current episode; the chosen destination is recorded here.
    pub visited: &'a mut VisitedTiles,
}

impl<'a> TickContext<'a> {
    pub fn new(env: &'a dyn GridEnvironment, visited: &'a mut VisitedTiles) -> Self {
        Self { env, visited }
    }
}

/// Every intermediate score of one fused decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// Tree-averaged heuristic scores.
    pub forest: [f64; 4],
    /// Output of the tier that answered.
    pub learned: [f64; 4],
    /// Behaviour-cloning scores; `0.25` each without an entry.
    pub cloning: [f64; 4],
    /// Final blend the selection ran on.
    pub fused: [f64; 4],
}

/// Outcome of one think-tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    /// Tile the move leads to.
    pub destination: Coordinate,
    /// Encoded state the tables were queried with.
    pub key: StateKey,
    /// Tier of the learned chain consulted, or `Exploration`.
    pub tier: DecisionTier,
    /// `None` when the exploration override fired.
    pub scores: Option<ScoreBreakdown>,
}

/// Blends the forest, the tiered learned signal and behaviour cloning into
/// one move per tick.
///
/// ```text
/// ensemble = ensemble_weight × forest + (1 − ensemble_weight) × learned
/// final    = (1 − bc_weight) × ensemble + bc_weight × cloning
/// ```
///
/// Owns the policy store and the map knowledge derived from it for the whole
/// session. Never fails: with no data at all it still picks a safe move.
#[derive(Debug)]
pub struct DecisionEngine {
    config: EngineConfig,
    encoder: StateEncoder,
    inference: InferenceConfig,
    store: PolicyStore,
    summary: ParameterSummary,
    base_knowledge: MapKnowledge,
    knowledge: MapKnowledge,
    stage: StageVariant,
    forest: ForestScorer,
    rng: StdRng,
}

impl DecisionEngine {
    /// Creates an engine with an empty policy store.
    ///
    /// # Arguments
    ///
    /// * `config` - Blend weights, exploration rate and forest settings
    /// * `encoder` - Key encoding matching the loaded tables
    /// * `seed` - Fixed RNG seed, or `None` to seed from entropy
    pub fn new(config: EngineConfig, encoder: StateEncoder, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let forest = ForestScorer::new(config.forest.clone(), &mut rng);
        Self {
            config,
            encoder,
            inference: InferenceConfig::default(),
            store: PolicyStore::default(),
            summary: ParameterSummary::default(),
            base_knowledge: MapKnowledge::default(),
            knowledge: MapKnowledge::default(),
            stage: StageVariant::Normal,
            forest,
            rng,
        }
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self.rederive();
        self
    }

    pub fn with_stage(mut self, stage: StageVariant) -> Self {
        self.set_stage(stage);
        self
    }

    /// Replaces the policy store and re-derives map knowledge from it.
    pub fn install(&mut self, store: PolicyStore) {
        self.summary = store.summary_or_default();
        self.store = store;
        self.rederive();
    }

    /// Switches stage variant; knowledge is re-derived for the new geometry.
    pub fn set_stage(&mut self, stage: StageVariant) {
        self.stage = stage;
        self.knowledge = self.base_knowledge.for_stage(stage);
        log::debug!("stage set to {stage:?}, goal {:?}", self.knowledge.goal);
    }

    fn rederive(&mut self) {
        self.base_knowledge = if self.store.is_empty() {
            MapKnowledge::default()
        } else {
            infer(&self.store, &self.summary, &self.inference)
        };
        self.knowledge = self.base_knowledge.for_stage(self.stage);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    /// Tables currently installed.
    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    /// Map knowledge for the active stage (mirrored when it is).
    pub fn knowledge(&self) -> &MapKnowledge {
        &self.knowledge
    }

    /// Stage variant set by [`set_stage`](Self::set_stage).
    pub fn stage(&self) -> StageVariant {
        self.stage
    }

    /// Heuristic scorer with its fixed per-tree noise.
    pub fn forest(&self) -> &ForestScorer {
        &self.forest
    }

    /// Picks the next move from `position` and records its destination.
    pub fn decide(&mut self, position: Coordinate, ctx: &mut TickContext<'_>) -> Action {
        self.evaluate(position, ctx).action
    }

    /// Like [`decide`](Self::decide), also returning every intermediate score.
    pub fn evaluate(&mut self, position: Coordinate, ctx: &mut TickContext<'_>) -> Decision {
        let key = self.encoder.encode(ctx.env, position);

        let rate = self.config.exploration_rate;
        if rate > 0.0 && self.rng.gen::<f64>() < rate {
            let action = Action::ALL[self.rng.gen_range(0..Action::ALL.len())];
            return Self::finish(position, key, action, DecisionTier::Exploration, None, ctx);
        }

        let ensemble_weight = self.config.ensemble_weight;
        let bc_weight = self.config.bc_weight;

        let forest = if ensemble_weight > 0.0 {
            self.forest
                .score(ctx.env, position, &self.knowledge, &*ctx.visited, &self.summary)
        } else {
            [0.0; 4]
        };

        let (learned, tier) = learned_scores(&TierInputs {
            env: ctx.env,
            position,
            key: &key,
            encoder: &self.encoder,
            store: &self.store,
            knowledge: &self.knowledge,
            imitation_veto: self
                .config
                .imitation_hole_veto
                .then_some(self.config.veto_score),
        });

        let cloning = cloning_scores(
            self.store.behavior_cloning().get(&key),
            self.config.bc_base_score,
            self.config.confidence_saturation_samples,
        );

        let fused: [f64; 4] = std::array::from_fn(|i| {
            let ensemble = ensemble_weight * forest[i] + (1.0 - ensemble_weight) * learned[i];
            (1.0 - bc_weight) * ensemble + bc_weight * cloning[i]
        });

        let action = self.config.selection.select(&fused, &mut self.rng);
        let breakdown = ScoreBreakdown {
            forest,
            learned,
            cloning,
            fused,
        };
        Self::finish(position, key, action, tier, Some(breakdown), ctx)
    }

    fn finish(
        position: Coordinate,
        key: StateKey,
        action: Action,
        tier: DecisionTier,
        scores: Option<ScoreBreakdown>,
        ctx: &mut TickContext<'_>,
    ) -> Decision {
        let destination = position.step(action);
        let visits = ctx.visited.visit(destination);
        log::debug!(
            "{key} at {position}: {action} via {tier} (visit {visits}), scores {:?}",
            scores.map(|s| s.fused)
        );
        Decision {
            action,
            destination,
            key,
            tier,
            scores,
        }
    }
}

impl Policy for DecisionEngine {
    fn select_action(&mut self, position: Coordinate, ctx: &mut TickContext<'_>) -> Action {
        self.decide(position, ctx)
    }

    fn name(&self) -> &str {
        "fusion"
    }
}
