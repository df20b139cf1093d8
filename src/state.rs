//! Application state: question bank, learner store and the practice session.
//!
//! This module owns:
//!   - the question bank (built-in generators + TOML bank entries)
//!   - the learner store (in-memory)
//!   - the practice session wiring selector, evaluator and store together

use std::sync::Arc;

use tracing::{info, instrument};

use crate::bank::{QuestionBank, StaticBank};
use crate::config::{load_engine_config_from_env, EngineConfig};
use crate::evaluator::SolutionEvaluator;
use crate::selector::QuestionSelector;
use crate::session::PracticeSession;
use crate::store::InMemoryLearnerStore;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<PracticeSession>,
}

impl AppState {
    /// Build state from env: load config (or defaults), build the bank and session.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_engine_config_from_env().unwrap_or_default();
        Self::from_config(&cfg)
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        let bank: Arc<dyn QuestionBank> = Arc::new(StaticBank::with_builtin(&cfg.questions));

        let selector = match cfg.rng_seed {
            Some(seed) => {
                info!(target: "mathtutor_engine", seed, "Question selection seeded from config");
                QuestionSelector::with_seed(bank, seed)
            }
            None => QuestionSelector::new(bank),
        };
        info!(target: "mathtutor_engine", tolerance = ?cfg.tolerance, "Answer tolerances");

        let session = PracticeSession::new(
            Arc::new(InMemoryLearnerStore::new()),
            selector,
            SolutionEvaluator::new(cfg.tolerance),
        );
        Self { session: Arc::new(session) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
