//! Question selection: topic + mastery level → one materialized question.
//!
//! Policy: the learner's level is rounded down to an integer tier; every bank
//! candidate at or below that tier is eligible and one is chosen uniformly at
//! random, then generated. There is no recency/no-repeat rule.

use std::sync::{Arc, Mutex, PoisonError};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info, instrument};

use crate::bank::QuestionBank;
use crate::domain::{Question, Topic};
use crate::error::{EngineError, EngineResult};

pub struct QuestionSelector {
    bank: Arc<dyn QuestionBank>,
    rng: Mutex<StdRng>,
}

impl QuestionSelector {
    pub fn new(bank: Arc<dyn QuestionBank>) -> Self {
        Self { bank, rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// Reproducible selection and generation, for tests and replay.
    pub fn with_seed(bank: Arc<dyn QuestionBank>, seed: u64) -> Self {
        Self { bank, rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    /// Integer tier used for bank lookup: floor of the level, at least 1.
    pub fn tier_for(max_difficulty: f64) -> u32 {
        if max_difficulty.is_finite() && max_difficulty >= 1.0 {
            max_difficulty.floor() as u32
        } else {
            1
        }
    }

    /// Select by topic key (as received from a caller).
    pub fn select(&self, topic: &str, max_difficulty: f64) -> EngineResult<Question> {
        let topic: Topic = topic.parse()?;
        self.select_topic(topic, max_difficulty)
    }

    #[instrument(level = "debug", skip(self), fields(%topic))]
    pub fn select_topic(&self, topic: Topic, max_difficulty: f64) -> EngineResult<Question> {
        let tier = Self::tier_for(max_difficulty);
        let eligible: Vec<_> = self
            .bank
            .candidates_for(topic)
            .into_iter()
            .filter(|c| c.difficulty <= tier)
            .collect();
        debug!(target: "practice", %topic, tier, eligible = eligible.len(), "Filtered candidates");

        // The guarded state is just an RNG; a panic elsewhere cannot leave it invalid.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let chosen = eligible
            .choose(&mut *rng)
            .ok_or_else(|| EngineError::NoQuestionAvailable { topic: topic.to_string(), tier })?;
        let question = (chosen.generate)(&mut *rng);
        info!(target: "practice", %topic, tier, id = %question.id, difficulty = question.difficulty, "Question selected");
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{Candidate, StaticBank};
    use crate::domain::{fresh_id, AnswerValue, Solution};

    fn stub(topic: Topic, difficulty: u32) -> Candidate {
        Candidate::new(difficulty, move |rng| Question {
            id: fresh_id(rng),
            topic,
            difficulty,
            description: format!("tier {difficulty}"),
            equation_text: String::new(),
            solution: Solution {
                steps: vec![],
                final_answers: [("x".to_string(), AnswerValue::from("1"))].into_iter().collect(),
            },
            hints: vec![],
        })
    }

    fn tiered_bank() -> Arc<dyn QuestionBank> {
        let mut bank = StaticBank::new();
        for d in 1..=3 {
            bank.insert(Topic::Equations, stub(Topic::Equations, d));
        }
        bank.insert(Topic::Geometry, stub(Topic::Geometry, 2));
        Arc::new(bank)
    }

    #[test]
    fn level_rounds_down_to_tier() {
        assert_eq!(QuestionSelector::tier_for(1.4), 1);
        assert_eq!(QuestionSelector::tier_for(2.99), 2);
        assert_eq!(QuestionSelector::tier_for(5.0), 5);
        assert_eq!(QuestionSelector::tier_for(0.2), 1);
        assert_eq!(QuestionSelector::tier_for(f64::NAN), 1);
    }

    #[test]
    fn never_exceeds_requested_tier() {
        let sel = QuestionSelector::with_seed(tiered_bank(), 11);
        for _ in 0..200 {
            assert!(sel.select("equations", 1.4).unwrap().difficulty <= 1);
            assert!(sel.select("equations", 2.6).unwrap().difficulty <= 2);
        }
    }

    #[test]
    fn all_tiers_below_the_cap_get_picked() {
        let sel = QuestionSelector::with_seed(tiered_bank(), 3);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let d = sel.select("equations", 3.0).unwrap().difficulty;
            seen[(d - 1) as usize] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn unknown_topic_and_empty_pool() {
        let sel = QuestionSelector::with_seed(tiered_bank(), 1);
        assert_eq!(
            sel.select("poetry", 3.0).unwrap_err(),
            EngineError::InvalidTopic("poetry".into())
        );
        assert_eq!(
            sel.select("geometry", 1.9).unwrap_err(),
            EngineError::NoQuestionAvailable { topic: "geometry".into(), tier: 1 }
        );
        assert!(matches!(
            sel.select("vectors", 5.0),
            Err(EngineError::NoQuestionAvailable { .. })
        ));
    }

    #[test]
    fn same_seed_same_questions() {
        let bank: Arc<dyn QuestionBank> = Arc::new(StaticBank::with_builtin(&[]));
        let a = QuestionSelector::with_seed(bank.clone(), 99);
        let b = QuestionSelector::with_seed(bank, 99);
        for topic in Topic::ALL {
            assert_eq!(a.select_topic(topic, 3.0).unwrap(), b.select_topic(topic, 3.0).unwrap());
        }
    }

    #[test]
    fn builtin_questions_respect_the_cap() {
        let sel = QuestionSelector::with_seed(Arc::new(StaticBank::with_builtin(&[])), 5);
        for topic in Topic::ALL {
            for _ in 0..30 {
                let q = sel.select_topic(topic, 1.4).unwrap();
                assert_eq!(q.difficulty, 1);
                assert!(!q.solution.final_answers.is_empty());
            }
        }
    }
}
