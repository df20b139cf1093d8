//! Question bank: the content side the selector draws from.
//!
//! A bank hands out *candidates*: a difficulty tier plus a generator that
//! materializes a fresh `Question` (usually drawing random coefficients).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use tracing::{error, info};

use crate::config::QuestionCfg;
use crate::domain::{fresh_id, Question, Solution, Topic};

pub type GenerateFn = Arc<dyn Fn(&mut dyn RngCore) -> Question + Send + Sync>;

#[derive(Clone)]
pub struct Candidate {
  pub difficulty: u32,
  pub generate: GenerateFn,
}

impl Candidate {
  pub fn new<F>(difficulty: u32, generate: F) -> Self
  where
    F: Fn(&mut dyn RngCore) -> Question + Send + Sync + 'static,
  {
    Self { difficulty, generate: Arc::new(generate) }
  }

  /// Candidate that always serves a copy of `question` under a fresh id.
  pub fn fixed(question: Question) -> Self {
    let difficulty = question.difficulty;
    Self::new(difficulty, move |rng| Question { id: fresh_id(rng), ..question.clone() })
  }
}

impl fmt::Debug for Candidate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Candidate").field("difficulty", &self.difficulty).finish_non_exhaustive()
  }
}

/// Source of question candidates per topic.
pub trait QuestionBank: Send + Sync {
  fn candidates_for(&self, topic: Topic) -> Vec<Candidate>;
}

/// In-memory bank keyed by topic.
#[derive(Clone, Default, Debug)]
pub struct StaticBank {
  pools: HashMap<Topic, Vec<Candidate>>,
}

impl StaticBank {
  pub fn new() -> Self {
    Self::default()
  }

  /// Built-in generators plus any config-supplied static questions.
  pub fn with_builtin(extra: &[QuestionCfg]) -> Self {
    let mut bank = Self::new();
    for (topic, candidate) in crate::seeds::builtin_candidates() {
      bank.insert(topic, candidate);
    }
    for qc in extra {
      match question_from_cfg(qc) {
        Ok(q) => bank.insert(q.topic, Candidate::fixed(q)),
        Err(reason) => {
          error!(target: "mathtutor_engine", topic = %qc.topic, %reason, "Skipping bank item");
        }
      }
    }
    bank.log_inventory();
    bank
  }

  pub fn insert(&mut self, topic: Topic, candidate: Candidate) {
    self.pools.entry(topic).or_default().push(candidate);
  }

  pub fn len(&self) -> usize {
    self.pools.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn log_inventory(&self) {
    for topic in Topic::ALL {
      let pool = self.pools.get(&topic).map(Vec::as_slice).unwrap_or_default();
      let mut tiers: Vec<u32> = pool.iter().map(|c| c.difficulty).collect();
      tiers.sort_unstable();
      info!(target: "mathtutor_engine", %topic, candidates = pool.len(), ?tiers, "Startup question inventory");
    }
  }
}

impl QuestionBank for StaticBank {
  fn candidates_for(&self, topic: Topic) -> Vec<Candidate> {
    self.pools.get(&topic).cloned().unwrap_or_default()
  }
}

/// Validate a TOML bank entry into a question template.
fn question_from_cfg(qc: &QuestionCfg) -> Result<Question, String> {
  let topic: Topic = qc.topic.parse().map_err(|e| format!("{e}"))?;
  if qc.difficulty == 0 {
    return Err("difficulty must be >= 1".into());
  }
  if qc.final_answers.values().all(|v| v.is_empty()) {
    return Err("no final answers".into());
  }
  // Parsed answers always carry lowercase names.
  let mut final_answers = BTreeMap::new();
  for (key, value) in &qc.final_answers {
    if final_answers.insert(key.to_lowercase(), value.clone()).is_some() {
      return Err(format!("answer key '{key}' collides with another key once lowercased"));
    }
  }
  Ok(Question {
    id: qc.id.clone().unwrap_or_default(),
    topic,
    difficulty: qc.difficulty,
    description: qc.description.clone(),
    equation_text: qc.equation.clone(),
    solution: Solution {
      steps: qc.steps.clone(),
      final_answers,
    },
    hints: qc.hints.clone(),
  })
}
