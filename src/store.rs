//! Learner state persistence.
//!
//! `LearnerStore` is the single seam between the engine and whatever database
//! backs learner records. `InMemoryLearnerStore` is the one implementation
//! shipped here; state lives in `tokio::sync::RwLock`-guarded maps.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::difficulty::MIN_LEVEL;
use crate::domain::{PendingQuestion, StreakState, Topic};
use crate::error::EngineResult;

#[async_trait]
pub trait LearnerStore: Send + Sync {
  /// Current level for one topic; `MIN_LEVEL` when the learner has no record.
  async fn get_topic_level(&self, learner_id: &str, topic: Topic) -> EngineResult<f64>;
  async fn set_topic_level(&self, learner_id: &str, topic: Topic, level: f64) -> EngineResult<()>;
  /// Every topic the learner has a record for.
  async fn topic_levels(&self, learner_id: &str) -> EngineResult<BTreeMap<Topic, f64>>;

  async fn get_math_level(&self, learner_id: &str) -> EngineResult<Option<f64>>;
  async fn set_math_level(&self, learner_id: &str, level: f64) -> EngineResult<()>;

  async fn get_streak_state(&self, learner_id: &str) -> EngineResult<StreakState>;
  async fn set_streak_state(&self, learner_id: &str, streak: StreakState) -> EngineResult<()>;

  async fn get_pending_question(&self, learner_id: &str) -> EngineResult<Option<PendingQuestion>>;
  async fn set_pending_question(
    &self,
    learner_id: &str,
    pending: Option<PendingQuestion>,
  ) -> EngineResult<()>;
}

#[derive(Clone, Debug, Default)]
struct LearnerRecord {
  topic_levels: BTreeMap<Topic, f64>,
  math_level: Option<f64>,
  streak: StreakState,
  pending: Option<PendingQuestion>,
}

#[derive(Clone, Default)]
pub struct InMemoryLearnerStore {
  learners: Arc<RwLock<HashMap<String, LearnerRecord>>>,
}

impl InMemoryLearnerStore {
  pub fn new() -> Self {
    Self::default()
  }

  async fn read<T>(&self, learner_id: &str, f: impl FnOnce(&LearnerRecord) -> T) -> T {
    let learners = self.learners.read().await;
    match learners.get(learner_id) {
      Some(rec) => f(rec),
      None => f(&LearnerRecord::default()),
    }
  }

  async fn write(&self, learner_id: &str, f: impl FnOnce(&mut LearnerRecord)) {
    let mut learners = self.learners.write().await;
    f(learners.entry(learner_id.to_string()).or_default());
  }
}

#[async_trait]
impl LearnerStore for InMemoryLearnerStore {
  async fn get_topic_level(&self, learner_id: &str, topic: Topic) -> EngineResult<f64> {
    Ok(self.read(learner_id, |r| r.topic_levels.get(&topic).copied().unwrap_or(MIN_LEVEL)).await)
  }

  #[instrument(level = "debug", skip(self))]
  async fn set_topic_level(&self, learner_id: &str, topic: Topic, level: f64) -> EngineResult<()> {
    self.write(learner_id, |r| {
      r.topic_levels.insert(topic, level);
    })
    .await;
    Ok(())
  }

  async fn topic_levels(&self, learner_id: &str) -> EngineResult<BTreeMap<Topic, f64>> {
    Ok(self.read(learner_id, |r| r.topic_levels.clone()).await)
  }

  async fn get_math_level(&self, learner_id: &str) -> EngineResult<Option<f64>> {
    Ok(self.read(learner_id, |r| r.math_level).await)
  }

  async fn set_math_level(&self, learner_id: &str, level: f64) -> EngineResult<()> {
    self.write(learner_id, |r| r.math_level = Some(level)).await;
    Ok(())
  }

  async fn get_streak_state(&self, learner_id: &str) -> EngineResult<StreakState> {
    Ok(self.read(learner_id, |r| r.streak).await)
  }

  async fn set_streak_state(&self, learner_id: &str, streak: StreakState) -> EngineResult<()> {
    self.write(learner_id, |r| r.streak = streak).await;
    Ok(())
  }

  async fn get_pending_question(&self, learner_id: &str) -> EngineResult<Option<PendingQuestion>> {
    Ok(self.read(learner_id, |r| r.pending.clone()).await)
  }

  async fn set_pending_question(
    &self,
    learner_id: &str,
    pending: Option<PendingQuestion>,
  ) -> EngineResult<()> {
    self.write(learner_id, |r| r.pending = pending).await;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn unknown_learner_reads_defaults() {
    let store = InMemoryLearnerStore::new();
    assert_eq!(store.get_topic_level("nobody", Topic::Vectors).await.unwrap(), 1.0);
    assert!(store.topic_levels("nobody").await.unwrap().is_empty());
    assert_eq!(store.get_streak_state("nobody").await.unwrap(), StreakState::default());
    assert_eq!(store.get_math_level("nobody").await.unwrap(), None);
    assert!(store.get_pending_question("nobody").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn learners_are_isolated() {
    let store = InMemoryLearnerStore::new();
    store.set_topic_level("a", Topic::Geometry, 2.5).await.unwrap();
    store
      .set_streak_state("a", StreakState { consecutive_correct: 2, consecutive_incorrect: 0 })
      .await
      .unwrap();
    assert_eq!(store.get_topic_level("a", Topic::Geometry).await.unwrap(), 2.5);
    assert_eq!(store.get_topic_level("b", Topic::Geometry).await.unwrap(), 1.0);
    assert_eq!(store.get_streak_state("b").await.unwrap(), StreakState::default());
  }
}
