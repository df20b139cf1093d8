//! Practice session orchestration shared by the HTTP and WebSocket handlers.
//!
//! Per learner the session is a small state machine:
//!
//! ```text
//! Idle --next question--> PendingAnswer --submit--> Idle
//!                         PendingAnswer --hint----> PendingAnswer
//! ```
//!
//! Every operation on one learner runs under that learner's async mutex, so a
//! "next question" racing a "submit answer" (two tabs) cannot interleave their
//! read-modify-write of the pending question. Different learners never contend.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::difficulty::{self, next_level};
use crate::domain::{PendingQuestion, StreakState, Topic};
use crate::error::{EngineError, EngineResult};
use crate::evaluator::SolutionEvaluator;
use crate::parser;
use crate::protocol::{to_out, QuestionOut};
use crate::selector::QuestionSelector;
use crate::store::LearnerStore;
use crate::util::trunc_for_log;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
  pub is_correct: bool,
  pub new_level: f64,
  pub level_delta: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintOutcome {
  pub hint: String,
  /// 1-based position of this hint.
  pub hint_number: usize,
  pub total_hints: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
  pub topic_levels: BTreeMap<Topic, f64>,
  pub math_level: f64,
  pub streak: StreakState,
}

pub struct PracticeSession {
  store: Arc<dyn LearnerStore>,
  selector: QuestionSelector,
  evaluator: SolutionEvaluator,
  learner_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Held for the duration of one learner operation. On drop the learner's lock
/// entry is removed unless another task is holding or waiting on it.
struct LearnerGuard<'a> {
  guard: Option<OwnedMutexGuard<()>>,
  locks: &'a StdMutex<HashMap<String, Arc<Mutex<()>>>>,
  learner_id: String,
}

impl Drop for LearnerGuard<'_> {
  fn drop(&mut self) {
    drop(self.guard.take());
    let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
    // Only the map's own reference left: nobody holds or awaits this lock.
    if locks.get(&self.learner_id).is_some_and(|l| Arc::strong_count(l) == 1) {
      locks.remove(&self.learner_id);
    }
  }
}

impl PracticeSession {
  pub fn new(store: Arc<dyn LearnerStore>, selector: QuestionSelector, evaluator: SolutionEvaluator) -> Self {
    Self { store, selector, evaluator, learner_locks: StdMutex::new(HashMap::new()) }
  }

  async fn lock_learner(&self, learner_id: &str) -> LearnerGuard<'_> {
    let lock = {
      let mut locks = self.learner_locks.lock().unwrap_or_else(PoisonError::into_inner);
      locks.entry(learner_id.to_string()).or_default().clone()
    };
    // Built before awaiting so a cancelled waiter still prunes its entry.
    let mut held = LearnerGuard { guard: None, locks: &self.learner_locks, learner_id: learner_id.to_string() };
    held.guard = Some(lock.lock_owned().await);
    held
  }

  #[cfg(test)]
  fn tracked_learners(&self) -> usize {
    self.learner_locks.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  /// Pick a question for the learner's current level in `topic` and make it
  /// the pending question. An existing pending question is discarded.
  #[instrument(level = "info", skip(self), fields(%learner_id, %topic))]
  pub async fn get_next_question(&self, learner_id: &str, topic: &str) -> EngineResult<QuestionOut> {
    let topic: Topic = topic.parse()?;
    let _guard = self.lock_learner(learner_id).await;

    let level = self.store.get_topic_level(learner_id, topic).await?;
    let question = self.selector.select_topic(topic, level)?;

    if let Some(old) = self.store.get_pending_question(learner_id).await? {
      debug!(target: "practice", %learner_id, replaced = %old.question.id, "Discarding unanswered question");
    }
    let out = to_out(&question);
    self.store.set_pending_question(learner_id, Some(PendingQuestion::new(question))).await?;
    info!(target: "practice", %learner_id, %topic, level, id = %out.id, "Question issued");
    Ok(out)
  }

  /// Grade the pending question and move the learner's level.
  ///
  /// A malformed answer fails with `EngineError::Format` and leaves the pending
  /// question and all levels untouched.
  #[instrument(level = "info", skip(self, raw_answer), fields(%learner_id, %topic, answer_len = raw_answer.len()))]
  pub async fn submit_answer(
    &self,
    learner_id: &str,
    topic: &str,
    raw_answer: &str,
  ) -> EngineResult<SubmitOutcome> {
    let topic: Topic = topic.parse()?;
    let _guard = self.lock_learner(learner_id).await;

    let pending = self
      .store
      .get_pending_question(learner_id)
      .await?
      .filter(|p| p.question.topic == topic)
      .ok_or_else(|| EngineError::NoActiveQuestion(learner_id.to_string()))?;

    let parsed = parser::parse(raw_answer).map_err(|e| {
      debug!(target: "practice", %learner_id, answer = %trunc_for_log(raw_answer, 40), "Unreadable answer");
      e
    })?;
    let is_correct = self.evaluator.is_correct(&parsed, &pending.question.solution.final_answers, topic);

    let current = self.store.get_topic_level(learner_id, topic).await?;
    let streak = self.store.get_streak_state(learner_id).await?;
    let update = next_level(current, is_correct, streak);

    self.store.set_topic_level(learner_id, topic, update.new_level).await?;
    self.store.set_streak_state(learner_id, update.streak).await?;
    let math_level = self.refresh_math_level(learner_id).await?;
    self.store.set_pending_question(learner_id, None).await?;

    info!(
      target: "practice",
      %learner_id,
      %topic,
      id = %pending.question.id,
      is_correct,
      from = current,
      to = update.new_level,
      delta = update.level_delta,
      math_level,
      "Answer graded"
    );
    Ok(SubmitOutcome { is_correct, new_level: update.new_level, level_delta: update.level_delta })
  }

  /// Hand out the next unused hint of the pending question.
  #[instrument(level = "info", skip(self), fields(%learner_id))]
  pub async fn get_hint(&self, learner_id: &str) -> EngineResult<HintOutcome> {
    let _guard = self.lock_learner(learner_id).await;

    let mut pending = self
      .store
      .get_pending_question(learner_id)
      .await?
      .ok_or_else(|| EngineError::NoActiveQuestion(learner_id.to_string()))?;

    let total_hints = pending.question.hints.len();
    let Some(hint) = pending.question.hints.get(pending.hints_used).cloned() else {
      warn!(target: "practice", %learner_id, total_hints, "Hint requested after all hints were used");
      return Err(EngineError::HintsExhausted { total: total_hints });
    };
    pending.hints_used += 1;
    let hint_number = pending.hints_used;
    self.store.set_pending_question(learner_id, Some(pending)).await?;

    info!(target: "practice", %learner_id, hint_number, total_hints, "Hint served");
    Ok(HintOutcome { hint, hint_number, total_hints })
  }

  /// Topic levels, aggregate level and streak for dashboards.
  #[instrument(level = "debug", skip(self), fields(%learner_id))]
  pub async fn get_progress(&self, learner_id: &str) -> EngineResult<Progress> {
    let _guard = self.lock_learner(learner_id).await;
    let topic_levels = self.store.topic_levels(learner_id).await?;
    let math_level = match self.store.get_math_level(learner_id).await? {
      Some(level) => level,
      None => difficulty::math_level(topic_levels.values().copied()),
    };
    let streak = self.store.get_streak_state(learner_id).await?;
    Ok(Progress { topic_levels, math_level, streak })
  }

  async fn refresh_math_level(&self, learner_id: &str) -> EngineResult<f64> {
    let levels = self.store.topic_levels(learner_id).await?;
    let math_level = difficulty::math_level(levels.values().copied());
    self.store.set_math_level(learner_id, math_level).await?;
    Ok(math_level)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bank::{Candidate, QuestionBank, StaticBank};
  use crate::domain::{AnswerValue, Question, Solution};
  use crate::store::InMemoryLearnerStore;

  fn fixed_question(topic: Topic, answers: &[(&str, &str)], hints: &[&str]) -> Question {
    Question {
      id: String::new(),
      topic,
      difficulty: 1,
      description: "fixed".into(),
      equation_text: "2x + 3y = 13".into(),
      solution: Solution {
        steps: vec!["...".into()],
        final_answers: answers.iter().map(|(k, v)| (k.to_string(), AnswerValue::from(*v))).collect(),
      },
      hints: hints.iter().map(|h| h.to_string()).collect(),
    }
  }

  fn session_with(questions: Vec<Question>) -> (PracticeSession, Arc<InMemoryLearnerStore>) {
    let mut bank = StaticBank::new();
    for q in questions {
      bank.insert(q.topic, Candidate::fixed(q));
    }
    let bank: Arc<dyn QuestionBank> = Arc::new(bank);
    let store = Arc::new(InMemoryLearnerStore::new());
    let session = PracticeSession::new(
      store.clone(),
      QuestionSelector::with_seed(bank, 17),
      SolutionEvaluator::default(),
    );
    (session, store)
  }

  fn equations_session() -> (PracticeSession, Arc<InMemoryLearnerStore>) {
    session_with(vec![
      fixed_question(Topic::Equations, &[("x", "2"), ("y", "3")], &["Isolate x.", "Substitute back."]),
      fixed_question(Topic::Probability, &[("x", "0.248")], &[]),
      fixed_question(Topic::Geometry, &[("perimeter", "14")], &[]),
    ])
  }

  #[tokio::test]
  async fn three_correct_answers_walk_the_level_up() {
    let (session, store) = equations_session();
    let mut path = vec![store.get_topic_level("ana", Topic::Equations).await.unwrap()];
    for _ in 0..3 {
      session.get_next_question("ana", "equations").await.unwrap();
      let out = session.submit_answer("ana", "equations", "x=2,y=3").await.unwrap();
      assert!(out.is_correct);
      path.push(out.new_level);
    }
    assert_eq!(path, vec![1.0, 1.0, 1.25, 1.75]);
    let streak = store.get_streak_state("ana").await.unwrap();
    assert_eq!(streak, StreakState { consecutive_correct: 3, consecutive_incorrect: 0 });
  }

  #[tokio::test]
  async fn question_out_hides_the_solution() {
    let (session, _) = equations_session();
    let out = session.get_next_question("ana", "equations").await.unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert!(json.get("solution").is_none());
    assert_eq!(json["equationText"], "2x + 3y = 13");
  }

  #[tokio::test]
  async fn submit_without_pending_question_fails() {
    let (session, _) = equations_session();
    assert_eq!(
      session.submit_answer("ana", "equations", "x=2").await.unwrap_err(),
      EngineError::NoActiveQuestion("ana".into())
    );
    // answered questions are cleared
    session.get_next_question("ana", "equations").await.unwrap();
    session.submit_answer("ana", "equations", "x=1, y=1").await.unwrap();
    assert!(matches!(
      session.submit_answer("ana", "equations", "x=2, y=3").await,
      Err(EngineError::NoActiveQuestion(_))
    ));
  }

  #[tokio::test]
  async fn submit_for_another_topic_is_not_accepted() {
    let (session, store) = equations_session();
    session.get_next_question("ana", "equations").await.unwrap();
    assert!(matches!(
      session.submit_answer("ana", "geometry", "perimeter=14").await,
      Err(EngineError::NoActiveQuestion(_))
    ));
    assert!(store.get_pending_question("ana").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn unreadable_answer_keeps_the_question() {
    let (session, store) = equations_session();
    session.get_next_question("ana", "equations").await.unwrap();
    assert!(matches!(
      session.submit_answer("ana", "equations", "banana").await,
      Err(EngineError::Format(_))
    ));
    assert!(store.get_pending_question("ana").await.unwrap().is_some());
    assert_eq!(store.get_streak_state("ana").await.unwrap(), StreakState::default());
    assert!(session.submit_answer("ana", "equations", "x=2, y=3").await.unwrap().is_correct);
  }

  #[tokio::test]
  async fn wrong_answers_lower_the_level_and_reset_streak() {
    let (session, store) = equations_session();
    store.set_topic_level("ana", Topic::Equations, 3.0).await.unwrap();
    store
      .set_streak_state("ana", StreakState { consecutive_correct: 4, consecutive_incorrect: 0 })
      .await
      .unwrap();

    session.get_next_question("ana", "equations").await.unwrap();
    let first = session.submit_answer("ana", "equations", "x=2, y=4").await.unwrap();
    assert_eq!((first.is_correct, first.new_level, first.level_delta), (false, 2.75, -0.25));

    session.get_next_question("ana", "equations").await.unwrap();
    let second = session.submit_answer("ana", "equations", "x=2").await.unwrap();
    assert_eq!((second.is_correct, second.new_level, second.level_delta), (false, 2.25, -0.5));
    assert_eq!(
      store.get_streak_state("ana").await.unwrap(),
      StreakState { consecutive_correct: 0, consecutive_incorrect: 2 }
    );
  }

  #[tokio::test]
  async fn bare_probability_answer_is_graded_with_tight_band() {
    let (session, _) = equations_session();
    session.get_next_question("ana", "probability").await.unwrap();
    assert!(session.submit_answer("ana", "probability", "0.25").await.unwrap().is_correct);
    session.get_next_question("ana", "probability").await.unwrap();
    assert!(!session.submit_answer("ana", "probability", "0.26").await.unwrap().is_correct);
  }

  #[tokio::test]
  async fn math_level_tracks_the_mean_of_topic_levels() {
    let (session, store) = equations_session();
    store.set_topic_level("ana", Topic::Geometry, 3.0).await.unwrap();
    store
      .set_streak_state("ana", StreakState { consecutive_correct: 1, consecutive_incorrect: 0 })
      .await
      .unwrap();
    session.get_next_question("ana", "equations").await.unwrap();
    session.submit_answer("ana", "equations", "x=2 y=3").await.unwrap();

    let progress = session.get_progress("ana").await.unwrap();
    assert_eq!(progress.topic_levels[&Topic::Equations], 1.25);
    assert_eq!(progress.math_level, 2.13);
    assert_eq!(store.get_math_level("ana").await.unwrap(), Some(2.13));
  }

  #[tokio::test]
  async fn hints_are_consumed_in_order() {
    let (session, _) = equations_session();
    assert!(matches!(session.get_hint("ana").await, Err(EngineError::NoActiveQuestion(_))));

    session.get_next_question("ana", "equations").await.unwrap();
    let h1 = session.get_hint("ana").await.unwrap();
    assert_eq!(h1, HintOutcome { hint: "Isolate x.".into(), hint_number: 1, total_hints: 2 });
    let h2 = session.get_hint("ana").await.unwrap();
    assert_eq!((h2.hint.as_str(), h2.hint_number), ("Substitute back.", 2));
    assert_eq!(
      session.get_hint("ana").await.unwrap_err(),
      EngineError::HintsExhausted { total: 2 }
    );

    // a new question restarts the hint sequence
    session.get_next_question("ana", "equations").await.unwrap();
    assert_eq!(session.get_hint("ana").await.unwrap().hint_number, 1);
  }

  #[tokio::test]
  async fn new_request_replaces_pending_question() {
    let (session, store) = equations_session();
    let first = session.get_next_question("ana", "equations").await.unwrap();
    let second = session.get_next_question("ana", "geometry").await.unwrap();
    assert_ne!(first.id, second.id);
    let pending = store.get_pending_question("ana").await.unwrap().unwrap();
    assert_eq!(pending.question.id, second.id);
    // no abandon penalty
    assert!(store.topic_levels("ana").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn invalid_topic_and_empty_pool_surface_as_errors() {
    let (session, _) = equations_session();
    assert_eq!(
      session.get_next_question("ana", "poetry").await.unwrap_err(),
      EngineError::InvalidTopic("poetry".into())
    );
    assert!(matches!(
      session.get_next_question("ana", "vectors").await,
      Err(EngineError::NoQuestionAvailable { .. })
    ));
  }

  #[tokio::test]
  async fn learners_do_not_share_pending_questions() {
    let (session, _) = equations_session();
    session.get_next_question("ana", "equations").await.unwrap();
    assert!(matches!(
      session.submit_answer("ben", "equations", "x=2, y=3").await,
      Err(EngineError::NoActiveQuestion(_))
    ));
    assert!(session.submit_answer("ana", "equations", "x=2, y=3").await.unwrap().is_correct);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_requests_keep_state_consistent() {
    let (session, store) = equations_session();
    let session = Arc::new(session);
    let mut handles = Vec::new();
    for i in 0..64 {
      let s = session.clone();
      handles.push(tokio::spawn(async move {
        if i % 2 == 0 {
          s.get_next_question("ana", "equations").await.map(|_| ())
        } else {
          s.submit_answer("ana", "equations", "x=2, y=3").await.map(|_| ())
        }
      }));
    }
    let mut graded = 0;
    for h in handles {
      match h.await.unwrap() {
        Ok(()) => graded += 1,
        Err(EngineError::NoActiveQuestion(_)) => {}
        Err(e) => panic!("unexpected error: {e}"),
      }
    }
    // 32 question requests always succeed; each submit succeeds at most once per question
    let submits_ok = graded - 32;
    assert!(submits_ok <= 32);
    let streak = store.get_streak_state("ana").await.unwrap();
    assert_eq!(streak.consecutive_correct as usize, submits_ok);
    assert_eq!(streak.consecutive_incorrect, 0);
    let level = store.get_topic_level("ana", Topic::Equations).await.unwrap();
    assert!((1.0..=5.0).contains(&level));
    assert_eq!(session.tracked_learners(), 0);
  }

  #[tokio::test]
  async fn learner_locks_are_released_after_each_call() {
    let (session, _) = equations_session();
    for i in 0..1000 {
      let err = session.get_hint(&format!("ghost-{i}")).await.unwrap_err();
      assert!(matches!(err, EngineError::NoActiveQuestion(_)));
    }
    session.get_next_question("ana", "equations").await.unwrap();
    session.submit_answer("ana", "equations", "x=2, y=3").await.unwrap();
    session.get_progress("ana").await.unwrap();
    assert_eq!(session.tracked_learners(), 0);
  }

  #[tokio::test]
  async fn builtin_content_end_to_end() {
    let bank: Arc<dyn QuestionBank> = Arc::new(StaticBank::with_builtin(&[]));
    let store = Arc::new(InMemoryLearnerStore::new());
    let session = PracticeSession::new(
      store.clone(),
      QuestionSelector::with_seed(bank, 8),
      SolutionEvaluator::default(),
    );
    for topic in Topic::ALL {
      let out = session.get_next_question("ana", topic.as_str()).await.unwrap();
      assert!(out.difficulty <= 1);
      let pending = store.get_pending_question("ana").await.unwrap().unwrap();
      let answer = pending
        .question
        .solution
        .final_answers
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
      let res = session.submit_answer("ana", topic.as_str(), &answer).await.unwrap();
      assert!(res.is_correct, "{topic}: {answer}");
    }
  }
}
