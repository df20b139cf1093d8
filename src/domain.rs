//! Domain models used by the engine: topics, questions, solutions, learner state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Fixed set of math topics a question can belong to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
  Equations,
  Trigonometry,
  Vectors,
  Complex,
  Calculus,
  Sequences,
  Geometry,
  Probability,
}

impl Topic {
  pub const ALL: [Topic; 8] = [
    Topic::Equations,
    Topic::Trigonometry,
    Topic::Vectors,
    Topic::Complex,
    Topic::Calculus,
    Topic::Sequences,
    Topic::Geometry,
    Topic::Probability,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Topic::Equations => "equations",
      Topic::Trigonometry => "trigonometry",
      Topic::Vectors => "vectors",
      Topic::Complex => "complex",
      Topic::Calculus => "calculus",
      Topic::Sequences => "sequences",
      Topic::Geometry => "geometry",
      Topic::Probability => "probability",
    }
  }
}

impl fmt::Display for Topic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Topic {
  type Err = EngineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let key = s.trim().to_lowercase();
    Topic::ALL
      .iter()
      .copied()
      .find(|t| t.as_str() == key)
      .ok_or_else(|| EngineError::InvalidTopic(s.to_string()))
  }
}

/// A numeric-like expected answer. Content may store numbers or strings
/// ("0.707", "1/3", "i"); numeric coercion happens at comparison time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnswerValue {
  Number(f64),
  Text(String),
}

impl AnswerValue {
  /// Finite numeric value, if this coerces to one.
  pub fn as_number(&self) -> Option<f64> {
    let n = match self {
      AnswerValue::Number(n) => *n,
      AnswerValue::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    n.is_finite().then_some(n)
  }

  /// Empty values are never checked.
  pub fn is_empty(&self) -> bool {
    match self {
      AnswerValue::Number(n) => n.is_nan(),
      AnswerValue::Text(s) => s.trim().is_empty(),
    }
  }
}

impl fmt::Display for AnswerValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AnswerValue::Number(n) => write!(f, "{}", n),
      AnswerValue::Text(s) => f.write_str(s),
    }
  }
}

impl From<f64> for AnswerValue {
  fn from(n: f64) -> Self { AnswerValue::Number(n) }
}

impl From<i64> for AnswerValue {
  fn from(n: i64) -> Self { AnswerValue::Number(n as f64) }
}

impl From<&str> for AnswerValue {
  fn from(s: &str) -> Self { AnswerValue::Text(s.to_string()) }
}

impl From<String> for AnswerValue {
  fn from(s: String) -> Self { AnswerValue::Text(s) }
}

/// Worked solution. `steps` are display-only; `final_answers` drive grading.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
  #[serde(default)] pub steps: Vec<String>,
  pub final_answers: BTreeMap<String, AnswerValue>,
}

/// One materialized question, as produced by a bank generator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: String,
  pub topic: Topic,
  pub difficulty: u32,
  pub description: String,
  pub equation_text: String,
  pub solution: Solution,
  #[serde(default)] pub hints: Vec<String>,
}

/// Fresh opaque id drawn from the caller's random source, so seeded
/// generation stays reproducible.
pub fn fresh_id(rng: &mut dyn RngCore) -> String {
  uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

/// Variable name → value, as read from a learner's free text.
pub type ParsedAnswer = BTreeMap<String, f64>;

/// Consecutive same-outcome answers, tracked per learner across topics.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
  pub consecutive_correct: u32,
  pub consecutive_incorrect: u32,
}

/// The single in-flight question of a learner.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuestion {
  pub question: Question,
  pub issued_at: DateTime<Utc>,
  pub hints_used: usize,
}

impl PendingQuestion {
  pub fn new(question: Question) -> Self {
    Self { question, issued_at: Utc::now(), hints_used: 0 }
  }
}
