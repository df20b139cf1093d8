//! Answer verification against a question's `finalAnswers`.
//!
//! Generated content is full of irrational and repeating decimals (`√2/2`,
//! `1/3`, trig values), so numeric comparison is tolerant. The tolerance
//! profile is picked per answer key through a small lookup table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{AnswerValue, ParsedAnswer, Topic};
use crate::util::{normalize, round_to};

// Absorbs binary representation noise at the band edges.
const EPSILON: f64 = 1e-9;

/// Numeric acceptance bands. Loaded from the `[tolerance]` TOML table.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tolerance {
  pub absolute: f64,
  pub relative: f64,
  pub probability_absolute: f64,
  pub probability_decimals: u32,
}

/// Beyond this many places rounding no longer fits an f64.
pub const MAX_PROBABILITY_DECIMALS: u32 = 12;

impl Tolerance {
  /// Reject bands that are negative or not finite, and absurd rounding.
  pub fn validate(&self) -> Result<(), String> {
    for (name, band) in [
      ("absolute", self.absolute),
      ("relative", self.relative),
      ("probability_absolute", self.probability_absolute),
    ] {
      if !band.is_finite() || band < 0.0 {
        return Err(format!("tolerance.{name} must be a non-negative number, got {band}"));
      }
    }
    if self.probability_decimals > MAX_PROBABILITY_DECIMALS {
      return Err(format!(
        "tolerance.probability_decimals must be <= {MAX_PROBABILITY_DECIMALS}, got {}",
        self.probability_decimals
      ));
    }
    Ok(())
  }
}

impl Default for Tolerance {
  fn default() -> Self {
    Self { absolute: 0.01, relative: 0.01, probability_absolute: 0.005, probability_decimals: 3 }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToleranceProfile {
  /// Exact, absolute or relative match.
  General,
  /// Rounded, then a tighter absolute band.
  Probability,
}

/// (answer key, topic restriction, profile). First match wins.
const PROFILE_TABLE: &[(&str, Option<Topic>, ToleranceProfile)] = &[
  ("probability", None, ToleranceProfile::Probability),
  ("x", Some(Topic::Probability), ToleranceProfile::Probability),
];

/// Tolerance profile for one answer key of a question in `topic`.
pub fn profile_for(key: &str, topic: Topic) -> ToleranceProfile {
  PROFILE_TABLE
    .iter()
    .find(|(k, only, _)| *k == key && only.map_or(true, |t| t == topic))
    .map(|(_, _, p)| *p)
    .unwrap_or(ToleranceProfile::General)
}

#[derive(Clone, Debug, Default)]
pub struct SolutionEvaluator {
  tolerance: Tolerance,
}

impl SolutionEvaluator {
  pub fn new(tolerance: Tolerance) -> Self {
    Self { tolerance }
  }

  pub fn tolerance(&self) -> &Tolerance {
    &self.tolerance
  }

  /// True when every non-empty expected key is present in `parsed` and matches.
  ///
  /// Content with no checkable key at all is treated as unanswerable, so the
  /// attempt counts as incorrect rather than trivially correct.
  pub fn is_correct(
    &self,
    parsed: &ParsedAnswer,
    expected: &BTreeMap<String, AnswerValue>,
    topic: Topic,
  ) -> bool {
    let mut checked = 0usize;
    for (key, want) in expected.iter().filter(|(_, v)| !v.is_empty()) {
      checked += 1;
      let Some(got) = parsed.get(key) else {
        debug!(target: "practice", %key, "Expected key missing from answer");
        return false;
      };
      let profile = profile_for(key, topic);
      if !self.compare_values(&AnswerValue::Number(*got), want, profile) {
        debug!(target: "practice", %key, got, want = %want, ?profile, "Answer value mismatch");
        return false;
      }
    }
    if checked == 0 {
      warn!(target: "practice", %topic, "Question has no checkable final answers; grading as incorrect");
    }
    checked > 0
  }

  /// Compare one learner value to one expected value under `profile`.
  pub fn compare_values(
    &self,
    actual: &AnswerValue,
    expected: &AnswerValue,
    profile: ToleranceProfile,
  ) -> bool {
    match (actual.as_number(), expected.as_number()) {
      (Some(a), Some(e)) => match profile {
        ToleranceProfile::General => self.numbers_match(a, e),
        ToleranceProfile::Probability => self.probabilities_match(a, e),
      },
      _ => normalize(&actual.to_string()) == normalize(&expected.to_string()),
    }
  }

  fn numbers_match(&self, actual: f64, expected: f64) -> bool {
    if actual == expected {
      return true;
    }
    let diff = (actual - expected).abs();
    if diff <= self.tolerance.absolute + EPSILON {
      return true;
    }
    expected != 0.0 && diff / expected.abs() <= self.tolerance.relative + EPSILON
  }

  fn probabilities_match(&self, actual: f64, expected: f64) -> bool {
    let places = self.tolerance.probability_decimals;
    let (a, e) = (round_to(actual, places), round_to(expected, places));
    a == e || (a - e).abs() <= self.tolerance.probability_absolute + EPSILON
  }
}
