//! Streak-gated topic level updates.
//!
//! Not an IRT model: the rule is meant to be legible to learners
//! ("three in a row to level up"). A single correct answer never raises the
//! level; a single miss always lowers it a little.

use serde::Serialize;

use crate::domain::StreakState;
use crate::util::round_to;

pub const MIN_LEVEL: f64 = 1.0;
pub const MAX_LEVEL: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpdate {
  pub new_level: f64,
  /// Effective change after clamping, rounded to 2 places.
  pub level_delta: f64,
  pub streak: StreakState,
}

/// Step size for an answer outcome, given the streak *after* counting it.
fn step_for(is_correct: bool, streak: &StreakState) -> f64 {
  if is_correct {
    match streak.consecutive_correct {
      n if n >= 3 => 0.5,
      2 => 0.25,
      _ => 0.0,
    }
  } else if streak.consecutive_incorrect >= 2 {
    -0.5
  } else {
    -0.25
  }
}

/// Apply one graded answer to the current topic level.
pub fn next_level(current: f64, is_correct: bool, streak: StreakState) -> LevelUpdate {
  let streak = if is_correct {
    StreakState {
      consecutive_correct: streak.consecutive_correct.saturating_add(1),
      consecutive_incorrect: 0,
    }
  } else {
    StreakState {
      consecutive_correct: 0,
      consecutive_incorrect: streak.consecutive_incorrect.saturating_add(1),
    }
  };

  let start = clamp_level(current);
  let new_level = round_to(clamp_level(start + step_for(is_correct, &streak)), 2);
  LevelUpdate {
    new_level,
    level_delta: round_to(new_level - start, 2),
    streak,
  }
}

/// Clamp into `[MIN_LEVEL, MAX_LEVEL]`; non-finite input falls back to the floor.
pub fn clamp_level(level: f64) -> f64 {
  if level.is_finite() {
    level.clamp(MIN_LEVEL, MAX_LEVEL)
  } else {
    MIN_LEVEL
  }
}

/// Aggregate math level: mean of every recorded topic level.
pub fn math_level<I>(levels: I) -> f64
where
  I: IntoIterator<Item = f64>,
{
  let (sum, count) = levels.into_iter().fold((0.0, 0usize), |(s, c), l| (s + l, c + 1));
  if count == 0 {
    MIN_LEVEL
  } else {
    round_to(sum / count as f64, 2)
  }
}
