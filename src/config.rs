//! Loading engine configuration (tolerances + optional static question bank) from TOML.
//!
//! See `EngineConfig` and `QuestionCfg` for the expected schema:
//!
//! ```toml
//! rng_seed = 42
//!
//! [tolerance]
//! absolute = 0.01
//! relative = 0.01
//! probability_absolute = 0.005
//! probability_decimals = 3
//!
//! [[questions]]
//! topic = "equations"
//! difficulty = 1
//! description = "Solve for x"
//! equation = "2x + 3 = 7"
//! steps = ["2x = 4", "x = 2"]
//! hints = ["Move 3 to the right side first."]
//! final_answers = { x = "2" }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::AnswerValue;
use crate::evaluator::Tolerance;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct EngineConfig {
  /// Fixed seed for question selection/generation. Random when absent.
  #[serde(default)]
  pub rng_seed: Option<u64>,
  #[serde(default)]
  pub tolerance: Tolerance,
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

/// Static question entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default)] pub id: Option<String>,
  pub topic: String,
  pub difficulty: u32,
  #[serde(default)] pub description: String,
  #[serde(default)] pub equation: String,
  #[serde(default)] pub steps: Vec<String>,
  pub final_answers: BTreeMap<String, AnswerValue>,
  #[serde(default)] pub hints: Vec<String>,
}

impl EngineConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    let cfg: Self = toml::from_str(s)?;
    cfg.tolerance.validate().map_err(<toml::de::Error as serde::de::Error>::custom)?;
    Ok(cfg)
  }
}

/// Attempt to load `EngineConfig` from ENGINE_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_engine_config_from_env() -> Option<EngineConfig> {
  let path = std::env::var("ENGINE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match EngineConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "mathtutor_engine", %path, questions = cfg.questions.len(), "Loaded engine config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "mathtutor_engine", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "mathtutor_engine", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_document_gives_defaults() {
    let cfg = EngineConfig::from_toml_str("").unwrap();
    assert_eq!(cfg.rng_seed, None);
    assert_eq!(cfg.tolerance, Tolerance::default());
    assert!(cfg.questions.is_empty());
  }

  #[test]
  fn full_document() {
    let cfg = EngineConfig::from_toml_str(
      r#"
rng_seed = 42

[tolerance]
probability_absolute = 0.002

[[questions]]
topic = "probability"
difficulty = 2
description = "Two coins"
equation = "P(HH)"
hints = ["Multiply"]
final_answers = { probability = 0.25 }

[[questions]]
id = "eq-1"
topic = "equations"
difficulty = 1
final_answers = { x = "2", y = "-1" }
"#,
    )
    .unwrap();
    assert_eq!(cfg.rng_seed, Some(42));
    assert_eq!(cfg.tolerance.probability_absolute, 0.002);
    assert_eq!(cfg.tolerance.absolute, 0.01);
    assert_eq!(cfg.questions.len(), 2);
    assert_eq!(cfg.questions[0].final_answers["probability"], AnswerValue::Number(0.25));
    assert_eq!(cfg.questions[1].id.as_deref(), Some("eq-1"));
    assert_eq!(cfg.questions[1].final_answers["y"], AnswerValue::Text("-1".into()));
  }

  #[test]
  fn out_of_range_tolerances_are_rejected() {
    for doc in [
      "[tolerance]\nprobability_decimals = 400\n",
      "[tolerance]\nabsolute = -0.1\n",
      "[tolerance]\nrelative = nan\n",
    ] {
      let err = EngineConfig::from_toml_str(doc).unwrap_err();
      assert!(err.to_string().contains("tolerance."), "{doc}: {err}");
    }
    let cfg = EngineConfig::from_toml_str("[tolerance]\nprobability_decimals = 12\n").unwrap();
    assert_eq!(cfg.tolerance.probability_decimals, 12);
  }

  #[test]
  fn missing_final_answers_is_a_parse_error() {
    let err = EngineConfig::from_toml_str("[[questions]]\ntopic = \"equations\"\ndifficulty = 1\n");
    assert!(err.is_err());
  }
}
