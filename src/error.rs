//! Engine error taxonomy.
//!
//! Every variant is a local, recoverable condition. The engine never retries;
//! callers (HTTP/WS handlers) decide what to surface to the learner.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The raw answer text did not yield a single variable/value pair.
    #[error("could not read an answer from '{0}'")]
    Format(String),

    /// The topic key is not part of the fixed topic set.
    #[error("unknown topic: {0}")]
    InvalidTopic(String),

    /// The bank has nothing for this topic at or below the requested tier.
    #[error("no question available for topic '{topic}' at difficulty <= {tier}")]
    NoQuestionAvailable { topic: String, tier: u32 },

    /// Submit or hint without a pending question.
    #[error("no active question for learner '{0}'")]
    NoActiveQuestion(String),

    /// Every hint of the pending question was already handed out.
    #[error("all {total} hints already used")]
    HintsExhausted { total: usize },

    /// The request itself was malformed (missing field, bad JSON body).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A learner store backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// HTTP status code the calling layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            EngineError::Format(_) => 422,
            EngineError::InvalidTopic(_) | EngineError::BadRequest(_) => 400,
            EngineError::NoQuestionAvailable { .. } => 404,
            EngineError::NoActiveQuestion(_) | EngineError::HintsExhausted { .. } => 409,
            EngineError::Storage(_) => 500,
        }
    }

    /// Stable snake_case code for JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Format(_) => "format_error",
            EngineError::InvalidTopic(_) => "invalid_topic",
            EngineError::NoQuestionAvailable { .. } => "no_question_available",
            EngineError::NoActiveQuestion(_) => "no_active_question",
            EngineError::HintsExhausted { .. } => "hints_exhausted",
            EngineError::BadRequest(_) => "bad_request",
            EngineError::Storage(_) => "storage_error",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        let errs = [
            EngineError::Format("banana".into()),
            EngineError::InvalidTopic("poetry".into()),
            EngineError::NoQuestionAvailable { topic: "equations".into(), tier: 1 },
            EngineError::NoActiveQuestion("l1".into()),
            EngineError::HintsExhausted { total: 2 },
            EngineError::BadRequest("missing field `learnerId`".into()),
        ];
        for e in errs {
            assert!((400..500).contains(&e.status()), "{e} -> {}", e.status());
        }
        assert_eq!(EngineError::Storage("down".into()).status(), 500);
    }

    #[test]
    fn messages_name_the_offending_input() {
        let e = EngineError::InvalidTopic("poetry".into());
        assert_eq!(e.to_string(), "unknown topic: poetry");
        assert_eq!(e.code(), "invalid_topic");
    }
}
