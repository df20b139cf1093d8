//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Question, Topic};
use crate::error::EngineError;
use crate::session::{HintOutcome, Progress, SubmitOutcome};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NextQuestion {
        #[serde(rename = "learnerId")]
        learner_id: String,
        topic: String,
    },
    SubmitAnswer {
        #[serde(rename = "learnerId")]
        learner_id: String,
        topic: String,
        answer: String,
    },
    Hint {
        #[serde(rename = "learnerId")]
        learner_id: String,
    },
    Progress {
        #[serde(rename = "learnerId")]
        learner_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        question: QuestionOut,
    },
    AnswerResult(SubmitOutcome),
    Hint(HintOutcome),
    Progress(Progress),
    Error {
        code: String,
        message: String,
    },
}

impl From<EngineError> for ServerWsMessage {
    fn from(e: EngineError) -> Self {
        ServerWsMessage::Error { code: e.code().to_string(), message: e.to_string() }
    }
}

/// DTO used by both WS and HTTP for question delivery. Never carries the solution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    pub topic: Topic,
    pub difficulty: u32,
    pub description: String,
    pub equation_text: String,
    pub hints_available: usize,
}

/// Convert full `Question` (internal) to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    QuestionOut {
        id: q.id.clone(),
        topic: q.topic,
        difficulty: q.difficulty,
        description: q.description.clone(),
        equation_text: q.equation_text.clone(),
        hints_available: q.hints.len(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    #[serde(rename = "learnerId")]
    pub learner_id: String,
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct LearnerQuery {
    #[serde(rename = "learnerId")]
    pub learner_id: String,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "learnerId")]
    pub learner_id: String,
    pub topic: String,
    pub answer: String,
}

#[derive(Serialize)]
pub struct TopicsOut {
    pub topics: Vec<Topic>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorOut {
    pub error: String,
    pub message: String,
}

impl From<&EngineError> for ErrorOut {
    fn from(e: &EngineError) -> Self {
        ErrorOut { error: e.code().to_string(), message: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"submit_answer","learnerId":"l1","topic":"equations","answer":"x=2"}"#)
                .unwrap();
        match m {
            ClientWsMessage::SubmitAnswer { learner_id, topic, answer } => {
                assert_eq!((learner_id.as_str(), topic.as_str(), answer.as_str()), ("l1", "equations", "x=2"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn server_messages_inline_outcomes() {
        let msg = ServerWsMessage::AnswerResult(SubmitOutcome {
            is_correct: true,
            new_level: 1.25,
            level_delta: 0.25,
        });
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "answer_result");
        assert_eq!(v["isCorrect"], true);
        assert_eq!(v["newLevel"], 1.25);

        let err: ServerWsMessage = EngineError::HintsExhausted { total: 2 }.into();
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["code"], "hints_exhausted");
    }
}
