//! Adaptive math practice engine.
//!
//! Picks questions at a learner's mastery level, grades free-text answers with
//! tolerant numeric comparison, and moves per-topic levels with a streak-gated
//! rule. The HTTP/WebSocket surface in `routes` is a thin shell over
//! [`session::PracticeSession`].

pub mod bank;
pub mod config;
pub mod difficulty;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod selector;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;
