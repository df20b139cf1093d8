//! HTTP endpoint handlers. These are thin wrappers that forward to the practice session.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{
    rejection::{JsonRejection, QueryRejection},
    FromRequest, FromRequestParts, State,
  },
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::domain::Topic;
use crate::error::EngineError;
use crate::protocol::*;
use crate::session::{HintOutcome, Progress, SubmitOutcome};
use crate::state::AppState;

/// Engine error rendered as a JSON body with the matching status code.
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
  fn from(e: EngineError) -> Self { ApiError(e) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError(EngineError::BadRequest(r.body_text())) }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError(EngineError::BadRequest(r.body_text())) }
}

/// `Query` whose rejection is rendered as an `ApiError` JSON body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Json` request body whose rejection is rendered as an `ApiError` JSON body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warn!(target: "mathtutor_engine", status = status.as_u16(), error = %self.0, "Request failed");
    (status, Json(ErrorOut::from(&self.0))).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_topics() -> impl IntoResponse {
  Json(TopicsOut { topics: Topic::ALL.to_vec() })
}

#[instrument(level = "info", skip_all, fields(learner_id = %q.learner_id, topic = %q.topic))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<QuestionQuery>,
) -> Result<Json<QuestionOut>, ApiError> {
  let out = state.session.get_next_question(&q.learner_id, &q.topic).await?;
  info!(target: "practice", learner_id = %q.learner_id, id = %out.id, difficulty = out.difficulty, "HTTP question served");
  Ok(Json(out))
}

#[instrument(level = "info", skip_all, fields(learner_id = %body.learner_id, topic = %body.topic, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<AnswerIn>,
) -> Result<Json<SubmitOutcome>, ApiError> {
  let outcome = state.session.submit_answer(&body.learner_id, &body.topic, &body.answer).await?;
  info!(target: "practice", learner_id = %body.learner_id, correct = outcome.is_correct, new_level = outcome.new_level, "HTTP submit_answer evaluated");
  Ok(Json(outcome))
}

#[instrument(level = "info", skip_all, fields(learner_id = %q.learner_id))]
pub async fn http_get_hint(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<LearnerQuery>,
) -> Result<Json<HintOutcome>, ApiError> {
  let hint = state.session.get_hint(&q.learner_id).await?;
  info!(target: "practice", learner_id = %q.learner_id, hint_number = hint.hint_number, "HTTP hint served");
  Ok(Json(hint))
}

#[instrument(level = "info", skip_all, fields(learner_id = %q.learner_id))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  ApiQuery(q): ApiQuery<LearnerQuery>,
) -> Result<Json<Progress>, ApiError> {
  Ok(Json(state.session.get_progress(&q.learner_id).await?))
}
