//! REST endpoint wrappers over the [`Gateway`].
//!
//! Every function goes through the gateway, so credential attachment, 401
//! handling and envelope normalization are uniform. Each one then narrows the
//! `NormalizedResponse` to a typed result.
//!
//! ERROR HANDLING
//! ==============
//! Callers get `Result<_, String>` carrying the user-facing message, so pages
//! can show failures inline without crashing the app.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde_json::Value;

use super::gateway::Gateway;
use super::transport::Transport;
use super::types::{
    AnswerResponse, AskRequest, HistoryPayload, KnowledgeEntry, QuestionRecord, QuestionStats, RegisterRequest,
    SessionStatus, UserDto,
};
use crate::routing::encode_query_value;

const REGISTER_PATH: &str = "/api/auth/register";
const CURRENT_USER_PATH: &str = "/api/auth/current";
const CHECK_SESSION_PATH: &str = "/api/auth/check";
const ASK_PATH: &str = "/api/question/ask";
const HISTORY_PATH: &str = "/api/question/history";
const STATS_PATH: &str = "/api/question/stats";
const HEALTH_PATH: &str = "/api/question/health";
const SPRING_HEALTH_PATH: &str = "/api/question/spring-health";
const ADMIN_USERS_PATH: &str = "/api/admin/users";

fn history_item_endpoint(id: &str) -> String {
    format!("{HISTORY_PATH}/{}", encode_query_value(id))
}

fn knowledge_query_endpoint(keyword: &str) -> String {
    format!("/api/knowledge/query/{}", encode_query_value(keyword.trim()))
}

fn admin_user_endpoint(user_id: &str) -> String {
    format!("{ADMIN_USERS_PATH}/{}", encode_query_value(user_id))
}

fn admin_user_history_endpoint(user_id: &str) -> String {
    format!("{}/history", admin_user_endpoint(user_id))
}

fn validate_question(question: &str) -> Result<String, String> {
    let question = question.trim();
    if question.is_empty() {
        return Err("Please enter a question.".to_owned());
    }
    Ok(question.to_owned())
}

// =============================================================================
// Auth
// =============================================================================

/// Create an account via `POST /api/auth/register`. Does not sign in.
///
/// # Errors
///
/// Returns the backend message if registration is rejected.
pub async fn register<T: Transport>(gateway: &Gateway<T>, request: &RegisterRequest) -> Result<(), String> {
    gateway.post_public(REGISTER_PATH, request).await.into_unit()
}

/// Fetch the signed-in user from `GET /api/auth/current`.
///
/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn current_user<T: Transport>(gateway: &Gateway<T>) -> Result<UserDto, String> {
    gateway.get(CURRENT_USER_PATH, &[]).await.into_data()
}

/// Ask the backend whether the current token is still accepted. Used at
/// startup to drop a stored session the backend no longer recognizes.
///
/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn check_session<T: Transport>(gateway: &Gateway<T>) -> Result<SessionStatus, String> {
    gateway.get(CHECK_SESSION_PATH, &[]).await.into_data()
}

// =============================================================================
// Questions
// =============================================================================

/// Submit a medical question via `POST /api/question/ask`.
///
/// # Errors
///
/// Returns a validation message for a blank question, or the gateway message.
pub async fn ask_question<T: Transport>(gateway: &Gateway<T>, question: &str) -> Result<AnswerResponse, String> {
    let request = AskRequest { question: validate_question(question)? };
    gateway.post(ASK_PATH, &request).await.into_data()
}

/// The signed-in user's question history, newest first as the backend sends it.
///
/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn question_history<T: Transport>(gateway: &Gateway<T>) -> Result<Vec<QuestionRecord>, String> {
    gateway.get(HISTORY_PATH, &[]).await.into_data::<HistoryPayload>().map(HistoryPayload::into_records)
}

/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn delete_history_item<T: Transport>(gateway: &Gateway<T>, id: &str) -> Result<(), String> {
    gateway.delete(&history_item_endpoint(id), &[]).await.into_unit()
}

/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn clear_history<T: Transport>(gateway: &Gateway<T>) -> Result<(), String> {
    gateway.delete(HISTORY_PATH, &[]).await.into_unit()
}

/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn question_stats<T: Transport>(gateway: &Gateway<T>) -> Result<QuestionStats, String> {
    gateway.get(STATS_PATH, &[]).await.into_data()
}

/// Public liveness probe of the question service.
///
/// # Errors
///
/// Returns the gateway message if the service is down.
pub async fn health<T: Transport>(gateway: &Gateway<T>) -> Result<Value, String> {
    gateway.get_public(HEALTH_PATH, &[]).await.into_data()
}

/// Public liveness probe of the backend itself.
///
/// # Errors
///
/// Returns the gateway message if the backend is down.
pub async fn spring_health<T: Transport>(gateway: &Gateway<T>) -> Result<Value, String> {
    gateway.get_public(SPRING_HEALTH_PATH, &[]).await.into_data()
}

// =============================================================================
// Knowledge
// =============================================================================

/// Knowledge-graph lookup for a drug or disease keyword.
///
/// # Errors
///
/// Returns the gateway message, e.g. "Endpoint not found" for an unknown
/// keyword.
pub async fn query_knowledge<T: Transport>(gateway: &Gateway<T>, keyword: &str) -> Result<KnowledgeEntry, String> {
    gateway.get(&knowledge_query_endpoint(keyword), &[]).await.into_data()
}

// =============================================================================
// Admin
// =============================================================================

/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn list_users<T: Transport>(gateway: &Gateway<T>) -> Result<Vec<UserDto>, String> {
    gateway.get(ADMIN_USERS_PATH, &[]).await.into_data()
}

/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn delete_user<T: Transport>(gateway: &Gateway<T>, user_id: &str) -> Result<(), String> {
    gateway.delete(&admin_user_endpoint(user_id), &[]).await.into_unit()
}

/// # Errors
///
/// Returns the gateway message on any failure.
pub async fn user_history<T: Transport>(gateway: &Gateway<T>, user_id: &str) -> Result<Vec<QuestionRecord>, String> {
    gateway
        .get(&admin_user_history_endpoint(user_id), &[])
        .await
        .into_data::<HistoryPayload>()
        .map(HistoryPayload::into_records)
}
