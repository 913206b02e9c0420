//! Wire DTOs for the medical Q&A backend.
//!
//! DESIGN
//! ======
//! The backend mixes numeric and string identifiers and camelCase field
//! names. These types absorb that at the serde layer so pages and state
//! modules only ever see one shape.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Account role. Ordered by privilege: `Admin` > `User` > `Guest`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Guest,
    User,
    Admin,
}

impl Role {
    /// Parse a wire role. Case-insensitive, tolerates a Spring `ROLE_`
    /// prefix, and maps unknown names to `Guest`.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(&upper) {
            "ADMIN" => Self::Admin,
            "USER" => Self::User,
            _ => Self::Guest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "GUEST",
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    fn level(self) -> u8 {
        match self {
            Self::Guest => 1,
            Self::User => 2,
            Self::Admin => 3,
        }
    }

    /// Whether this role grants access to something gated on `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self.level() >= required.level()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Identity of the signed-in user, as persisted under the user-info key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Payload of a successful `POST /api/auth/login`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserDto>,
}

/// User record as returned by auth and admin endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub create_at: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Result of `GET /api/auth/check`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub session_valid: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub question: String,
}

/// Answer produced by `POST /api/question/ask`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub answer: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub question_id: Option<String>,
    #[serde(default)]
    pub disclaimer: Option<String>,
    #[serde(default)]
    pub identified_intent: Option<String>,
    #[serde(default)]
    pub identified_keywords: Vec<String>,
    #[serde(default)]
    pub source_info: Option<String>,
}

/// One asked question with its stored answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// History endpoints answer with a bare list, a Spring page, or a
/// per-user wrapper depending on the route.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HistoryPayload {
    List(Vec<QuestionRecord>),
    Page { content: Vec<QuestionRecord> },
    PerUser {
        #[serde(rename = "questionAnswers")]
        question_answers: Vec<QuestionRecord>,
    },
}

impl HistoryPayload {
    pub fn into_records(self) -> Vec<QuestionRecord> {
        match self {
            Self::List(records) | Self::Page { content: records } | Self::PerUser { question_answers: records } => {
                records
            }
        }
    }
}

/// Free-form counters from `GET /api/question/stats`.
pub type QuestionStats = BTreeMap<String, serde_json::Value>;

/// Knowledge-graph facts for one keyword (symptoms, drugs, diet, ...).
pub type KnowledgeEntry = BTreeMap<String, serde_json::Value>;

fn id_from_value<E: serde::de::Error>(value: serde_json::Value) -> Result<Option<String>, E> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(E::custom("expected string or number id")),
    }
}

/// Accept ids sent as either JSON numbers or strings.
pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    id_from_value(value)
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    id_from_value(value)?.ok_or_else(|| D::Error::custom("missing id"))
}
