//! Answer validator: decides whether a free-text answer fills a field.
//!
//! The semantic judgement is delegated to the validation oracle. This module
//! owns the reply contract: the oracle must return one JSON object, which is
//! checked against the closed field set and normalized. Anything else fails
//! loud as `ValidationMalformed`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::DialogueError;

use super::oracle::{ValidationOracle, with_deadline};
use super::prompts::{validation_instruction, validation_user_message};
use super::schema::FieldRegistry;

/// Outcome of validating one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// `field_name` is always a registry member. `value` may be empty when
    /// the user declined to answer.
    Accepted { field_name: String, value: String },
    /// User-correctable; `explanation` is shown to the user.
    Rejected { explanation: String },
}

/// Validates answers against the registry through the validation oracle.
pub struct AnswerValidator {
    oracle: Arc<dyn ValidationOracle>,
    registry: Arc<FieldRegistry>,
    instruction: String,
    timeout: Duration,
}

impl AnswerValidator {
    pub fn new(oracle: Arc<dyn ValidationOracle>, registry: Arc<FieldRegistry>, timeout: Duration) -> Self {
        let instruction = validation_instruction(&registry);
        Self {
            oracle,
            registry,
            instruction,
            timeout,
        }
    }

    /// Validate `user_answer` given the outstanding question.
    ///
    /// `last_question_context` may be empty when the caller does not track it.
    pub async fn validate(
        &self,
        last_question_context: &str,
        user_answer: &str,
    ) -> Result<ValidationOutcome, DialogueError> {
        let user_message = validation_user_message(last_question_context, user_answer);
        debug!(answer = %user_answer, "Validating answer");

        let raw = with_deadline(
            self.timeout,
            self.oracle.complete(&self.instruction, &user_message),
        )
        .await?;

        let outcome = parse_validation_reply(&raw, &self.registry).inspect_err(|e| {
            if let DialogueError::ValidationMalformed { reason, raw } = e {
                warn!(reason = %reason, raw_response = %raw, "Malformed validation reply");
            }
        })?;

        match &outcome {
            ValidationOutcome::Accepted { field_name, value } => {
                debug!(field = %field_name, empty = value.is_empty(), "Answer accepted");
            }
            ValidationOutcome::Rejected { .. } => debug!("Answer rejected"),
        }
        Ok(outcome)
    }
}

// ── Reply parsing ───────────────────────────────────────────────────

/// Raw validation reply.
///
/// Accepts `{"type": "yes", "field_name": F, "value": V}` and the compact
/// `{"type": "yes", F: V}`. A rejection may name the outstanding field.
#[derive(Debug, Deserialize)]
struct ValidationReply {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    field_name: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Parse an oracle reply into an outcome.
pub fn parse_validation_reply(raw: &str, registry: &FieldRegistry) -> Result<ValidationOutcome, DialogueError> {
    let malformed = |reason: String| DialogueError::ValidationMalformed {
        reason,
        raw: raw.to_string(),
    };

    let json = strip_wrapping(raw);
    let reply: ValidationReply =
        serde_json::from_str(json).map_err(|e| malformed(format!("JSON parse error: {e}")))?;

    match reply.kind.trim().to_ascii_lowercase().as_str() {
        "yes" | "accepted" => {
            let (field_name, value) = match reply.field_name {
                Some(name) => (name, reply.value.unwrap_or(Value::Null)),
                None => {
                    let mut entries = reply.rest.into_iter();
                    match (entries.next(), entries.next()) {
                        (Some(entry), None) => entry,
                        _ => return Err(malformed("accepted reply has no single field".to_string())),
                    }
                }
            };

            let field_name = field_name.trim().to_string();
            let Some(field) = registry.get(&field_name) else {
                return Err(malformed(format!("unknown field name '{field_name}'")));
            };

            let value = value_text(value).ok_or_else(|| malformed(format!("value for '{field_name}' is not a scalar")))?;
            let value = field.normalizer.normalize(&value);

            Ok(ValidationOutcome::Accepted { field_name, value })
        }
        "no" | "rejected" => {
            let mut explanation = reply.message.map(|m| m.trim().to_string()).unwrap_or_default();
            if explanation.is_empty() {
                return Err(malformed("rejected reply has no message".to_string()));
            }
            let example = reply
                .field_name
                .as_deref()
                .and_then(|name| registry.example_for(name.trim()))
                .filter(|example| !explanation.contains(example));
            if let Some(example) = example {
                explanation.push_str(&format!(" For example: {example}"));
            }
            Ok(ValidationOutcome::Rejected { explanation })
        }
        other => Err(malformed(format!("unknown reply type '{other}'"))),
    }
}

/// Strip surrounding whitespace, code fences, and a leading language tag.
fn strip_wrapping(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(inner) = text.strip_prefix("```") {
        text = inner;
        if let Some(inner) = text.strip_suffix("```") {
            text = inner;
        }
        text = text.trim_start();
    }

    if text.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
        text = &text[4..];
    }

    text.trim()
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if b { "Yes" } else { "No" }.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
