//! DialogueController: runs one turn of the slot-filling conversation.
//!
//! Stateless per call: the caller passes the latest message and whether it is
//! the first turn of the session. Nothing is remembered between calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::DialogueError;

use super::oracle::{DialogueOracle, ValidationOracle, with_deadline};
use super::parser::parse_reply;
use super::prompts::dialogue_instruction;
use super::schema::FieldRegistry;
use super::validator::{AnswerValidator, ValidationOutcome};

/// One user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// The user's latest raw input.
    pub message: String,
    /// First turn of the session (no field confirmed yet).
    #[serde(default)]
    pub is_first: bool,
    /// The assistant question this message answers, when the caller keeps
    /// the conversation log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_question: Option<String>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>, is_first: bool) -> Self {
        Self {
            message: message.into(),
            is_first,
            last_question: None,
        }
    }

    pub fn with_last_question(mut self, question: impl Into<String>) -> Self {
        self.last_question = Some(question.into());
        self
    }
}

/// Result of one turn. `field_name` and `value` are empty when no field was
/// captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub message: String,
    pub field_name: String,
    pub value: String,
    /// Quick-reply options in display order.
    pub options: Vec<String>,
}

impl TurnResult {
    fn rejected(explanation: String) -> Self {
        Self {
            message: explanation,
            ..Default::default()
        }
    }
}

/// Where a turn sits in the conversation.
///
/// Completion (all fields filled) is only ever signaled in the oracle's text,
/// so there is no terminal state here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    AwaitingFirstAnswer,
    Conversing,
}

impl DialogueState {
    pub fn of(request: &TurnRequest) -> Self {
        if request.is_first {
            Self::AwaitingFirstAnswer
        } else {
            Self::Conversing
        }
    }
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingFirstAnswer => "awaiting_first_answer",
            Self::Conversing => "conversing",
        };
        write!(f, "{s}")
    }
}

/// Orchestrates validation and question generation for a turn.
pub struct DialogueController {
    validator: AnswerValidator,
    oracle: Arc<dyn DialogueOracle>,
    instruction: String,
    config: EngineConfig,
}

impl DialogueController {
    pub fn new(
        registry: Arc<FieldRegistry>,
        validation_oracle: Arc<dyn ValidationOracle>,
        dialogue_oracle: Arc<dyn DialogueOracle>,
        config: EngineConfig,
    ) -> Self {
        let instruction = dialogue_instruction(&registry);
        let validator = AnswerValidator::new(validation_oracle, registry, config.oracle_timeout);
        Self {
            validator,
            oracle: dialogue_oracle,
            instruction,
            config,
        }
    }

    /// Whether a turn in `state` runs the validator.
    ///
    /// By default only the first answer of a session is validated and
    /// captured; `validate_every_turn` extends it to all turns.
    pub fn validates(&self, state: DialogueState) -> bool {
        state == DialogueState::AwaitingFirstAnswer || self.config.validate_every_turn
    }

    /// Handle one turn.
    ///
    /// At most two oracle calls, strictly in sequence: validation (when
    /// gated in), then question generation. A rejected answer ends the turn
    /// after the first call.
    pub async fn handle_turn(&self, request: &TurnRequest) -> Result<TurnResult, DialogueError> {
        let state = DialogueState::of(request);
        let span = info_span!("turn", turn_id = %Uuid::new_v4(), state = %state);

        self.run_turn(request, state).instrument(span).await
    }

    async fn run_turn(
        &self,
        request: &TurnRequest,
        state: DialogueState,
    ) -> Result<TurnResult, DialogueError> {
        info!(chars = request.message.chars().count(), "Handling turn");

        let mut captured = None;
        if self.validates(state) {
            let context = request.last_question.as_deref().unwrap_or("");
            match self.validator.validate(context, &request.message).await? {
                ValidationOutcome::Rejected { explanation } => {
                    info!("Answer rejected, asking user to rephrase");
                    return Ok(TurnResult::rejected(explanation));
                }
                ValidationOutcome::Accepted { field_name, value } => {
                    info!(field = %field_name, "Field captured");
                    captured = Some((field_name, value));
                }
            }
        }

        let raw = with_deadline(
            self.config.oracle_timeout,
            self.oracle.complete(&self.instruction, &request.message),
        )
        .await
        .inspect_err(|e| warn!(error = %e, kind = e.label(), "Dialogue oracle failed"))?;

        let reply = parse_reply(&raw);
        let (field_name, value) = captured.unwrap_or_default();
        info!(options = reply.options.len(), "Turn complete");

        Ok(TurnResult {
            message: reply.message,
            field_name,
            value,
            options: reply.options,
        })
    }
}
