//! Dialogue engine: conversational slot filling for a tax form.
//!
//! Each turn takes the user's latest message and, on the first turn of a
//! session, asks the validation oracle whether the answer fills one of the
//! registry's fields. The dialogue oracle then produces the next question,
//! which is split into display text and quick-reply options.

pub mod controller;
pub mod normalize;
pub mod oracle;
pub mod parser;
pub mod prompts;
pub mod routes;
pub mod schema;
pub mod validator;

pub use controller::{DialogueController, DialogueState, TurnRequest, TurnResult};
pub use oracle::{DialogueOracle, LlmOracle, ValidationOracle};
pub use parser::{OPTIONS_MARKER, ParsedReply, parse_message, parse_options, parse_reply};
pub use routes::{ChatRouteState, chat_routes};
pub use schema::{FieldRegistry, FieldSpec, Normalizer};
pub use validator::{AnswerValidator, ValidationOutcome};
