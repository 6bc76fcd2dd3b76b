//! Splits a dialogue reply into display text and quick-reply options.
//!
//! The dialogue instruction asks the model to append options as
//! `###STRINGLIST["I'm single.", "Married filing jointly"]` at the end of its
//! reply. The marker and everything after it are control data, never shown to
//! the user.

use tracing::debug;

/// Marker that introduces the options list.
pub const OPTIONS_MARKER: &str = "###STRINGLIST";

/// A dialogue reply split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// Text safe to display.
    pub message: String,
    /// Quick-reply options in display order; may be empty.
    pub options: Vec<String>,
}

/// Parse both parts of a reply.
pub fn parse_reply(raw: &str) -> ParsedReply {
    ParsedReply {
        message: parse_message(raw),
        options: parse_options(raw),
    }
}

/// Text before the first options marker, trimmed. Without a marker, the whole
/// reply trimmed.
pub fn parse_message(raw: &str) -> String {
    match raw.find(OPTIONS_MARKER) {
        Some(at) => raw[..at].trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Options after the first marker.
///
/// Fails soft: a missing marker or anything that is not a JSON list of
/// strings yields an empty list.
pub fn parse_options(raw: &str) -> Vec<String> {
    let Some(at) = raw.find(OPTIONS_MARKER) else {
        return Vec::new();
    };
    let literal = raw[at + OPTIONS_MARKER.len()..].trim();

    match serde_json::from_str::<Vec<String>>(literal) {
        Ok(options) => options,
        Err(e) => {
            debug!(error = %e, literal = %literal, "Ignoring malformed options block");
            Vec::new()
        }
    }
}
