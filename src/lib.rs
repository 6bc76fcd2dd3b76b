//! Tax Assist: conversational slot filling for tax forms.

pub mod config;
pub mod dialogue;
pub mod error;
pub mod llm;
