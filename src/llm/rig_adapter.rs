//! Bridges a rig-core `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::agent::AgentBuilder;
use rig::completion::{CompletionModel, Prompt};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

/// Adapter that runs our requests through a rig completion model.
///
/// The request's system messages become the agent preamble and the last user
/// message becomes the prompt.
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    provider: String,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, provider: &str, model_name: &str) -> Self {
        Self {
            model,
            provider: provider.to_string(),
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request
            .last_user_text()
            .ok_or_else(|| LlmError::RequestFailed {
                provider: self.provider.clone(),
                reason: "request has no user message".to_string(),
            })?
            .to_string();
        let preamble = request.system_text();

        let mut builder = AgentBuilder::new(self.model.clone()).preamble(&preamble);
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }
        let agent = builder.build();

        let content = agent
            .prompt(prompt.as_str())
            .await
            .map_err(|e| classify_error(&self.provider, &e.to_string()))?;
        let content = non_empty(&self.provider, content)?;

        tracing::debug!(
            model = %self.model_name,
            chars = content.len(),
            "Completion received"
        );
        Ok(CompletionResponse { content })
    }
}

/// A blank completion is never a usable answer.
fn non_empty(provider: &str, content: String) -> Result<String, LlmError> {
    if content.trim().is_empty() {
        return Err(LlmError::InvalidResponse {
            provider: provider.to_string(),
            reason: "empty completion".to_string(),
        });
    }
    Ok(content)
}

/// Map a provider error message onto our error taxonomy.
///
/// rig surfaces HTTP failures as text, so the status is recovered from it.
fn classify_error(provider: &str, message: &str) -> LlmError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("429") || lowered.contains("rate limit") || lowered.contains("rate_limit") {
        LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: None,
        }
    } else if lowered.contains("401") || lowered.contains("unauthorized") || lowered.contains("invalid api key") {
        LlmError::AuthFailed {
            provider: provider.to_string(),
        }
    } else {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: message.to_string(),
        }
    }
}
