//! Completion oracle capabilities consumed by the dialogue core.
//!
//! Validation and question generation are separate capabilities so each side
//! can be faked on its own. In production both route to one `LlmProvider`
//! through `LlmOracle`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::EngineConfig;
use crate::error::{DialogueError, LlmError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Oracle used by the answer validator.
#[async_trait]
pub trait ValidationOracle: Send + Sync {
    async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError>;
}

/// Oracle used to generate the next question.
#[async_trait]
pub trait DialogueOracle: Send + Sync {
    async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError>;
}

/// Sampling settings for one oracle role.
#[derive(Debug, Clone, Copy)]
struct RoleSettings {
    temperature: f32,
    max_tokens: u32,
}

/// Both oracle capabilities backed by a single LLM provider.
pub struct LlmOracle {
    llm: Arc<dyn LlmProvider>,
    validation: RoleSettings,
    dialogue: RoleSettings,
}

impl LlmOracle {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &EngineConfig) -> Self {
        Self {
            llm,
            validation: RoleSettings {
                temperature: config.validation_temperature,
                max_tokens: config.validation_max_tokens,
            },
            dialogue: RoleSettings {
                temperature: config.dialogue_temperature,
                max_tokens: config.dialogue_max_tokens,
            },
        }
    }

    async fn run(
        &self,
        settings: RoleSettings,
        system_instruction: &str,
        user_message: &str,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_instruction),
            ChatMessage::user(user_message),
        ])
        .with_temperature(settings.temperature)
        .with_max_tokens(settings.max_tokens);

        let response = self.llm.complete(request).await?;
        Ok(response.content)
    }
}

#[async_trait]
impl ValidationOracle for LlmOracle {
    async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError> {
        self.run(self.validation, system_instruction, user_message).await
    }
}

#[async_trait]
impl DialogueOracle for LlmOracle {
    async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError> {
        self.run(self.dialogue, system_instruction, user_message).await
    }
}

/// Await an oracle call with a hard deadline.
pub(crate) async fn with_deadline<F>(deadline: Duration, call: F) -> Result<String, DialogueError>
where
    F: Future<Output = Result<String, LlmError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result.map_err(DialogueError::from),
        Err(_) => Err(DialogueError::OracleTimeout { after: deadline }),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted fake oracle shared by the dialogue unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Returns queued replies in order and records every call.
    #[derive(Default)]
    pub struct ScriptedOracle {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: Mutex<Vec<(String, String)>>,
        delay: Option<Duration>,
    }

    impl ScriptedOracle {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, text: &str) -> Self {
            self.replies.lock().unwrap().push_back(Ok(text.to_string()));
            self
        }

        pub fn fail(self, err: LlmError) -> Self {
            self.replies.lock().unwrap().push_back(Err(err));
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// (system instruction, user message) per call.
        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        async fn next(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((system_instruction.to_string(), user_message.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("ScriptedOracle ran out of replies"))
        }
    }

    #[async_trait]
    impl ValidationOracle for ScriptedOracle {
        async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError> {
            self.next(system_instruction, user_message).await
        }
    }

    #[async_trait]
    impl DialogueOracle for ScriptedOracle {
        async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError> {
            self.next(system_instruction, user_message).await
        }
    }
}
