//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Dialogue engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Run the answer validator on every turn instead of only the first.
    ///
    /// Off by default: only the first answer of a session is captured as a
    /// structured field, later turns go straight to the dialogue oracle.
    pub validate_every_turn: bool,
    /// Upper bound on a single oracle call.
    pub oracle_timeout: Duration,
    /// Sampling temperature for validation calls.
    pub validation_temperature: f32,
    /// Max tokens for validation calls.
    pub validation_max_tokens: u32,
    /// Sampling temperature for question generation.
    pub dialogue_temperature: f32,
    /// Max tokens for question generation.
    pub dialogue_max_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_every_turn: false,
            oracle_timeout: Duration::from_secs(30),
            validation_temperature: 0.0,
            validation_max_tokens: 512,
            dialogue_temperature: 0.0,
            dialogue_max_tokens: 512,
        }
    }
}

impl EngineConfig {
    /// Build from environment variables, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let validate_every_turn = match std::env::var("TAX_ASSIST_VALIDATE_EVERY_TURN") {
            Ok(raw) => parse_bool("TAX_ASSIST_VALIDATE_EVERY_TURN", &raw)?,
            Err(_) => defaults.validate_every_turn,
        };

        let oracle_timeout = env_parsed::<u64>("TAX_ASSIST_ORACLE_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.oracle_timeout);
        if oracle_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "TAX_ASSIST_ORACLE_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            validate_every_turn,
            oracle_timeout,
            ..defaults
        })
    }
}

/// Server and provider settings for the binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub backend: LlmBackend,
    pub model: String,
    pub api_key: secrecy::SecretString,
    /// Optional JSON field schema; the built-in Form 1040 schema is used
    /// when unset.
    pub schema_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parsed::<u16>("TAX_ASSIST_PORT")?.unwrap_or(8080);

        let backend = match std::env::var("TAX_ASSIST_LLM_BACKEND") {
            Ok(raw) => LlmBackend::from_str(&raw).map_err(|message| ConfigError::InvalidValue {
                key: "TAX_ASSIST_LLM_BACKEND".to_string(),
                message,
            })?,
            Err(_) => LlmBackend::OpenAi,
        };

        let key_var = backend.api_key_var();
        let api_key = std::env::var(key_var)
            .map_err(|_| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = std::env::var("TAX_ASSIST_MODEL")
            .unwrap_or_else(|_| backend.default_model().to_string());

        let schema_path = std::env::var("TAX_ASSIST_SCHEMA_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            port,
            backend,
            model,
            api_key: secrecy::SecretString::from(api_key),
            schema_path,
        })
    }
}

fn env_parsed<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates_first_turn_only() {
        let config = EngineConfig::default();
        assert!(!config.validate_every_turn);
        assert_eq!(config.oracle_timeout, Duration::from_secs(30));
        assert_eq!(config.validation_temperature, 0.0);
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("K", "true").unwrap());
        assert!(parse_bool("K", " ON ").unwrap());
        assert!(parse_bool("K", "1").unwrap());
        assert!(!parse_bool("K", "off").unwrap());
        assert!(!parse_bool("K", "").unwrap());
    }

    #[test]
    fn parse_bool_rejects_garbage() {
        let err = parse_bool("TAX_ASSIST_VALIDATE_EVERY_TURN", "maybe").unwrap_err();
        assert!(err.to_string().contains("TAX_ASSIST_VALIDATE_EVERY_TURN"));
        assert!(err.to_string().contains("maybe"));
    }
}
