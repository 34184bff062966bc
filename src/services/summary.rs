//! Summary relay core: turns a weather snapshot into a prompt and asks the
//! language model for a short summary.
//!
//! The snapshot is handled as raw JSON because the relay accepts whatever a
//! caller posts; a snapshot without `weather[0].description` or `main.temp`
//! is a generation failure, not a crash.

use serde_json::Value;

use crate::errors::AppError;
use crate::services::llm::LlmClient;

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides weather summaries.";

/// The two snapshot fields the prompt is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptInputs {
    pub description: String,
    /// Rendered as received (e.g. "72" or "68.5").
    pub temperature: String,
}

impl PromptInputs {
    pub fn from_snapshot(weather_data: &Value) -> Result<Self, AppError> {
        let description = weather_data
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::Generation("snapshot is missing weather[0].description".to_string())
            })?;

        let temperature = match weather_data.pointer("/main/temp") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                return Err(AppError::Generation(
                    "snapshot is missing main.temp".to_string(),
                ))
            }
        };

        Ok(Self {
            description: description.to_string(),
            temperature,
        })
    }

    pub fn prompt(&self) -> String {
        format!(
            "The weather is described as {} with a temperature of {}°F. Please provide a summary.",
            self.description, self.temperature
        )
    }
}

/// Generate a summary for a snapshot.
///
/// Errors are `Generation` (bad snapshot, failed completion); client
/// construction errors are raised by the caller before this point.
pub async fn generate_summary(llm: &LlmClient, weather_data: &Value) -> Result<String, AppError> {
    let inputs = PromptInputs::from_snapshot(weather_data)?;
    let prompt = inputs.prompt();
    tracing::debug!("Requesting summary for '{}'", prompt);
    llm.complete(SUMMARY_SYSTEM_PROMPT, &prompt).await
}
