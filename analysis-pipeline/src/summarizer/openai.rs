use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use common::utils::config::AppConfig;
use tracing::debug;

use super::{SummarizeError, Summarizer};
use crate::utils::llm_instructions::{
    file_documentation_user_message, project_overview_user_message,
    FILE_DOCUMENTATION_SYSTEM_MESSAGE, PROJECT_OVERVIEW_SYSTEM_MESSAGE,
};

/// Summarizer backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiSummarizer {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        );
        Self::new(Arc::new(client), config.openai_model.clone())
    }

    async fn complete(&self, system: &str, user: String) -> Result<String, SummarizeError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessage::from(system).into(),
                ChatCompletionRequestUserMessage::from(user).into(),
            ])
            .build()
            .map_err(classify_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(classify_error)?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| SummarizeError::Unavailable("empty completion".into()))?;

        if let Some(usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion finished"
            );
        }
        Ok(content)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, path: &str, content: &str) -> Result<String, SummarizeError> {
        self.complete(
            FILE_DOCUMENTATION_SYSTEM_MESSAGE,
            file_documentation_user_message(path, content),
        )
        .await
    }

    async fn summarize_project(
        &self,
        file_tree: &str,
        summaries: &str,
    ) -> Result<String, SummarizeError> {
        self.complete(
            PROJECT_OVERVIEW_SYSTEM_MESSAGE,
            project_overview_user_message(file_tree, summaries),
        )
        .await
    }
}

/// Maps provider errors onto the retry taxonomy.
fn classify_error(err: OpenAIError) -> SummarizeError {
    match err {
        OpenAIError::ApiError(api) => {
            let code = api.code.as_deref().unwrap_or_default();
            let kind = api.r#type.as_deref().unwrap_or_default();
            if code == "rate_limit_exceeded" || kind == "rate_limit_exceeded" {
                SummarizeError::RateLimited
            } else if code == "context_length_exceeded" || kind == "invalid_request_error" {
                SummarizeError::InvalidInput(api.message)
            } else {
                SummarizeError::Unavailable(api.message)
            }
        }
        OpenAIError::Reqwest(err) if err.status().is_some_and(|s| s.as_u16() == 429) => {
            SummarizeError::RateLimited
        }
        OpenAIError::InvalidArgument(message) => SummarizeError::InvalidInput(message),
        other => SummarizeError::Unavailable(other.to_string()),
    }
}
