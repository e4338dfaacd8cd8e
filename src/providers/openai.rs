//! OpenAI 兼容 API 适配器
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url），归一化为统一 Response。
//! 适配器内不重试；凭证缺失在首次调用立即返回 Authentication。

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::core::{CoachError, Response};
use crate::providers::{Capability, Provider, RespondOptions};

/// OpenAI 兼容客户端：持有 Client 与 model 名，成功时取首条 choice 的 content
pub struct OpenAiProvider {
    id: String,
    client: Client<OpenAIConfig>,
    model: String,
    capability: Capability,
    has_credential: bool,
}

impl OpenAiProvider {
    pub fn new(
        id: impl Into<String>,
        base_url: Option<&str>,
        model: &str,
        api_key: Option<&str>,
        capability: Capability,
    ) -> Self {
        let has_credential = api_key.map_or(false, |k| !k.trim().is_empty());
        let mut config = OpenAIConfig::new().with_api_key(api_key.unwrap_or(""));
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }
        Self {
            id: id.into(),
            client: Client::with_config(config),
            model: model.to_string(),
            capability,
            has_credential,
        }
    }

    fn build_messages(
        &self,
        prompt: &str,
        options: &RespondOptions,
    ) -> Result<Vec<ChatCompletionRequestMessage>, CoachError> {
        let mut messages = Vec::new();
        let mut system = options.system_prompt.clone().unwrap_or_default();
        if let Some(summary) = &options.conversation_summary {
            if !system.is_empty() {
                system.push_str("\n\n");
            }
            system.push_str("Conversation so far: ");
            system.push_str(summary);
        }
        if !system.is_empty() {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| self.upstream(e.to_string()))?,
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| self.upstream(e.to_string()))?,
        ));
        Ok(messages)
    }

    fn upstream(&self, message: String) -> CoachError {
        CoachError::Upstream {
            provider: self.id.clone(),
            message,
        }
    }

    fn map_api_error(&self, err: OpenAIError) -> CoachError {
        match &err {
            OpenAIError::ApiError(api) => {
                let text = api.message.to_lowercase();
                if text.contains("invalid_api_key") || text.contains("401") || text.contains("unauthorized") {
                    CoachError::Authentication(self.id.clone())
                } else if text.contains("rate") || text.contains("429") {
                    CoachError::RateLimited(self.id.clone())
                } else {
                    self.upstream(api.message.clone())
                }
            }
            _ => self.upstream(err.to_string()),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn respond(&self, prompt: &str, options: &RespondOptions) -> Result<Response, CoachError> {
        if !self.has_credential {
            return Err(CoachError::Authentication(self.id.clone()));
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.build_messages(prompt, options)?)
            .build()
            .map_err(|e| self.upstream(e.to_string()))?;

        let chat = self.client.chat();
        let call = chat.create(request);
        let response = tokio::time::timeout(options.timeout, call)
            .await
            .map_err(|_| CoachError::Timeout(self.id.clone()))?
            .map_err(|e| self.map_api_error(e))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(self.upstream("empty completion".to_string()));
        }

        Ok(Response::new(content, &self.id, 0.95))
    }
}
