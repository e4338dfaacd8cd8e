//! Coach 构建器
//!
//! 从配置装配完整编排栈：注册内置工具包（可追加外部插件）、
//! 按 [router].priority 实例化启用的 Provider、拼装 system prompt（人设 + 工具 schema）。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::conversation::ConversationStore;
use crate::core::{Coach, CoachError};
use crate::intent::IntentClassifier;
use crate::providers::{Capability, OpenAiProvider, Provider, RelayProvider, StatusBoard};
use crate::router::ProviderRouter;
use crate::tools::{register_plugin, CoachingToolkit, ToolPlugin, ToolRegistry};

const DEFAULT_SYSTEM_PROMPT: &str = "You are Spotter, a supportive fitness coach. \
Give concise, practical guidance on workouts, nutrition, form, and recovery. \
Never alarm the user; suggest seeing a professional for medical concerns.";

/// 按步骤装配 Coach；额外 Provider / 插件通过 with_* 注入（测试与宿主扩展用）
pub struct CoachBuilder {
    config: AppConfig,
    extra_providers: Vec<Arc<dyn Provider>>,
    extra_plugins: Vec<Box<dyn ToolPlugin>>,
}

impl CoachBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            extra_providers: Vec::new(),
            extra_plugins: Vec::new(),
        }
    }

    /// 追加一个 Provider，排在配置内候选之后
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.extra_providers.push(provider);
        self
    }

    /// 追加一个工具插件
    pub fn with_plugin(mut self, plugin: Box<dyn ToolPlugin>) -> Self {
        self.extra_plugins.push(plugin);
        self
    }

    pub async fn build(self) -> Result<Coach, CoachError> {
        let cfg = self.config;

        let mut registry = ToolRegistry::new();
        register_plugin(&mut registry, &CoachingToolkit).await?;
        for plugin in &self.extra_plugins {
            register_plugin(&mut registry, plugin.as_ref()).await?;
        }
        let registry = Arc::new(registry);

        let mut providers = Vec::new();
        for id in &cfg.router.priority {
            match id.as_str() {
                "openai" if cfg.providers.openai.enabled => {
                    let section = &cfg.providers.openai;
                    let api_key = section
                        .api_key
                        .clone()
                        .or_else(|| std::env::var("OPENAI_API_KEY").ok());
                    providers.push(Arc::new(OpenAiProvider::new(
                        "openai",
                        section.base_url.as_deref(),
                        &section.model,
                        api_key.as_deref(),
                        Capability::HighQuality,
                    )) as Arc<dyn Provider>);
                }
                "relay" if cfg.providers.relay.enabled => {
                    let section = &cfg.providers.relay;
                    let api_key = section
                        .api_key
                        .clone()
                        .or_else(|| std::env::var("RELAY_API_KEY").ok());
                    providers.push(Arc::new(RelayProvider::new(
                        "relay",
                        section.base_url.clone(),
                        section.model.clone(),
                        api_key,
                        Capability::Fast,
                    )) as Arc<dyn Provider>);
                }
                other => {
                    tracing::warn!(provider = other, "unknown or disabled provider in priority list, skipping");
                }
            }
        }
        providers.extend(self.extra_providers);
        if providers.is_empty() {
            tracing::warn!("no providers configured; every request will use tools or fallback");
        }

        let system_prompt = format!(
            "{}\n\nAvailable tools:\n{}",
            cfg.app
                .system_prompt
                .as_deref()
                .unwrap_or(DEFAULT_SYSTEM_PROMPT),
            registry.to_schema_json(),
        );

        let status = StatusBoard::new();
        let router = ProviderRouter::new(
            providers,
            registry,
            status.clone(),
            cfg.router.policy(),
            cfg.router.limits(),
            system_prompt,
        );
        let store = ConversationStore::new(
            cfg.conversation.max_turns,
            Duration::from_secs(cfg.conversation.idle_ttl_secs),
        );

        Ok(Coach::new(
            IntentClassifier::new(),
            router,
            store,
            status,
            Duration::from_millis(cfg.streaming.chunk_delay_ms),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_with_defaults() {
        let coach = CoachBuilder::new(AppConfig::default()).build().await.unwrap();
        assert_eq!(coach.store().conversation_count().await, 0);
    }
}
