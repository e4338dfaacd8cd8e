//! Provider 抽象
//!
//! 每个上游推理后端实现 Provider trait：respond（带强制超时）→ 统一 Response。
//! 适配器内部绝不重试，重试与失败记账全部集中在 Router。

use std::time::Duration;

use async_trait::async_trait;

use crate::core::{CoachError, Response};

/// 能力标签：快而便宜 vs 高质量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Fast,
    HighQuality,
}

/// 单次调用选项：超时为强制项，摘要作为轻量记忆拼入 prompt
#[derive(Debug, Clone)]
pub struct RespondOptions {
    /// 本次调用的硬超时（调用方提供，适配器必须遵守）
    pub timeout: Duration,
    pub system_prompt: Option<String>,
    /// 会话摘要（绝不注入完整历史，控制 payload 体积）
    pub conversation_summary: Option<String>,
}

impl RespondOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            system_prompt: None,
            conversation_summary: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.conversation_summary = Some(summary.into());
        self
    }
}

/// 上游推理后端适配器：归一化响应形状，上报健康状态由 Router 经 StatusBoard 完成
#[async_trait]
pub trait Provider: Send + Sync {
    /// 标识符（配置中的优先级列表按此引用）
    fn id(&self) -> &str;

    fn capability(&self) -> Capability;

    /// 单次请求；凭证缺失须立即返回 Authentication 而非挂起
    async fn respond(&self, prompt: &str, options: &RespondOptions) -> Result<Response, CoachError>;
}
