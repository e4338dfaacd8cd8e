//! 编排层核心数据类型
//!
//! RequestContext 由门面按调用构造，构造后不可变，整条流水线按值传递；
//! Response 是所有 Provider / 工具 / 兜底回答统一归一后的形状。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::CoachError;

/// 一次入站编排请求（text 与 binary_payload 至少有一个非空）
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// 请求级唯一 id（uuid v4）
    pub id: String,
    pub text: Option<String>,
    /// 不透明媒体负载（图片/音频），永不强制要求
    pub binary_payload: Option<Vec<u8>>,
    /// 缺失表示单轮临时请求，不进入会话历史
    pub conversation_id: Option<String>,
    pub metadata: RequestMetadata,
}

/// 请求元信息：时间戳、调用方领域状态快照、自由键值对
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    pub timestamp: Option<DateTime<Utc>>,
    /// 调用方提供的领域状态（如当前训练动作），本层只读
    pub domain_state: Option<Value>,
    pub extra: HashMap<String, String>,
}

impl RequestContext {
    /// 构造并校验：text 与 binary_payload 不能同时为空
    pub fn new(
        text: Option<String>,
        binary_payload: Option<Vec<u8>>,
        conversation_id: Option<String>,
    ) -> Result<Self, CoachError> {
        let text_empty = text.as_deref().map(str::trim).unwrap_or("").is_empty();
        let payload_empty = binary_payload.as_deref().map_or(true, |p| p.is_empty());
        if text_empty && payload_empty {
            return Err(CoachError::EmptyRequest);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            text,
            binary_payload,
            conversation_id,
            metadata: RequestMetadata {
                timestamp: Some(Utc::now()),
                ..Default::default()
            },
        })
    }

    /// 纯文本请求的快捷构造
    pub fn from_text(text: impl Into<String>) -> Result<Self, CoachError> {
        Self::new(Some(text.into()), None, None)
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_domain_state(mut self, state: Value) -> Self {
        self.metadata.domain_state = Some(state);
        self
    }

    /// 用于 Provider prompt 的文本视图（无文本时以占位描述媒体负载）
    pub fn prompt_text(&self) -> String {
        match self.text.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => "[non-text payload attached]".to_string(),
        }
    }
}

/// 统一响应：内容、用到的工具、置信度（0-1）、来源 Provider、完成标记
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    #[serde(default)]
    pub tools_used: Vec<String>,
    pub confidence: f32,
    pub provider: String,
    /// true 表示不会再有后续流式分片
    pub complete: bool,
}

impl Response {
    pub fn new(content: impl Into<String>, provider: impl Into<String>, confidence: f32) -> Self {
        Self {
            content: content.into(),
            tools_used: Vec::new(),
            confidence: confidence.clamp(0.0, 1.0),
            provider: provider.into(),
            complete: true,
        }
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools_used = tools;
        self
    }
}

/// 单次工具执行结果：success 为 true 时 payload 存在，为 false 时 error 存在
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub payload: Option<Value>,
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ToolResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(message.into()),
            metadata: HashMap::new(),
        }
    }
}
