//! 编排层错误类型
//!
//! 只有 EmptyRequest / DuplicateTool（启动期）会抛给调用方；
//! 上游相关错误全部在 Router 内吸收，降级成低置信度 Response。

use thiserror::Error;

/// 编排过程中可能出现的错误（工具、上游、超时、配置等）
#[derive(Error, Debug)]
pub enum CoachError {
    /// 请求体 text 与 binary_payload 均为空（调用方误用，唯一会抛出的请求期错误）
    #[error("Empty request: text and binary payload are both absent")]
    EmptyRequest,

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// 重复注册工具名（启动期致命）
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    #[error("Invalid parameters for {tool}: {reason}")]
    InvalidParameters { tool: String, reason: String },

    /// 凭证缺失或无效（不可恢复，Router 直接跳过该 Provider，不退避重试）
    #[error("Authentication failed for provider {0}")]
    Authentication(String),

    /// 上游限流（可恢复，Router 可临时降权）
    #[error("Rate limited by provider {0}")]
    RateLimited(String),

    #[error("Upstream error from {provider}: {message}")]
    Upstream { provider: String, message: String },

    #[error("Provider {0} timed out")]
    Timeout(String),

    /// 所有候选 Provider 均失败（内部信号，触发 FallbackResponder，不外泄）
    #[error("All providers exhausted")]
    AllProvidersExhausted,

    #[error("Config error: {0}")]
    Config(String),
}
