//! Spotter - AI 健身教练编排核心
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 数据类型、错误、构建器与编排门面
//! - **intent**: 有序规则意图分类（首条命中即生效）
//! - **router**: Provider 回退链（工具优先、超时、降权、兜底）
//! - **fallback**: 离线兜底应答器（永不失败）
//! - **providers**: 上游推理后端适配器与健康状态板
//! - **conversation**: 有界会话历史与摘要
//! - **stream**: 流式投递通道（分片 + 取消）
//! - **tools**: 工具注册表、schema 校验、插件与内置健身工具

pub mod config;
pub mod conversation;
pub mod core;
pub mod fallback;
pub mod intent;
pub mod providers;
pub mod router;
pub mod stream;
pub mod tools;

pub use crate::config::{load_config, AppConfig};
pub use crate::core::{Coach, CoachBuilder, CoachError, RequestContext, Response};
