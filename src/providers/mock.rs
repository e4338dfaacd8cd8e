//! Mock Provider（测试用，无需网络）
//!
//! 按脚本行为响应：固定成功 / 固定失败 / 延迟后成功，并记录调用次数，
//! 供 Router 的回退、超时与降权测试使用。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{CoachError, Response};
use crate::providers::{Capability, Provider, RespondOptions};

/// 脚本行为
pub enum MockBehavior {
    /// 立即成功，返回固定文本
    Succeed(String),
    /// 每次返回上游错误
    FailUpstream,
    /// 每次返回认证错误
    FailAuth,
    /// 每次返回限流
    FailRateLimited,
    /// 延迟指定时长后成功（配合短超时测试 Timeout 路径）
    DelayThenSucceed(Duration, String),
    /// 前 n 次失败，之后成功
    FailFirstN(usize, String),
}

/// Mock Provider：行为可脚本化，线程安全计数
pub struct MockProvider {
    id: String,
    capability: Capability,
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(id: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            id: id.into(),
            capability: Capability::Fast,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn respond(&self, _prompt: &str, options: &RespondOptions) -> Result<Response, CoachError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.behavior {
            MockBehavior::Succeed(text) => Ok(Response::new(text.clone(), &self.id, 0.95)),
            MockBehavior::FailUpstream => Err(CoachError::Upstream {
                provider: self.id.clone(),
                message: "scripted failure".to_string(),
            }),
            MockBehavior::FailAuth => Err(CoachError::Authentication(self.id.clone())),
            MockBehavior::FailRateLimited => Err(CoachError::RateLimited(self.id.clone())),
            MockBehavior::DelayThenSucceed(delay, text) => {
                if *delay >= options.timeout {
                    tokio::time::sleep(options.timeout).await;
                    return Err(CoachError::Timeout(self.id.clone()));
                }
                tokio::time::sleep(*delay).await;
                Ok(Response::new(text.clone(), &self.id, 0.95))
            }
            MockBehavior::FailFirstN(count, text) => {
                if n < *count {
                    Err(CoachError::Upstream {
                        provider: self.id.clone(),
                        message: format!("scripted failure #{n}"),
                    })
                } else {
                    Ok(Response::new(text.clone(), &self.id, 0.95))
                }
            }
        }
    }
}
