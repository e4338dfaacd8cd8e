//! Provider 健康状态板
//!
//! 共享可变的状态表：Router 写入 idle→trying→{success|failed} 迁移，
//! 观察方（UI / 测试）通过 watch 通道订阅快照，读取永不阻塞在途请求。
//! 状态是尽力而为的参考信息，不承担安全语义。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, RwLock};

/// 健康状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    Idle,
    Trying,
    Success,
    Failed,
}

/// 单个 Provider 的健康记录
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub state: ProviderState,
    /// 最近一次成功调用的耗时（毫秒）
    pub last_latency_ms: Option<u64>,
    /// 连续失败次数，成功即清零；Router 据此降权
    pub consecutive_failures: u32,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            state: ProviderState::Idle,
            last_latency_ms: None,
            consecutive_failures: 0,
        }
    }
}

/// 状态板：写入端加锁原子更新，订阅端走 watch 快照
pub struct StatusBoard {
    table: RwLock<HashMap<String, ProviderHealth>>,
    tx: watch::Sender<HashMap<String, ProviderHealth>>,
}

impl StatusBoard {
    pub fn new() -> Arc<Self> {
        let (tx, _) = watch::channel(HashMap::new());
        Arc::new(Self {
            table: RwLock::new(HashMap::new()),
            tx,
        })
    }

    pub async fn mark_trying(&self, id: &str) {
        self.update(id, |h| h.state = ProviderState::Trying).await;
    }

    pub async fn mark_success(&self, id: &str, latency: Duration) {
        self.update(id, |h| {
            h.state = ProviderState::Success;
            h.last_latency_ms = Some(latency.as_millis() as u64);
            h.consecutive_failures = 0;
        })
        .await;
    }

    pub async fn mark_failed(&self, id: &str) {
        self.update(id, |h| {
            h.state = ProviderState::Failed;
            h.consecutive_failures += 1;
        })
        .await;
    }

    async fn update(&self, id: &str, f: impl FnOnce(&mut ProviderHealth)) {
        let snapshot = {
            let mut table = self.table.write().await;
            f(table.entry(id.to_string()).or_default());
            table.clone()
        };
        // 订阅端可能全部掉线，发送失败无须处理
        let _ = self.tx.send(snapshot);
    }

    pub async fn health(&self, id: &str) -> ProviderHealth {
        self.table.read().await.get(id).cloned().unwrap_or_default()
    }

    pub async fn consecutive_failures(&self, id: &str) -> u32 {
        self.health(id).await.consecutive_failures
    }

    pub async fn snapshot(&self) -> HashMap<String, ProviderHealth> {
        self.table.read().await.clone()
    }

    /// 订阅状态变化（UI 端显示实时进度）
    pub fn subscribe(&self) -> watch::Receiver<HashMap<String, ProviderHealth>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_transitions() {
        let board = StatusBoard::new();
        board.mark_trying("p1").await;
        assert_eq!(board.health("p1").await.state, ProviderState::Trying);

        board.mark_failed("p1").await;
        board.mark_failed("p1").await;
        let h = board.health("p1").await;
        assert_eq!(h.state, ProviderState::Failed);
        assert_eq!(h.consecutive_failures, 2);

        board.mark_success("p1", Duration::from_millis(42)).await;
        let h = board.health("p1").await;
        assert_eq!(h.state, ProviderState::Success);
        assert_eq!(h.consecutive_failures, 0);
        assert_eq!(h.last_latency_ms, Some(42));
    }

    #[tokio::test]
    async fn test_watch_subscription_sees_updates() {
        let board = StatusBoard::new();
        let mut rx = board.subscribe();
        board.mark_trying("p2").await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow()["p2"].state, ProviderState::Trying);
    }
}
