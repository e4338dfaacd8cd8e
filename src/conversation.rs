//! 会话存储：按 conversation id 维护有界轮次历史
//!
//! 外层 RwLock<HashMap> 定位会话，内层每会话一把 tokio::Mutex：
//! 同一会话的并发 append 串行化，不同会话互不阻塞。
//! 历史超过 max_turns 时 FIFO 淘汰最旧轮次；闲置超过 TTL 的会话由 gc_idle 回收。
//! summarize 只输出轻量摘要（轮数 / 近期话题 / 工具集合），绝不吐完整原始历史。

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::core::Response;
use crate::intent::IntentKind;

/// 一轮请求/响应记录
#[derive(Debug, Clone)]
pub struct Turn {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub user_text: String,
    pub response: Response,
    pub tools_used: Vec<String>,
}

impl Turn {
    pub fn new(request_id: impl Into<String>, user_text: impl Into<String>, response: Response) -> Self {
        let tools_used = response.tools_used.clone();
        Self {
            timestamp: Utc::now(),
            request_id: request_id.into(),
            user_text: user_text.into(),
            response,
            tools_used,
        }
    }
}

/// 单个会话的状态（仅 ConversationStore 持有，外部只经 store 方法访问）
#[derive(Debug)]
struct ConversationState {
    turns: VecDeque<Turn>,
    tool_usage: HashMap<String, u32>,
    /// 最近一次识别出的非 generic 意图
    primary_intent: Option<IntentKind>,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversationState {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            turns: VecDeque::new(),
            tool_usage: HashMap::new(),
            primary_intent: None,
            started_at: now,
            updated_at: now,
        }
    }
}

/// 会话摘要：注入 Provider prompt 的轻量记忆
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub turn_count: usize,
    /// 近期话题（由最近几轮的意图/工具推导）
    pub recent_topics: Vec<String>,
    /// 会话内用过的工具集合
    pub tools_used: Vec<String>,
}

impl Summary {
    /// 拼入 prompt 的单行文本形式
    pub fn as_prompt_line(&self) -> String {
        format!(
            "{} prior turns; recent topics: {}; tools used: {}",
            self.turn_count,
            if self.recent_topics.is_empty() {
                "none".to_string()
            } else {
                self.recent_topics.join(", ")
            },
            if self.tools_used.is_empty() {
                "none".to_string()
            } else {
                self.tools_used.join(", ")
            },
        )
    }
}

/// 会话存储：进程内存级，无磁盘持久化
pub struct ConversationStore {
    conversations: RwLock<HashMap<String, Arc<Mutex<ConversationState>>>>,
    max_turns: usize,
    idle_ttl: Duration,
}

impl ConversationStore {
    pub fn new(max_turns: usize, idle_ttl: Duration) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            max_turns: max_turns.max(1),
            idle_ttl,
        }
    }

    async fn entry(&self, conversation_id: &str) -> Arc<Mutex<ConversationState>> {
        if let Some(state) = self.conversations.read().await.get(conversation_id) {
            return state.clone();
        }
        let mut map = self.conversations.write().await;
        map.entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState::new())))
            .clone()
    }

    /// 追加一轮；会话不存在则创建，超过上限 FIFO 淘汰最旧轮次
    pub async fn append(&self, conversation_id: &str, turn: Turn, intent: IntentKind) {
        let entry = self.entry(conversation_id).await;
        let mut state = entry.lock().await;
        for tool in &turn.tools_used {
            *state.tool_usage.entry(tool.clone()).or_insert(0) += 1;
        }
        if intent != IntentKind::Generic {
            state.primary_intent = Some(intent);
        }
        state.updated_at = Utc::now();
        state.turns.push_back(turn);
        while state.turns.len() > self.max_turns {
            state.turns.pop_front();
        }
    }

    /// 轻量摘要；会话不存在返回 None
    pub async fn summarize(&self, conversation_id: &str) -> Option<Summary> {
        let entry = {
            let map = self.conversations.read().await;
            map.get(conversation_id)?.clone()
        };
        let state = entry.lock().await;

        let mut recent_topics = Vec::new();
        for turn in state.turns.iter().rev().take(3) {
            for tool in &turn.tools_used {
                if !recent_topics.contains(tool) {
                    recent_topics.push(tool.clone());
                }
            }
        }
        if let Some(intent) = state.primary_intent {
            let topic = intent.as_str().to_string();
            if !recent_topics.contains(&topic) {
                recent_topics.push(topic);
            }
        }

        let mut tools_used: Vec<String> = state.tool_usage.keys().cloned().collect();
        tools_used.sort();

        Some(Summary {
            turn_count: state.turns.len(),
            recent_topics,
            tools_used,
        })
    }

    /// 清除一个会话的全部状态
    pub async fn clear(&self, conversation_id: &str) {
        self.conversations.write().await.remove(conversation_id);
    }

    /// 回收闲置超过 TTL 的会话，返回回收数量
    pub async fn gc_idle(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.idle_ttl).unwrap_or_else(|_| chrono::Duration::seconds(1800));
        let mut map = self.conversations.write().await;
        let before = map.len();
        let mut keep = HashMap::new();
        for (id, entry) in map.drain() {
            let idle = entry.lock().await.updated_at < cutoff;
            if !idle {
                keep.insert(id, entry);
            }
        }
        *map = keep;
        before - map.len()
    }

    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// 取某会话的轮次快照（测试与调试用）
    pub async fn turns(&self, conversation_id: &str) -> Vec<Turn> {
        let entry = {
            let map = self.conversations.read().await;
            match map.get(conversation_id) {
                Some(e) => e.clone(),
                None => return Vec::new(),
            }
        };
        let state = entry.lock().await;
        state.turns.iter().cloned().collect()
    }

    pub async fn started_at(&self, conversation_id: &str) -> Option<DateTime<Utc>> {
        let entry = {
            let map = self.conversations.read().await;
            map.get(conversation_id)?.clone()
        };
        let state = entry.lock().await;
        Some(state.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(n: usize) -> Turn {
        Turn::new(
            format!("req-{n}"),
            format!("message {n}"),
            Response::new(format!("reply {n}"), "mock", 0.95),
        )
    }

    #[tokio::test]
    async fn test_cap_evicts_oldest_in_order() {
        let store = ConversationStore::new(3, Duration::from_secs(1800));
        for n in 0..4 {
            store.append("c1", turn(n), IntentKind::Generic).await;
        }
        let turns = store.turns("c1").await;
        assert_eq!(turns.len(), 3);
        let ids: Vec<_> = turns.iter().map(|t| t.request_id.as_str()).collect();
        assert_eq!(ids, vec!["req-1", "req-2", "req-3"]);
    }

    #[tokio::test]
    async fn test_timestamps_non_decreasing() {
        let store = ConversationStore::new(10, Duration::from_secs(1800));
        for n in 0..5 {
            store.append("c1", turn(n), IntentKind::Generic).await;
        }
        let turns = store.turns("c1").await;
        assert!(turns.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_summarize_counts_and_topics() {
        let store = ConversationStore::new(10, Duration::from_secs(1800));
        let mut t = turn(0);
        t.tools_used = vec!["plan_workout".to_string()];
        store.append("c1", t, IntentKind::Planning).await;
        store.append("c1", turn(1), IntentKind::Generic).await;

        let summary = store.summarize("c1").await.unwrap();
        assert_eq!(summary.turn_count, 2);
        assert!(summary.recent_topics.iter().any(|t| t == "plan_workout"));
        assert!(summary.recent_topics.iter().any(|t| t == "planning"));
        assert!(summary.as_prompt_line().contains("2 prior turns"));
    }

    #[tokio::test]
    async fn test_clear_removes_state() {
        let store = ConversationStore::new(10, Duration::from_secs(1800));
        store.append("c1", turn(0), IntentKind::Generic).await;
        store.clear("c1").await;
        assert!(store.summarize("c1").await.is_none());
        assert_eq!(store.conversation_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_appends_same_conversation_all_land() {
        let store = Arc::new(ConversationStore::new(100, Duration::from_secs(1800)));
        let mut handles = Vec::new();
        for n in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append("c1", turn(n), IntentKind::Generic).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.turns("c1").await.len(), 20);
    }

    #[tokio::test]
    async fn test_gc_idle_with_zero_ttl() {
        let store = ConversationStore::new(10, Duration::from_secs(0));
        store.append("c1", turn(0), IntentKind::Generic).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let removed = store.gc_idle().await;
        assert_eq!(removed, 1);
        assert_eq!(store.conversation_count().await, 0);
    }
}
