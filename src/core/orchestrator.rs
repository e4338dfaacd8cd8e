//! 编排门面：单一入口
//!
//! receive → classify → route → stream/record → return。
//! 组件在启动期显式注入（无全局单例）；同步与流式两种调用口径，
//! 流式被取消的轮次不写入会话历史。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::conversation::{ConversationStore, Turn};
use crate::core::{RequestContext, Response};
use crate::intent::{Classification, IntentClassifier, IntentKind};
use crate::providers::StatusBoard;
use crate::router::ProviderRouter;
use crate::stream::{stream_response, StreamEvent};

/// 编排门面：持有分类器、路由器、会话存储与状态板
#[derive(Clone)]
pub struct Coach {
    classifier: Arc<IntentClassifier>,
    router: Arc<ProviderRouter>,
    store: Arc<ConversationStore>,
    status: Arc<StatusBoard>,
    chunk_delay: Duration,
}

impl Coach {
    pub fn new(
        classifier: IntentClassifier,
        router: ProviderRouter,
        store: ConversationStore,
        status: Arc<StatusBoard>,
        chunk_delay: Duration,
    ) -> Self {
        Self {
            classifier: Arc::new(classifier),
            router: Arc::new(router),
            store: Arc::new(store),
            status,
            chunk_delay,
        }
    }

    /// 同步口径：总是返回一个可用 Response（最差为兜底回答），不抛上游错误
    pub async fn orchestrate(&self, ctx: RequestContext) -> Response {
        let token = CancellationToken::new();
        let (response, classification) = self.run(&ctx, &token).await;
        self.record(&ctx, &response, classification.intent).await;
        response
    }

    /// 流式口径：返回事件接收端与取消令牌；取消后不再发分片、该轮不入会话历史
    pub fn orchestrate_stream(
        &self,
        ctx: RequestContext,
    ) -> (mpsc::Receiver<StreamEvent>, CancellationToken) {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(64);
        let coach = self.clone();
        let task_token = token.clone();

        tokio::spawn(async move {
            let (response, classification) = coach.run(&ctx, &task_token).await;
            let (mut inner_rx, handle) =
                stream_response(response.clone(), coach.chunk_delay, task_token.clone());
            while let Some(event) = inner_rx.recv().await {
                if tx.send(event).await.is_err() {
                    task_token.cancel();
                    break;
                }
            }
            let completed = handle.await.unwrap_or(false);
            if completed {
                coach.record(&ctx, &response, classification.intent).await;
            } else {
                tracing::debug!(request = %ctx.id, "stream cancelled, skipping conversation append");
            }
        });

        (rx, token)
    }

    async fn run(&self, ctx: &RequestContext, token: &CancellationToken) -> (Response, Classification) {
        let classification = match ctx.text.as_deref() {
            Some(text) => self.classifier.classify(text),
            None => Classification {
                intent: IntentKind::Generic,
                tool: None,
                params: serde_json::Value::Null,
            },
        };
        tracing::debug!(
            request = %ctx.id,
            intent = classification.intent.as_str(),
            tool = ?classification.tool,
            "classified"
        );

        let summary_line = match &ctx.conversation_id {
            Some(id) => self.store.summarize(id).await.map(|s| s.as_prompt_line()),
            None => None,
        };

        let response = self
            .router
            .route(ctx, &classification, summary_line, token)
            .await;
        (response, classification)
    }

    /// 将本轮写入会话历史（无 conversation_id 的临时请求不记录）
    async fn record(&self, ctx: &RequestContext, response: &Response, intent: IntentKind) {
        if let Some(id) = &ctx.conversation_id {
            let turn = Turn::new(ctx.id.clone(), ctx.prompt_text(), response.clone());
            self.store.append(id, turn, intent).await;
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn status(&self) -> &Arc<StatusBoard> {
        &self.status
    }

    /// 回收闲置会话（宿主可定时调用）
    pub async fn gc_conversations(&self) -> usize {
        self.store.gc_idle().await
    }
}
