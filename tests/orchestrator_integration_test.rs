//! 编排门面集成测试
//!
//! 用 MockProvider 走完整链路：工具直达、全失败兜底、会话记录与流式取消。

use std::sync::Arc;
use std::time::Duration;

use spotter::core::CoachBuilder;
use spotter::fallback::FALLBACK_PROVIDER;
use spotter::providers::{MockBehavior, MockProvider, Provider};
use spotter::stream::StreamEvent;
use spotter::{AppConfig, RequestContext};

/// 关闭配置内真实 Provider，只保留测试注入的 Mock
fn offline_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.providers.openai.enabled = false;
    cfg.providers.relay.enabled = false;
    cfg.streaming.chunk_delay_ms = 10;
    cfg
}

#[tokio::test]
async fn test_motivation_with_no_providers_hits_fallback() {
    let coach = CoachBuilder::new(offline_config()).build().await.unwrap();
    let request = RequestContext::from_text("I need motivation").unwrap();

    let response = coach.orchestrate(request).await;
    assert_eq!(response.provider, FALLBACK_PROVIDER);
    assert!(response.confidence < 0.9);
    assert!(!response.content.is_empty());
    assert!(response.complete);
}

#[tokio::test]
async fn test_workout_request_routes_to_tool_not_chat() {
    let provider = Arc::new(MockProvider::new("chat", MockBehavior::Succeed("chat".into())));
    let coach = CoachBuilder::new(offline_config())
        .with_provider(provider.clone() as Arc<dyn Provider>)
        .build()
        .await
        .unwrap();
    let request =
        RequestContext::from_text("generate a 45 minute strength workout with dumbbells").unwrap();

    let response = coach.orchestrate(request).await;
    assert_eq!(response.provider, "tools");
    assert_eq!(response.tools_used, vec!["plan_workout".to_string()]);
    assert!(response.content.contains("strength"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_sequential_turns_recorded_in_order() {
    let provider = Arc::new(MockProvider::new("m", MockBehavior::Succeed("sure".into())));
    let coach = CoachBuilder::new(offline_config())
        .with_provider(provider as Arc<dyn Provider>)
        .build()
        .await
        .unwrap();

    let first = RequestContext::from_text("hello coach")
        .unwrap()
        .with_conversation("conv-1");
    let second = RequestContext::from_text("one more thing")
        .unwrap()
        .with_conversation("conv-1");
    let first_id = first.id.clone();
    let second_id = second.id.clone();

    coach.orchestrate(first).await;
    coach.orchestrate(second).await;

    let summary = coach.store().summarize("conv-1").await.unwrap();
    assert_eq!(summary.turn_count, 2);

    let turns = coach.store().turns("conv-1").await;
    assert_eq!(turns[0].request_id, first_id);
    assert_eq!(turns[1].request_id, second_id);
}

#[tokio::test]
async fn test_stream_cancellation_skips_conversation_append() {
    let provider = Arc::new(MockProvider::new(
        "m",
        MockBehavior::Succeed("a fairly long answer with many words to stream".into()),
    ));
    let coach = CoachBuilder::new(offline_config())
        .with_provider(provider as Arc<dyn Provider>)
        .build()
        .await
        .unwrap();

    let request = RequestContext::from_text("hello coach")
        .unwrap()
        .with_conversation("conv-cancel");
    let (mut rx, cancel) = coach.orchestrate_stream(request);

    let first = rx.recv().await;
    assert!(matches!(first, Some(StreamEvent::Chunk(_))));
    cancel.cancel();

    let mut saw_complete = false;
    while let Some(event) = rx.recv().await {
        if matches!(event, StreamEvent::Complete(_)) {
            saw_complete = true;
        }
    }
    assert!(!saw_complete);

    // 取消的轮次不得写入历史
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(coach.store().summarize("conv-cancel").await.is_none());
}

#[tokio::test]
async fn test_completed_stream_appends_turn() {
    let provider = Arc::new(MockProvider::new("m", MockBehavior::Succeed("short answer".into())));
    let coach = CoachBuilder::new(offline_config())
        .with_provider(provider as Arc<dyn Provider>)
        .build()
        .await
        .unwrap();

    let request = RequestContext::from_text("hello coach")
        .unwrap()
        .with_conversation("conv-stream");
    let (mut rx, _cancel) = coach.orchestrate_stream(request);

    let mut complete = None;
    while let Some(event) = rx.recv().await {
        if let StreamEvent::Complete(r) = event {
            complete = Some(r);
        }
    }
    let complete = complete.unwrap();
    assert_eq!(complete.content, "short answer");

    // Complete 发出后写入在同一任务内完成，稍候即可见
    tokio::time::sleep(Duration::from_millis(50)).await;
    let summary = coach.store().summarize("conv-stream").await.unwrap();
    assert_eq!(summary.turn_count, 1);
}

#[tokio::test]
async fn test_orchestrate_always_answers_within_deadline() {
    let mut cfg = offline_config();
    cfg.router.per_attempt_timeout_secs = 1;
    cfg.router.overall_deadline_secs = 1;
    let slow = Arc::new(MockProvider::new(
        "slow",
        MockBehavior::DelayThenSucceed(Duration::from_secs(30), "late".into()),
    ));
    let coach = CoachBuilder::new(cfg)
        .with_provider(slow as Arc<dyn Provider>)
        .build()
        .await
        .unwrap();

    let request = RequestContext::from_text("tell me something interesting").unwrap();
    let response = tokio::time::timeout(Duration::from_secs(5), coach.orchestrate(request))
        .await
        .expect("orchestrate must not hang");
    assert!(!response.content.is_empty());
    assert_eq!(response.provider, FALLBACK_PROVIDER);
}

#[tokio::test]
async fn test_auth_failure_skips_to_next_provider() {
    let no_key = Arc::new(MockProvider::new("no-key", MockBehavior::FailAuth));
    let good = Arc::new(MockProvider::new("good", MockBehavior::Succeed("hi there".into())));
    let coach = CoachBuilder::new(offline_config())
        .with_provider(no_key.clone() as Arc<dyn Provider>)
        .with_provider(good as Arc<dyn Provider>)
        .build()
        .await
        .unwrap();

    let request = RequestContext::from_text("tell me something interesting").unwrap();
    let response = coach.orchestrate(request).await;
    assert_eq!(response.provider, "good");
    assert_eq!(no_key.call_count(), 1);
}
