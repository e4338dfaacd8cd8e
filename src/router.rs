//! Provider 路由与回退链
//!
//! 失败在这里被统一吸收：有工具意图先走注册表（确定性、无网络抖动），
//! 否则按策略排序的候选 Provider 逐个尝试（单次超时 + 整链截止时间），
//! 全部失败时落到离线兜底应答器 —— 对调用方的契约是「永远返回一个 Response」。
//! 适配器不自行重试，重试与降权记账集中于此。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::{CoachError, RequestContext, Response};
use crate::fallback::FallbackResponder;
use crate::intent::Classification;
use crate::providers::{Provider, RespondOptions, StatusBoard};
use crate::tools::ToolRegistry;

/// 候选排序策略（配置项，不在运行时臆测）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterPolicy {
    /// 严格按配置顺序
    Static,
    /// 每次调用轮转起点（负载均衡）
    RoundRobin,
    /// 按配置顺序，但连续失败达到阈值的候选移到队尾（降权不排除）
    PriorityWithPenalty { penalty_threshold: u32 },
}

/// 路由器时间约束
#[derive(Debug, Clone)]
pub struct RouterLimits {
    /// 单个候选的硬超时
    pub per_attempt_timeout: Duration,
    /// 整条链的总截止时间（sum(timeouts) 的上界）
    pub overall_deadline: Duration,
}

impl Default for RouterLimits {
    fn default() -> Self {
        Self {
            per_attempt_timeout: Duration::from_secs(4),
            overall_deadline: Duration::from_secs(12),
        }
    }
}

/// Provider 路由器：工具优先，Provider 链回退，兜底收尾
pub struct ProviderRouter {
    providers: Vec<Arc<dyn Provider>>,
    registry: Arc<ToolRegistry>,
    status: Arc<StatusBoard>,
    fallback: FallbackResponder,
    policy: RouterPolicy,
    limits: RouterLimits,
    system_prompt: String,
    rr_cursor: AtomicUsize,
}

impl ProviderRouter {
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        registry: Arc<ToolRegistry>,
        status: Arc<StatusBoard>,
        policy: RouterPolicy,
        limits: RouterLimits,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            registry,
            status,
            fallback: FallbackResponder,
            policy,
            limits,
            system_prompt: system_prompt.into(),
            rr_cursor: AtomicUsize::new(0),
        }
    }

    /// 路由一个请求；绝不失败，最差情况返回兜底回答
    pub async fn route(
        &self,
        ctx: &RequestContext,
        classification: &Classification,
        summary_line: Option<String>,
        token: &CancellationToken,
    ) -> Response {
        // 1. 结构化工具优先：便宜、确定、无网络方差
        if let Some(tool) = &classification.tool {
            match self.registry.execute(tool, classification.params.clone()).await {
                Ok(result) if result.success => {
                    let payload = result.payload.unwrap_or(serde_json::Value::Null);
                    let content = serde_json::to_string_pretty(&payload)
                        .unwrap_or_else(|_| payload.to_string());
                    return Response::new(content, "tools", 0.98)
                        .with_tools(vec![tool.clone()]);
                }
                Ok(result) => {
                    tracing::warn!(tool, error = ?result.error, "tool failed, falling through to providers");
                }
                Err(e) => {
                    tracing::warn!(tool, error = %e, "tool dispatch failed, falling through to providers");
                }
            }
        }

        // 2. 按策略排序的候选链
        let prompt = ctx.prompt_text();
        let deadline = Instant::now() + self.limits.overall_deadline;
        for idx in self.candidate_order().await {
            let provider = &self.providers[idx];
            if token.is_cancelled() {
                tracing::debug!(request = %ctx.id, "caller cancelled, aborting chain");
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(request = %ctx.id, "overall deadline exceeded, aborting chain");
                break;
            }

            let attempt_timeout = self.limits.per_attempt_timeout.min(remaining);
            let mut options = RespondOptions::new(attempt_timeout)
                .with_system_prompt(self.system_prompt.clone());
            if let Some(line) = &summary_line {
                options = options.with_summary(line.clone());
            }

            self.status.mark_trying(provider.id()).await;
            let started = Instant::now();
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(CoachError::Timeout(provider.id().to_string())),
                r = tokio::time::timeout(attempt_timeout, provider.respond(&prompt, &options)) => {
                    r.unwrap_or_else(|_| Err(CoachError::Timeout(provider.id().to_string())))
                }
            };

            match outcome {
                Ok(response) => {
                    self.status.mark_success(provider.id(), started.elapsed()).await;
                    tracing::info!(provider = provider.id(), latency_ms = started.elapsed().as_millis() as u64, "provider succeeded");
                    return response;
                }
                Err(e) => {
                    self.status.mark_failed(provider.id()).await;
                    match &e {
                        CoachError::Authentication(_) => {
                            // 不可恢复，直接跳下一个候选
                            tracing::warn!(provider = provider.id(), "authentication failed, skipping");
                        }
                        _ => {
                            tracing::warn!(provider = provider.id(), error = %e, "provider attempt failed");
                        }
                    }
                    if token.is_cancelled() {
                        break;
                    }
                }
            }
        }

        // 3. 所有候选耗尽：离线兜底（AllProvidersExhausted 不外泄）
        tracing::warn!(request = %ctx.id, "all providers exhausted, serving fallback");
        self.fallback.respond(classification.intent, &prompt)
    }

    /// 依策略产出候选下标顺序
    async fn candidate_order(&self) -> Vec<usize> {
        let n = self.providers.len();
        let base: Vec<usize> = (0..n).collect();
        match self.policy {
            RouterPolicy::Static => base,
            RouterPolicy::RoundRobin => {
                if n == 0 {
                    return base;
                }
                let start = self.rr_cursor.fetch_add(1, Ordering::Relaxed) % n;
                (0..n).map(|i| (start + i) % n).collect()
            }
            RouterPolicy::PriorityWithPenalty { penalty_threshold } => {
                let mut healthy = Vec::with_capacity(n);
                let mut penalized = Vec::new();
                for idx in base {
                    let failures = self
                        .status
                        .consecutive_failures(self.providers[idx].id())
                        .await;
                    if failures >= penalty_threshold {
                        penalized.push(idx);
                    } else {
                        healthy.push(idx);
                    }
                }
                healthy.extend(penalized);
                healthy
            }
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FALLBACK_PROVIDER;
    use crate::intent::IntentClassifier;
    use crate::providers::{MockBehavior, MockProvider};
    use crate::tools::{register_plugin, CoachingToolkit};

    async fn registry() -> Arc<ToolRegistry> {
        let mut r = ToolRegistry::new();
        register_plugin(&mut r, &CoachingToolkit).await.unwrap();
        Arc::new(r)
    }

    fn router_with(
        providers: Vec<Arc<dyn Provider>>,
        registry: Arc<ToolRegistry>,
        policy: RouterPolicy,
        limits: RouterLimits,
    ) -> ProviderRouter {
        ProviderRouter::new(
            providers,
            registry,
            StatusBoard::new(),
            policy,
            limits,
            "You are a fitness coach.",
        )
    }

    fn ctx(text: &str) -> RequestContext {
        RequestContext::from_text(text).unwrap()
    }

    #[tokio::test]
    async fn test_tool_intent_short_circuits_providers() {
        let provider = Arc::new(MockProvider::new("m1", MockBehavior::Succeed("chat".into())));
        let router = router_with(
            vec![provider.clone()],
            registry().await,
            RouterPolicy::Static,
            RouterLimits::default(),
        );
        let request = ctx("generate a 45 minute strength workout with dumbbells");
        let classification = IntentClassifier::new().classify(request.text.as_deref().unwrap());
        let resp = router
            .route(&request, &classification, None, &CancellationToken::new())
            .await;
        assert_eq!(resp.provider, "tools");
        assert_eq!(resp.tools_used, vec!["plan_workout".to_string()]);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_all_failed_serves_fallback() {
        let a = Arc::new(MockProvider::new("a", MockBehavior::FailUpstream));
        let b = Arc::new(MockProvider::new("b", MockBehavior::FailAuth));
        let router = router_with(
            vec![a.clone(), b.clone()],
            registry().await,
            RouterPolicy::Static,
            RouterLimits::default(),
        );
        let request = ctx("I need motivation");
        let classification = IntentClassifier::new().classify("I need motivation");
        let resp = router
            .route(&request, &classification, None, &CancellationToken::new())
            .await;
        assert_eq!(resp.provider, FALLBACK_PROVIDER);
        assert!(resp.confidence < 0.9);
        assert!(!resp.content.is_empty());
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_chain_tries_next_candidate() {
        let a = Arc::new(MockProvider::new("a", MockBehavior::FailUpstream));
        let b = Arc::new(MockProvider::new("b", MockBehavior::Succeed("from b".into())));
        let router = router_with(
            vec![a.clone(), b.clone()],
            registry().await,
            RouterPolicy::Static,
            RouterLimits::default(),
        );
        let request = ctx("tell me something interesting");
        let classification = IntentClassifier::new().classify("tell me something interesting");
        let resp = router
            .route(&request, &classification, None, &CancellationToken::new())
            .await;
        assert_eq!(resp.provider, "b");
        assert_eq!(resp.content, "from b");
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_and_chain_continues() {
        let slow = Arc::new(MockProvider::new(
            "slow",
            MockBehavior::DelayThenSucceed(Duration::from_millis(500), "late".into()),
        ));
        let fast = Arc::new(MockProvider::new("fast", MockBehavior::Succeed("quick".into())));
        let limits = RouterLimits {
            per_attempt_timeout: Duration::from_millis(50),
            overall_deadline: Duration::from_secs(2),
        };
        let router = router_with(
            vec![slow, fast],
            registry().await,
            RouterPolicy::Static,
            limits,
        );
        let request = ctx("say hi");
        let classification = IntentClassifier::new().classify("say hi");
        let resp = router
            .route(&request, &classification, None, &CancellationToken::new())
            .await;
        assert_eq!(resp.provider, "fast");
    }

    #[tokio::test]
    async fn test_overall_deadline_skips_remaining_candidates() {
        let slow = Arc::new(MockProvider::new(
            "slow",
            MockBehavior::DelayThenSucceed(Duration::from_millis(500), "late".into()),
        ));
        let never_reached = Arc::new(MockProvider::new("next", MockBehavior::Succeed("hi".into())));
        let limits = RouterLimits {
            per_attempt_timeout: Duration::from_millis(80),
            overall_deadline: Duration::from_millis(60),
        };
        let router = router_with(
            vec![slow, never_reached.clone()],
            registry().await,
            RouterPolicy::Static,
            limits,
        );
        let request = ctx("say hi");
        let classification = IntentClassifier::new().classify("say hi");
        let resp = router
            .route(&request, &classification, None, &CancellationToken::new())
            .await;
        assert_eq!(resp.provider, FALLBACK_PROVIDER);
        assert_eq!(never_reached.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_request_goes_straight_to_fallback() {
        let a = Arc::new(MockProvider::new("a", MockBehavior::Succeed("hi".into())));
        let router = router_with(
            vec![a.clone()],
            registry().await,
            RouterPolicy::Static,
            RouterLimits::default(),
        );
        let token = CancellationToken::new();
        token.cancel();
        let request = ctx("say hi");
        let classification = IntentClassifier::new().classify("say hi");
        let resp = router.route(&request, &classification, None, &token).await;
        assert_eq!(resp.provider, FALLBACK_PROVIDER);
        assert_eq!(a.call_count(), 0);
    }

    #[tokio::test]
    async fn test_penalty_deprioritizes_failing_provider() {
        let flaky = Arc::new(MockProvider::new("flaky", MockBehavior::FailUpstream));
        let steady = Arc::new(MockProvider::new("steady", MockBehavior::Succeed("ok".into())));
        let router = router_with(
            vec![flaky.clone(), steady],
            registry().await,
            RouterPolicy::PriorityWithPenalty { penalty_threshold: 2 },
            RouterLimits::default(),
        );
        let classification = IntentClassifier::new().classify("say hi");
        for _ in 0..3 {
            let request = ctx("say hi");
            let resp = router
                .route(&request, &classification, None, &CancellationToken::new())
                .await;
            assert_eq!(resp.provider, "steady");
        }
        // 前两轮 flaky 各被尝试一次；第三轮其连续失败已达阈值，被移到队尾且 steady 先成功
        assert_eq!(flaky.call_count(), 2);
    }

    #[tokio::test]
    async fn test_round_robin_alternates_start() {
        let a = Arc::new(MockProvider::new("a", MockBehavior::Succeed("from a".into())));
        let b = Arc::new(MockProvider::new("b", MockBehavior::Succeed("from b".into())));
        let router = router_with(
            vec![a, b],
            registry().await,
            RouterPolicy::RoundRobin,
            RouterLimits::default(),
        );
        let classification = IntentClassifier::new().classify("say hi");
        let first = router
            .route(&ctx("say hi"), &classification, None, &CancellationToken::new())
            .await;
        let second = router
            .route(&ctx("say hi"), &classification, None, &CancellationToken::new())
            .await;
        assert_ne!(first.provider, second.provider);
    }

    #[tokio::test]
    async fn test_tool_failure_falls_through_to_providers() {
        // 营养工具对不认识的食物返回失败，链路应继续走 Provider
        let p = Arc::new(MockProvider::new("p", MockBehavior::Succeed("provider answer".into())));
        let router = router_with(
            vec![p.clone()],
            registry().await,
            RouterPolicy::Static,
            RouterLimits::default(),
        );
        let text = "what should I eat, only mystery goo available";
        let request = ctx(text);
        let classification = IntentClassifier::new().classify(text);
        assert_eq!(classification.tool.as_deref(), Some("analyze_nutrition"));
        let resp = router
            .route(&request, &classification, None, &CancellationToken::new())
            .await;
        assert_eq!(resp.provider, "p");
        assert_eq!(p.call_count(), 1);
    }
}
