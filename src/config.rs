//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SPOTTER__*` 覆盖
//! （双下划线表示嵌套，如 `SPOTTER__ROUTER__POLICY=round_robin`）。

use serde::Deserialize;

use crate::router::{RouterLimits, RouterPolicy};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub providers: ProvidersSection,
    pub router: RouterSection,
    pub conversation: ConversationSection,
    pub streaming: StreamingSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 注入 Provider 的教练人设 prompt；未设置时用内置默认
    pub system_prompt: Option<String>,
}

/// [providers] 段：各上游后端的端点与凭证
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersSection {
    pub openai: OpenAiProviderSection,
    pub relay: RelayProviderSection,
}

/// [providers.openai] 段：OpenAI 兼容端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiProviderSection {
    pub enabled: bool,
    pub base_url: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// 未设置时回退到环境变量 OPENAI_API_KEY
    pub api_key: Option<String>,
}

impl Default for OpenAiProviderSection {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            model: default_openai_model(),
            api_key: None,
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

/// [providers.relay] 段：自建 relay 推理端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayProviderSection {
    pub enabled: bool,
    #[serde(default = "default_relay_base_url")]
    pub base_url: String,
    #[serde(default = "default_relay_model")]
    pub model: String,
    /// 未设置时回退到环境变量 RELAY_API_KEY
    pub api_key: Option<String>,
}

impl Default for RelayProviderSection {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_relay_base_url(),
            model: default_relay_model(),
            api_key: None,
        }
    }
}

fn default_relay_base_url() -> String {
    "http://localhost:8787".to_string()
}

fn default_relay_model() -> String {
    "coach-mini".to_string()
}

/// [router] 段：候选顺序、策略与时间约束
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterSection {
    /// static / round_robin / priority_with_penalty
    #[serde(default = "default_policy")]
    pub policy: String,
    /// 候选优先级顺序（Provider id）
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,
    #[serde(default = "default_per_attempt_timeout")]
    pub per_attempt_timeout_secs: u64,
    #[serde(default = "default_overall_deadline")]
    pub overall_deadline_secs: u64,
    /// 连续失败达到该值的候选被移到队尾
    #[serde(default = "default_penalty_threshold")]
    pub penalty_threshold: u32,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            priority: default_priority(),
            per_attempt_timeout_secs: default_per_attempt_timeout(),
            overall_deadline_secs: default_overall_deadline(),
            penalty_threshold: default_penalty_threshold(),
        }
    }
}

fn default_policy() -> String {
    "priority_with_penalty".to_string()
}

fn default_priority() -> Vec<String> {
    vec!["openai".into(), "relay".into()]
}

fn default_per_attempt_timeout() -> u64 {
    4
}

fn default_overall_deadline() -> u64 {
    12
}

fn default_penalty_threshold() -> u32 {
    2
}

impl RouterSection {
    pub fn policy(&self) -> RouterPolicy {
        match self.policy.as_str() {
            "static" => RouterPolicy::Static,
            "round_robin" => RouterPolicy::RoundRobin,
            _ => RouterPolicy::PriorityWithPenalty {
                penalty_threshold: self.penalty_threshold,
            },
        }
    }

    pub fn limits(&self) -> RouterLimits {
        RouterLimits {
            per_attempt_timeout: std::time::Duration::from_secs(self.per_attempt_timeout_secs.max(1)),
            overall_deadline: std::time::Duration::from_secs(self.overall_deadline_secs.max(1)),
        }
    }
}

/// [conversation] 段：历史上限与闲置回收
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationSection {
    /// 单会话保留轮数上限（FIFO 淘汰）
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// 闲置回收阈值（秒）
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,
}

impl Default for ConversationSection {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            idle_ttl_secs: default_idle_ttl(),
        }
    }
}

fn default_max_turns() -> usize {
    20
}

fn default_idle_ttl() -> u64 {
    1800
}

/// [streaming] 段：分片投递节奏
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamingSection {
    /// 相邻分片间隔（毫秒）；0 表示不加延迟
    #[serde(default)]
    pub chunk_delay_ms: u64,
}

impl Default for StreamingSection {
    fn default() -> Self {
        Self { chunk_delay_ms: 0 }
    }
}

/// 从 config 目录加载配置，环境变量 SPOTTER__* 可覆盖
pub fn load_config(config_path: Option<std::path::PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{name}.toml");
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SPOTTER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.conversation.max_turns, 20);
        assert_eq!(cfg.conversation.idle_ttl_secs, 1800);
        assert_eq!(cfg.router.per_attempt_timeout_secs, 4);
        assert!(matches!(
            cfg.router.policy(),
            RouterPolicy::PriorityWithPenalty { penalty_threshold: 2 }
        ));
    }

    #[test]
    fn test_policy_parsing() {
        let mut section = RouterSection::default();
        section.policy = "round_robin".to_string();
        assert_eq!(section.policy(), RouterPolicy::RoundRobin);
        section.policy = "static".to_string();
        assert_eq!(section.policy(), RouterPolicy::Static);
    }
}
