//! 意图分类器
//!
//! 有序规则表（关键词 / 正则）自顶向下求值，首条命中即生效：规则顺序就是优先级，
//! 同时含「计划」与「营养」关键词的输入按排前的规则裁决，可审计、可穷举测试。
//! 无命中 ⇒ tool=None，请求走开放式 Provider 聊天而非结构化工具。

use regex::Regex;
use serde_json::Value;

/// 意图类别（FallbackResponder 按同一套类别出兜底回答）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Planning,
    Nutrition,
    Biometrics,
    Form,
    Motivation,
    Generic,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Planning => "planning",
            IntentKind::Nutrition => "nutrition",
            IntentKind::Biometrics => "biometrics",
            IntentKind::Form => "form",
            IntentKind::Motivation => "motivation",
            IntentKind::Generic => "generic",
        }
    }
}

/// 分类结果：意图类别、可选工具与提取出的参数
#[derive(Debug, Clone)]
pub struct Classification {
    pub intent: IntentKind,
    /// None ⇒ 路由到开放式聊天
    pub tool: Option<String>,
    pub params: Value,
}

struct IntentRule {
    intent: IntentKind,
    tool: Option<&'static str>,
    pattern: Regex,
}

/// 意图分类器：规则在构造时编译一次，classify 为纯函数
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        // 顺序即优先级：训练计划 > 营养 > 生理指标 > 动作要领 > 激励
        let rules = vec![
            rule(
                IntentKind::Planning,
                Some("plan_workout"),
                r"(?i)\b(workout|training|session|program|plan|routine)\b",
            ),
            rule(
                IntentKind::Nutrition,
                Some("analyze_nutrition"),
                r"(?i)\b(nutrition|calorie|calories|macro|macros|protein|meal|diet|ate|eat|food)\b",
            ),
            rule(
                IntentKind::Biometrics,
                Some("interpret_biometrics"),
                r"(?i)\b(heart rate|hrv|resting hr|sleep|recovery|readiness|bpm)\b",
            ),
            rule(
                IntentKind::Form,
                Some("lookup_exercise"),
                r"(?i)\b(form|technique|how (do i|to) (do|perform)|cue|cues|posture)\b",
            ),
            rule(
                IntentKind::Motivation,
                None,
                r"(?i)\b(motivat\w*|discourag\w*|tired|give up|lazy|can.?t do)\b",
            ),
        ];
        Self { rules }
    }

    /// 纯函数：文本 → 分类；确定性、无副作用
    pub fn classify(&self, text: &str) -> Classification {
        for r in &self.rules {
            if r.pattern.is_match(text) {
                return Classification {
                    intent: r.intent,
                    tool: r.tool.map(String::from),
                    params: extract_params(r.intent, text),
                };
            }
        }
        Classification {
            intent: IntentKind::Generic,
            tool: None,
            params: Value::Null,
        }
    }
}

fn rule(intent: IntentKind, tool: Option<&'static str>, pattern: &str) -> IntentRule {
    IntentRule {
        intent,
        tool,
        // 模式是编译期常量，失败只会发生在开发期
        pattern: Regex::new(pattern).expect("invalid intent rule pattern"),
    }
}

/// 按意图从原文提取工具参数
fn extract_params(intent: IntentKind, text: &str) -> Value {
    let lower = text.to_lowercase();
    match intent {
        IntentKind::Planning => {
            let duration = Regex::new(r"(\d+)\s*(?:min|minute|minutes)")
                .ok()
                .and_then(|re| re.captures(&lower))
                .and_then(|c| c[1].parse::<u64>().ok())
                .unwrap_or(45);
            let focus = if lower.contains("cardio") || lower.contains("conditioning") {
                "cardio"
            } else if lower.contains("mobility") || lower.contains("stretch") {
                "mobility"
            } else if lower.contains("strength") || lower.contains("weights") {
                "strength"
            } else {
                "full_body"
            };
            let equipment = ["dumbbell", "barbell", "kettlebell", "band", "machine"]
                .iter()
                .find(|e| lower.contains(*e))
                .map(|e| format!("{e}s"))
                .unwrap_or_else(|| "bodyweight".to_string());
            serde_json::json!({
                "duration_minutes": duration,
                "focus": focus,
                "equipment": equipment,
            })
        }
        IntentKind::Nutrition => serde_json::json!({ "meal": text }),
        IntentKind::Biometrics => {
            let mut params = serde_json::Map::new();
            if let Some(c) = Regex::new(r"(\d+)\s*bpm")
                .ok()
                .and_then(|re| re.captures(&lower))
            {
                if let Ok(v) = c[1].parse::<f64>() {
                    params.insert("heart_rate".into(), v.into());
                }
            }
            if let Some(c) = Regex::new(r"(\d+(?:\.\d+)?)\s*(?:h|hours?)\s+(?:of\s+)?sleep")
                .ok()
                .and_then(|re| re.captures(&lower))
            {
                if let Ok(v) = c[1].parse::<f64>() {
                    params.insert("sleep_hours".into(), v.into());
                }
            }
            if params.is_empty() {
                // 没抓到数值时仍给最低限度输入，让工具给出普适建议
                params.insert("sleep_hours".into(), 7.0.into());
            }
            Value::Object(params)
        }
        IntentKind::Form => {
            let known = [
                ("squat", "squat"),
                ("deadlift", "deadlift"),
                ("push-up", "push-up"),
                ("pushup", "push-up"),
                ("plank", "plank"),
                ("lunge", "lunge"),
            ];
            let name = known
                .iter()
                .find(|(kw, _)| lower.contains(kw))
                .map(|(_, canonical)| *canonical)
                .unwrap_or("squat");
            serde_json::json!({ "name": name })
        }
        _ => Value::Null,
    }
}
