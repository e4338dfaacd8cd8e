//! 离线兜底应答器
//!
//! 所有 Provider 与工具都失败时的最后一道防线：按意图类别返回预置回答，
//! 永不失败、不走网络、非流式；provider 标记为 "fallback"、置信度固定偏低，
//! 供下游 UI / 测试区分降级回答与真实回答。

use crate::core::Response;
use crate::intent::IntentKind;

/// 兜底回答的 provider 标签
pub const FALLBACK_PROVIDER: &str = "fallback";

/// 兜底回答的固定置信度（低于真实 Provider 的 0.9+）
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

const MOTIVATION: &[&str] = &[
    "Showing up is the hardest part, and you're already here. One set at a time.",
    "Progress is built on the days you didn't feel like it. Start small: five minutes, then decide.",
    "Your future self is watching this workout. Make them proud.",
];

const NUTRITION: &[&str] = &[
    "A solid default plate: a palm of protein, a fist of vegetables, a cupped hand of carbs, and plenty of water.",
    "Focus on protein at every meal and mostly whole foods. Consistency beats perfection.",
];

const FORM: &[&str] = &[
    "General form rules: move through a controlled range, keep your core braced, and stop a rep short of breakdown. When in doubt, lighten the load.",
    "Film a set from the side and compare it to a reference video. Slow, controlled reps reveal form issues fast.",
];

const PLANNING: &[&str] = &[
    "A reliable template: 5–10 minutes of warm-up, 3–4 compound movements for 3 sets each, then a short cooldown. Train 3–4 days a week and add a little load or a rep each session.",
    "Pick one push, one pull, one squat or hinge, and one core movement. Three rounds, rest as needed.",
];

const BIOMETRICS: &[&str] = &[
    "Without live readings I can still say this: prioritize sleep, and if your resting heart rate is unusually high today, train lighter.",
];

const GENERIC: &[&str] = &[
    "I'm here to help with workouts, nutrition, form, and motivation. What would you like to work on?",
    "Let's keep it moving. Ask me for a workout, a meal check, or a form tip.",
];

/// 规则式兜底应答器：同一输入恒得同一回答
pub struct FallbackResponder;

impl FallbackResponder {
    /// 按意图类别返回完整（非流式）回答；绝不失败
    pub fn respond(&self, intent: IntentKind, text: &str) -> Response {
        let pool = match intent {
            IntentKind::Motivation => MOTIVATION,
            IntentKind::Nutrition => NUTRITION,
            IntentKind::Form => FORM,
            IntentKind::Planning => PLANNING,
            IntentKind::Biometrics => BIOMETRICS,
            IntentKind::Generic => GENERIC,
        };
        // 用输入长度做确定性选择，既有变化又可复现
        let pick = pool[text.len() % pool.len()];
        Response::new(pick, FALLBACK_PROVIDER, FALLBACK_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_empty_and_tagged() {
        let responder = FallbackResponder;
        for intent in [
            IntentKind::Motivation,
            IntentKind::Nutrition,
            IntentKind::Form,
            IntentKind::Planning,
            IntentKind::Biometrics,
            IntentKind::Generic,
        ] {
            let resp = responder.respond(intent, "anything");
            assert!(!resp.content.is_empty());
            assert_eq!(resp.provider, FALLBACK_PROVIDER);
            assert!(resp.confidence < 0.9);
            assert!(resp.complete);
        }
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let responder = FallbackResponder;
        let a = responder.respond(IntentKind::Motivation, "I need motivation");
        let b = responder.respond(IntentKind::Motivation, "I need motivation");
        assert_eq!(a.content, b.content);
    }
}
