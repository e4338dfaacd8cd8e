//! 生理指标解读工具
//!
//! 对心率 / 静息心率 / 睡眠时长等快照给出区间判断与训练强度建议，纯查表逻辑。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{ParamKind, Tool, ToolSchema};

/// interpret_biometrics：生理指标快照 → 解读与建议
pub struct InterpretBiometricsTool;

#[async_trait]
impl Tool for InterpretBiometricsTool {
    fn name(&self) -> &str {
        "interpret_biometrics"
    }

    fn description(&self) -> &str {
        "Interpret biometric readings and suggest training intensity. Args: {\"heart_rate\": 72, \"resting_heart_rate\": 58, \"sleep_hours\": 7.5, \"age\": 30}"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .param("heart_rate", ParamKind::Number, false, None)
            .param("resting_heart_rate", ParamKind::Number, false, None)
            .param("sleep_hours", ParamKind::Number, false, None)
            .param("age", ParamKind::Number, false, None)
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let hr = args.get("heart_rate").and_then(|v| v.as_f64());
        let rhr = args.get("resting_heart_rate").and_then(|v| v.as_f64());
        let sleep = args.get("sleep_hours").and_then(|v| v.as_f64());
        let age = args.get("age").and_then(|v| v.as_f64()).unwrap_or(35.0);

        if hr.is_none() && rhr.is_none() && sleep.is_none() {
            return Err("provide at least one of heart_rate, resting_heart_rate, sleep_hours".into());
        }

        let mut findings = Vec::new();
        let mut recovery_score: i32 = 100;

        if let Some(rhr) = rhr {
            let level = match rhr {
                r if r < 50.0 => "athlete-level",
                r if r < 60.0 => "good",
                r if r < 70.0 => "average",
                _ => "elevated",
            };
            if rhr >= 70.0 {
                recovery_score -= 25;
            }
            findings.push(format!("resting heart rate {rhr:.0} bpm ({level})"));
        }
        if let Some(hr) = hr {
            let max_hr = 220.0 - age;
            let pct = (hr / max_hr * 100.0).round();
            findings.push(format!("current heart rate is {pct:.0}% of estimated max"));
            if pct > 85.0 {
                recovery_score -= 20;
            }
        }
        if let Some(sleep) = sleep {
            if sleep < 6.0 {
                recovery_score -= 30;
                findings.push(format!("only {sleep:.1}h of sleep, under-recovered"));
            } else {
                findings.push(format!("{sleep:.1}h of sleep"));
            }
        }

        let suggestion = match recovery_score {
            s if s >= 80 => "Green light: train at full planned intensity.",
            s if s >= 55 => "Moderate: keep the session but reduce volume ~20%.",
            _ => "Recovery day recommended: mobility work or a light walk.",
        };

        Ok(serde_json::json!({
            "recovery_score": recovery_score.max(0),
            "findings": findings,
            "suggestion": suggestion,
        }))
    }
}
