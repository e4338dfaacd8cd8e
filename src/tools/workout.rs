//! 训练计划生成工具
//!
//! 按时长 / 侧重 / 器械确定性地拼出一份分段训练计划，无网络依赖，可重复调用得到同一结构。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{ParamKind, Tool, ToolSchema};

/// 各侧重方向的动作池（名称, 组 x 次建议）
const STRENGTH_POOL: &[(&str, &str)] = &[
    ("goblet squat", "4 x 8"),
    ("dumbbell bench press", "4 x 8"),
    ("single-arm row", "3 x 10"),
    ("romanian deadlift", "3 x 10"),
    ("overhead press", "3 x 8"),
    ("walking lunge", "3 x 12"),
];

const CARDIO_POOL: &[(&str, &str)] = &[
    ("jumping jacks", "3 x 45s"),
    ("high knees", "3 x 30s"),
    ("burpees", "3 x 12"),
    ("mountain climbers", "3 x 40s"),
    ("jump rope", "4 x 60s"),
];

const MOBILITY_POOL: &[(&str, &str)] = &[
    ("cat-cow", "2 x 10"),
    ("world's greatest stretch", "2 x 6/side"),
    ("hip flexor stretch", "2 x 30s/side"),
    ("thoracic rotations", "2 x 8/side"),
];

/// plan_workout：生成分段训练计划
pub struct PlanWorkoutTool;

#[async_trait]
impl Tool for PlanWorkoutTool {
    fn name(&self) -> &str {
        "plan_workout"
    }

    fn description(&self) -> &str {
        "Generate a structured workout plan. Args: {\"duration_minutes\": 45, \"focus\": \"strength\", \"equipment\": \"dumbbells\"}"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .param("duration_minutes", ParamKind::Number, true, None)
            .param(
                "focus",
                ParamKind::String,
                false,
                Some(vec![
                    "strength".into(),
                    "cardio".into(),
                    "mobility".into(),
                    "full_body".into(),
                ]),
            )
            .param("equipment", ParamKind::String, false, None)
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let duration = args
            .get("duration_minutes")
            .and_then(|v| v.as_f64())
            .ok_or("duration_minutes must be a number")?;
        if !(5.0..=180.0).contains(&duration) {
            return Err(format!(
                "duration_minutes must be between 5 and 180, got {duration}"
            ));
        }
        let focus = args
            .get("focus")
            .and_then(|v| v.as_str())
            .unwrap_or("full_body");
        let equipment = args
            .get("equipment")
            .and_then(|v| v.as_str())
            .unwrap_or("bodyweight");

        let pool: Vec<(&str, &str)> = match focus {
            "strength" => STRENGTH_POOL.to_vec(),
            "cardio" => CARDIO_POOL.to_vec(),
            "mobility" => MOBILITY_POOL.to_vec(),
            _ => STRENGTH_POOL
                .iter()
                .chain(CARDIO_POOL.iter())
                .copied()
                .collect(),
        };

        // 热身与放松各占 10%，主体按每动作约 6 分钟切块
        let warmup_minutes = (duration * 0.1).round().max(3.0) as u64;
        let main_minutes = duration as u64 - 2 * warmup_minutes.min(duration as u64 / 3);
        let exercise_count = ((main_minutes / 6).max(2) as usize).min(pool.len());

        let main: Vec<Value> = pool
            .iter()
            .take(exercise_count)
            .map(|(name, scheme)| {
                serde_json::json!({ "exercise": name, "scheme": scheme })
            })
            .collect();

        Ok(serde_json::json!({
            "duration_minutes": duration as u64,
            "focus": focus,
            "equipment": equipment,
            "warmup_minutes": warmup_minutes,
            "cooldown_minutes": warmup_minutes,
            "main": main,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plan_strength_workout() {
        let args = serde_json::json!({
            "duration_minutes": 45,
            "focus": "strength",
            "equipment": "dumbbells"
        });
        let plan = PlanWorkoutTool.execute(args).await.unwrap();
        assert_eq!(plan["focus"], "strength");
        assert_eq!(plan["equipment"], "dumbbells");
        assert!(plan["main"].as_array().unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn test_duration_out_of_range() {
        let args = serde_json::json!({ "duration_minutes": 600 });
        assert!(PlanWorkoutTool.execute(args).await.is_err());
    }

    #[tokio::test]
    async fn test_deterministic_output() {
        let args = serde_json::json!({ "duration_minutes": 30, "focus": "cardio" });
        let a = PlanWorkoutTool.execute(args.clone()).await.unwrap();
        let b = PlanWorkoutTool.execute(args).await.unwrap();
        assert_eq!(a, b);
    }
}
