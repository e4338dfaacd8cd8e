//! 动作查询工具（只读）
//!
//! 从内置动作库按名查询要点与常见错误；无共享状态，重复调用结果结构完全一致。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{ParamKind, Tool, ToolSchema};

struct ExerciseEntry {
    name: &'static str,
    muscles: &'static [&'static str],
    cues: &'static [&'static str],
    mistakes: &'static [&'static str],
}

const EXERCISES: &[ExerciseEntry] = &[
    ExerciseEntry {
        name: "squat",
        muscles: &["quadriceps", "glutes", "core"],
        cues: &[
            "feet shoulder-width apart",
            "knees track over toes",
            "keep chest up and core braced",
        ],
        mistakes: &["heels lifting off the floor", "knees caving inward"],
    },
    ExerciseEntry {
        name: "deadlift",
        muscles: &["hamstrings", "glutes", "lower back"],
        cues: &[
            "hinge at the hips",
            "keep the bar close to your shins",
            "neutral spine throughout",
        ],
        mistakes: &["rounding the lower back", "jerking the bar off the floor"],
    },
    ExerciseEntry {
        name: "push-up",
        muscles: &["chest", "triceps", "shoulders"],
        cues: &[
            "hands under shoulders",
            "body in one straight line",
            "lower until chest nearly touches the floor",
        ],
        mistakes: &["sagging hips", "flaring elbows to 90 degrees"],
    },
    ExerciseEntry {
        name: "plank",
        muscles: &["core", "shoulders"],
        cues: &["elbows under shoulders", "squeeze glutes", "breathe steadily"],
        mistakes: &["hips too high", "holding breath"],
    },
    ExerciseEntry {
        name: "lunge",
        muscles: &["quadriceps", "glutes"],
        cues: &["step long enough", "back knee toward the floor", "torso upright"],
        mistakes: &["front knee past toes", "pushing off the back foot"],
    },
];

/// lookup_exercise：按名称查询动作要点
pub struct LookupExerciseTool;

#[async_trait]
impl Tool for LookupExerciseTool {
    fn name(&self) -> &str {
        "lookup_exercise"
    }

    fn description(&self) -> &str {
        "Look up form cues and common mistakes for an exercise. Args: {\"name\": \"squat\"}"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param("name", ParamKind::String, true, None)
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let name = args
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or("name must be a string")?
            .trim()
            .to_lowercase();

        let entry = EXERCISES
            .iter()
            .find(|e| e.name == name || name.contains(e.name))
            .ok_or_else(|| format!("unknown exercise: {name}"))?;

        Ok(serde_json::json!({
            "name": entry.name,
            "muscles": entry.muscles,
            "cues": entry.cues,
            "common_mistakes": entry.mistakes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_is_idempotent() {
        let args = serde_json::json!({ "name": "squat" });
        let a = LookupExerciseTool.execute(args.clone()).await.unwrap();
        let b = LookupExerciseTool.execute(args).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a["name"], "squat");
    }

    #[tokio::test]
    async fn test_fuzzy_name_match() {
        let args = serde_json::json!({ "name": "Goblet Squat" });
        let out = LookupExerciseTool.execute(args).await.unwrap();
        assert_eq!(out["name"], "squat");
    }

    #[tokio::test]
    async fn test_unknown_exercise() {
        let args = serde_json::json!({ "name": "underwater basket weaving" });
        assert!(LookupExerciseTool.execute(args).await.is_err());
    }
}
