//! 营养分析工具
//!
//! 对一段饮食描述做关键词级的宏量估算，输出热量 / 蛋白 / 碳水 / 脂肪与简短建议。
//! 估算是确定性的查表，不是营养学权威结论。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{ParamKind, Tool, ToolSchema};

/// (关键词, 千卡, 蛋白 g, 碳水 g, 脂肪 g)
const FOOD_TABLE: &[(&str, u32, u32, u32, u32)] = &[
    ("chicken", 230, 43, 0, 5),
    ("egg", 78, 6, 1, 5),
    ("rice", 205, 4, 45, 0),
    ("oats", 150, 5, 27, 3),
    ("banana", 105, 1, 27, 0),
    ("protein shake", 160, 30, 5, 2),
    ("salmon", 280, 39, 0, 13),
    ("broccoli", 55, 4, 11, 0),
    ("bread", 80, 3, 15, 1),
    ("pasta", 220, 8, 43, 1),
    ("yogurt", 100, 10, 6, 4),
    ("avocado", 240, 3, 13, 22),
];

/// analyze_nutrition：饮食描述 → 宏量估算
pub struct AnalyzeNutritionTool;

#[async_trait]
impl Tool for AnalyzeNutritionTool {
    fn name(&self) -> &str {
        "analyze_nutrition"
    }

    fn description(&self) -> &str {
        "Estimate calories and macros from a meal description. Args: {\"meal\": \"chicken with rice and broccoli\"}"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param("meal", ParamKind::String, true, None)
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let meal = args
            .get("meal")
            .and_then(|v| v.as_str())
            .ok_or("meal must be a string")?
            .to_lowercase();

        let mut matched = Vec::new();
        let (mut kcal, mut protein, mut carbs, mut fat) = (0u32, 0u32, 0u32, 0u32);
        for (keyword, k, p, c, f) in FOOD_TABLE {
            if meal.contains(keyword) {
                matched.push(*keyword);
                kcal += k;
                protein += p;
                carbs += c;
                fat += f;
            }
        }
        if matched.is_empty() {
            return Err(format!("no recognizable foods in: {meal}"));
        }

        let advice = if protein < 20 {
            "Consider adding a protein source to this meal."
        } else if kcal > 800 {
            "This is a calorie-dense meal; balance it across the day."
        } else {
            "Reasonably balanced meal."
        };

        Ok(serde_json::json!({
            "recognized": matched,
            "calories_kcal": kcal,
            "protein_g": protein,
            "carbs_g": carbs,
            "fat_g": fat,
            "advice": advice,
        }))
    }
}
