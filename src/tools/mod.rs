//! 工具箱：注册表、参数 schema、插件与内置健身工具

pub mod biometrics;
pub mod exercise;
pub mod nutrition;
pub mod plugin;
pub mod registry;
pub mod schema;
pub mod workout;

pub use biometrics::InterpretBiometricsTool;
pub use exercise::LookupExerciseTool;
pub use nutrition::AnalyzeNutritionTool;
pub use plugin::{register_plugin, CoachingToolkit, ToolPlugin};
pub use registry::{Tool, ToolRegistry};
pub use schema::{tool_call_schema_json, ParamKind, ParamSpec, ToolSchema};
pub use workout::PlanWorkoutTool;
