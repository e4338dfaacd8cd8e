//! 工具插件：将多个工具打包成一个可独立维护的单元
//!
//! 插件声明 id / version 与自带的工具列表，注册时先 initialize 再逐个入注册表；
//! 任一工具重名即整体失败，注册表保持未污染。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::CoachError;
use crate::tools::{Tool, ToolRegistry};

/// 工具插件 trait：批量提供工具，带初始化钩子
#[async_trait]
pub trait ToolPlugin: Send + Sync {
    fn id(&self) -> &str;

    fn version(&self) -> &str;

    /// 插件自带的工具集合
    fn tools(&self) -> Vec<Arc<dyn Tool>>;

    /// 注册前调用一次（加载数据、检查凭证等）；默认空操作
    async fn initialize(&self) -> Result<(), CoachError> {
        Ok(())
    }
}

/// 注册插件的全部工具；先校验无重名再写入，避免注册一半失败
pub async fn register_plugin(
    registry: &mut ToolRegistry,
    plugin: &dyn ToolPlugin,
) -> Result<usize, CoachError> {
    plugin.initialize().await?;

    let tools = plugin.tools();
    for tool in &tools {
        if registry.contains(tool.name()) {
            return Err(CoachError::DuplicateTool(tool.name().to_string()));
        }
    }
    let count = tools.len();
    for tool in tools {
        registry.register_arc(tool)?;
    }
    tracing::info!(plugin = plugin.id(), version = plugin.version(), count, "plugin registered");
    Ok(count)
}

/// 内置健身工具包：plan_workout / lookup_exercise / analyze_nutrition / interpret_biometrics
pub struct CoachingToolkit;

#[async_trait]
impl ToolPlugin for CoachingToolkit {
    fn id(&self) -> &str {
        "coaching-toolkit"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(crate::tools::PlanWorkoutTool),
            Arc::new(crate::tools::LookupExerciseTool),
            Arc::new(crate::tools::AnalyzeNutritionTool),
            Arc::new(crate::tools::InterpretBiometricsTool),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_builtin_toolkit() {
        let mut registry = ToolRegistry::new();
        let count = register_plugin(&mut registry, &CoachingToolkit).await.unwrap();
        assert_eq!(count, 4);
        assert!(registry.contains("plan_workout"));
        assert!(registry.contains("lookup_exercise"));
    }

    #[tokio::test]
    async fn test_duplicate_plugin_rejected_atomically() {
        let mut registry = ToolRegistry::new();
        register_plugin(&mut registry, &CoachingToolkit).await.unwrap();
        let before = registry.tool_names().len();
        let err = register_plugin(&mut registry, &CoachingToolkit).await;
        assert!(matches!(err, Err(CoachError::DuplicateTool(_))));
        assert_eq!(registry.tool_names().len(), before);
    }
}
