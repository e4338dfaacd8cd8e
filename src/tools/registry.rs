//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / schema / execute），由 ToolRegistry 按名注册与查找。
//! 注册重名即失败（启动期致命）；执行前按 schema 校验参数，处理器返回的 Err 统一转为
//! success=false 的 ToolResult，绝不向上抛出；每次调用输出结构化审计日志（JSON）。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{CoachError, ToolResult};
use crate::tools::ToolSchema;

/// 工具 trait：名称、描述（供 Provider prompt 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（注册表键，全局唯一）
    fn name(&self) -> &str;

    /// 工具描述（供 Provider 理解功能）
    fn description(&self) -> &str;

    /// 参数 schema；默认无参数
    fn schema(&self) -> ToolSchema {
        ToolSchema::default()
    }

    /// 执行工具；Err 由注册表转为失败 ToolResult
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，启动期写入后只读
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；重名返回 DuplicateTool
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), CoachError> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), CoachError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(CoachError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 执行指定工具：未注册 ⇒ UnknownTool，参数不合法 ⇒ InvalidParameters，
    /// 处理器失败 ⇒ success=false 的 ToolResult（不抛错）
    pub async fn execute(&self, name: &str, args: Value) -> Result<ToolResult, CoachError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| CoachError::UnknownTool(name.to_string()))?;

        tool.schema()
            .validate(&args)
            .map_err(|reason| CoachError::InvalidParameters {
                tool: name.to_string(),
                reason,
            })?;

        let start = Instant::now();
        let result = tool.execute(args.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": name,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview(&args),
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        Ok(match result {
            Ok(payload) => ToolResult::ok(payload),
            Err(e) => ToolResult::err(e),
        })
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 返回 (name, description) 列表，用于生成 prompt 中的 Available tools 段落
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.description().to_string()))
            .collect()
    }

    /// 动态生成已注册工具的 schema JSON，可拼入 Provider system prompt
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|(name, tool)| {
                serde_json::json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.schema().to_json(),
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
