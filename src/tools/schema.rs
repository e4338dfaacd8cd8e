//! 工具参数 schema 与工具调用格式
//!
//! ToolSchema 描述各参数的类型 / 必填 / 枚举约束，执行前逐项校验；
//! ToolCallFormat 经 schemars 生成「合法 tool call」的 JSON Schema，注入 Provider system prompt，
//! 减少模型输出格式错误。

use std::collections::HashMap;

use schemars::{schema_for, JsonSchema};
use serde_json::Value;

/// 参数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

impl ParamKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }
}

/// 单个参数约束
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub required: bool,
    /// Some 时值必须落在枚举内（仅对字符串参数有意义）
    pub allowed: Option<Vec<String>>,
}

/// 工具参数 schema：参数名 → 约束；多余的未知参数不报错（向前兼容）
#[derive(Debug, Clone, Default)]
pub struct ToolSchema {
    params: Vec<(String, ParamSpec)>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        required: bool,
        allowed: Option<Vec<String>>,
    ) -> Self {
        self.params.push((
            name.into(),
            ParamSpec {
                kind,
                required,
                allowed,
            },
        ));
        self
    }

    /// 校验 args：缺必填 / 类型不符 / 枚举值非法时返回原因
    pub fn validate(&self, args: &Value) -> Result<(), String> {
        let empty = serde_json::Map::new();
        let obj = match args.as_object() {
            Some(o) => o,
            None if self.params.iter().any(|(_, s)| s.required) => {
                return Err("arguments must be a JSON object".to_string());
            }
            None => &empty,
        };

        for (name, spec) in &self.params {
            match obj.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(format!("missing required parameter: {name}"));
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        return Err(format!(
                            "parameter {name} must be a {}",
                            spec.kind.as_str()
                        ));
                    }
                    if let (Some(allowed), Some(s)) = (&spec.allowed, value.as_str()) {
                        if !allowed.iter().any(|a| a == s) {
                            return Err(format!(
                                "parameter {name} must be one of [{}], got {s:?}",
                                allowed.join(", ")
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// JSON Schema 风格的对象表示（拼入 prompt / 对外展示）
    pub fn to_json(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for (name, spec) in &self.params {
            let mut prop = serde_json::Map::new();
            prop.insert("type".into(), Value::String(spec.kind.as_str().into()));
            if let Some(allowed) = &spec.allowed {
                prop.insert(
                    "enum".into(),
                    Value::Array(allowed.iter().cloned().map(Value::String).collect()),
                );
            }
            properties.insert(name.clone(), Value::Object(prop));
            if spec.required {
                required.push(Value::String(name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// 工具调用请求格式：与路由解析的 `{"tool": "...", "args": {...}}` 一致（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct ToolCallFormat {
    /// 工具名，如 plan_workout、lookup_exercise、analyze_nutrition
    pub tool: String,
    /// 工具参数，依工具不同而不同（duration_minutes、exercise、focus 等）
    pub args: HashMap<String, String>,
}

/// 返回工具调用的 JSON Schema 字符串，可拼入 system prompt
pub fn tool_call_schema_json() -> String {
    let schema = schema_for!(ToolCallFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}
