//! 核心层：数据类型、错误、构建器与编排门面

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod types;

pub use builder::CoachBuilder;
pub use error::CoachError;
pub use orchestrator::Coach;
pub use types::{RequestContext, RequestMetadata, Response, ToolResult};
