//! toolbelt: tool schemas, module registries and a dispatcher for LLM agents.
//!
//! Tools describe themselves with JSON-Schema-style function descriptors,
//! modules bundle them into [`ToolRegistry`] values, and a [`Dispatcher`]
//! routes model-issued tool calls by name over the merged
//! [`GlobalRegistry`], injecting the conversation history for tools that
//! need it.

pub mod config;
pub mod dispatch;
pub mod schema;
pub mod tools;
pub mod types;

pub use config::AppConfig;
pub use dispatch::{dispatch, render_result, Dispatcher};
pub use schema::{make_parameter, make_parameters, make_tool, ParameterSpec, ParametersBlock, ToolSchema};
pub use tools::{
    create_default_registry, ConflictPolicy, FnTool, GlobalRegistry, Tool, ToolError, ToolRegistry,
    ToolResult,
};
pub use types::{Message, Role, ToolCall};
