//! Tool System module.
//!
//! Key concepts:
//! - **Tool trait**: every tool provides its name, description, parameter
//!   block and a synchronous `invoke` over keyword-style JSON arguments
//! - **ToolResult**: a tagged result. `Ok` is the text relayed to the model,
//!   `Err` means the tool failed, which the host can tell apart from a
//!   successful result that merely reads like an error
//! - **Conversation context**: a tool may declare that it needs the
//!   conversation history; the dispatcher then injects it under `messages`
//! - **Registries**: each module bundles its tools into a [`ToolRegistry`],
//!   and all modules are folded into one [`GlobalRegistry`] at startup

pub mod file;
pub mod registry;
pub mod shell;
pub mod summary;

use anyhow::{bail, Result};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::AppConfig;
use crate::schema::{make_tool, ParametersBlock, ToolSchema};

pub use registry::{ConflictPolicy, GlobalRegistry, RegistryError, ToolRegistry};

/// Argument key under which the conversation history is injected.
pub const MESSAGES_KEY: &str = "messages";

/// Tools that need the conversation history unless they say otherwise.
pub const CONTEXT_TOOLS: &[&str] = &["enhance_summary", "summary_by_ai", "optimize_feature_context"];

/// Errors reported by a tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The arguments did not fit what the tool expects.
    #[error("{0}")]
    InvalidArguments(String),

    /// The tool ran but could not do its job.
    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Short tag for the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Failed(_) => "failed",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

pub type ToolResult = std::result::Result<String, ToolError>;

/// Trait that all tools must implement.
///
/// Invocation is synchronous. A tool that blocks (subprocesses, network)
/// owns its own timeout.
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "read_file").
    fn name(&self) -> &str;

    /// What the tool does, as read by the LLM.
    fn description(&self) -> &str;

    /// Parameters the LLM may supply. Host-injected keys are not listed.
    fn parameters(&self) -> ParametersBlock;

    /// Whether the dispatcher must inject the conversation history.
    fn requires_conversation_context(&self) -> bool {
        CONTEXT_TOOLS.contains(&self.name())
    }

    /// Run the tool with keyword-style arguments.
    fn invoke(&self, args: Map<String, Value>) -> ToolResult;

    /// The declarative schema sent to the LLM.
    fn schema(&self) -> ToolSchema {
        make_tool(self.name(), self.parameters(), self.description())
    }
}

type Handler = Box<dyn Fn(Map<String, Value>) -> ToolResult + Send + Sync>;

/// A tool assembled from a schema and a closure.
pub struct FnTool {
    schema: ToolSchema,
    handler: Handler,
    context: Option<bool>,
}

impl FnTool {
    pub fn new<F>(schema: ToolSchema, handler: F) -> Self
    where
        F: Fn(Map<String, Value>) -> ToolResult + Send + Sync + 'static,
    {
        Self {
            schema,
            handler: Box::new(handler),
            context: None,
        }
    }

    /// Override the name-based default for context injection.
    pub fn with_conversation_context(mut self, required: bool) -> Self {
        self.context = Some(required);
        self
    }
}

impl Tool for FnTool {
    fn name(&self) -> &str {
        self.schema.name()
    }

    fn description(&self) -> &str {
        self.schema.description()
    }

    fn parameters(&self) -> ParametersBlock {
        self.schema.parameters().clone()
    }

    fn requires_conversation_context(&self) -> bool {
        self.context
            .unwrap_or_else(|| CONTEXT_TOOLS.contains(&self.name()))
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        (self.handler)(args)
    }

    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }
}

// --- Argument helpers ---

pub(crate) fn required_str<'a>(args: &'a Map<String, Value>, name: &str) -> std::result::Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::invalid(format!("Missing required parameter: {name}")))
}

/// Absent and `null` both read as "not supplied"; any other value must
/// convert, or the call is rejected rather than falling back to a default.
fn optional<'a, T>(
    args: &'a Map<String, Value>,
    name: &str,
    expected: &str,
    convert: impl FnOnce(&'a Value) -> Option<T>,
) -> std::result::Result<Option<T>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => convert(value).map(Some).ok_or_else(|| {
            ToolError::invalid(format!("Parameter '{name}' must be {expected}, got {value}"))
        }),
    }
}

pub(crate) fn optional_str<'a>(
    args: &'a Map<String, Value>,
    name: &str,
) -> std::result::Result<Option<&'a str>, ToolError> {
    optional(args, name, "a string", Value::as_str)
}

pub(crate) fn optional_i64(args: &Map<String, Value>, name: &str) -> std::result::Result<Option<i64>, ToolError> {
    optional(args, name, "an integer", Value::as_i64)
}

pub(crate) fn optional_u64(args: &Map<String, Value>, name: &str) -> std::result::Result<Option<u64>, ToolError> {
    optional(args, name, "a non-negative integer", Value::as_u64)
}

pub(crate) fn optional_bool(args: &Map<String, Value>, name: &str) -> std::result::Result<Option<bool>, ToolError> {
    optional(args, name, "a boolean", Value::as_bool)
}

/// Build the enabled built-in modules, in configured order.
pub fn builtin_modules(config: &AppConfig) -> Result<Vec<ToolRegistry>> {
    let mut modules = Vec::with_capacity(config.registry.modules.len());
    for name in &config.registry.modules {
        let module = match name.as_str() {
            "file" => file::registry(),
            "shell" => shell::registry(&config.shell),
            "summary" => summary::registry(),
            other => bail!("Unknown tool module: '{}'. Supported: 'file', 'shell', 'summary'", other),
        };
        modules.push(module);
    }
    Ok(modules)
}

/// Build the global registry from the configured built-in modules.
pub fn create_default_registry(config: &AppConfig) -> Result<GlobalRegistry> {
    let modules = builtin_modules(config)?;
    Ok(GlobalRegistry::build(modules, config.registry.conflict)?)
}
