//! Dispatcher.
//!
//! The single place where tool-call routing policy lives:
//!
//! 1. unknown name -> a plain "not found" string (LLM output is untrusted,
//!    a hallucinated tool name is an expected outcome, not a failure)
//! 2. optional strict validation of the caller's arguments
//! 3. conversation history injected under `messages` for tools that ask
//!    for it, overwriting whatever the caller put there
//! 4. invoke and hand back the result untouched
//!
//! There is no retry, no timeout and no panic catching at this layer.

use serde_json::{Map, Value};
use tracing::debug;

use crate::tools::{GlobalRegistry, ToolError, ToolResult, MESSAGES_KEY};
use crate::types::{Message, ToolCall};

/// Routes tool calls to the tools of a [`GlobalRegistry`].
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: GlobalRegistry,
    strict: bool,
}

impl Dispatcher {
    pub fn new(registry: GlobalRegistry) -> Self {
        Self {
            registry,
            strict: false,
        }
    }

    /// Validate arguments against the tool's schema before invoking it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn registry(&self) -> &GlobalRegistry {
        &self.registry
    }

    /// Dispatch one call with already-decoded arguments.
    pub fn dispatch(&self, tool_name: &str, args: Map<String, Value>, history: &[Message]) -> ToolResult {
        route(&self.registry, tool_name, args, history, self.strict)
    }

    /// Dispatch a call whose arguments are still the JSON text emitted by
    /// the model. An empty string counts as `{}`.
    pub fn dispatch_json(&self, tool_name: &str, arguments: &str, history: &[Message]) -> ToolResult {
        let args = parse_arguments(tool_name, arguments)?;
        self.dispatch(tool_name, args, history)
    }

    pub fn dispatch_call(&self, call: &ToolCall, history: &[Message]) -> ToolResult {
        self.dispatch_json(&call.name, &call.arguments, history)
    }
}

/// Free-function form: route one call through `registry`, without strict
/// validation.
pub fn dispatch(
    tool_name: &str,
    args: Map<String, Value>,
    history: &[Message],
    registry: &GlobalRegistry,
) -> ToolResult {
    route(registry, tool_name, args, history, false)
}

fn route(
    registry: &GlobalRegistry,
    tool_name: &str,
    mut args: Map<String, Value>,
    history: &[Message],
    strict: bool,
) -> ToolResult {
    let Some(tool) = registry.get(tool_name) else {
        debug!(tool = tool_name, "tool not found");
        return Ok(not_found(tool_name));
    };

    let inject = tool.requires_conversation_context();

    if strict {
        let exempt: &[&str] = if inject { &[MESSAGES_KEY] } else { &[] };
        tool.parameters()
            .validate(&args, exempt)
            .map_err(|e| ToolError::invalid(format!("Invalid arguments for tool '{tool_name}': {e}")))?;
    }

    if inject {
        let messages = serde_json::to_value(history)?;
        args.insert(MESSAGES_KEY.to_string(), messages);
    }

    debug!(tool = tool_name, injected = inject, args = args.len(), "dispatching tool call");
    let result = tool.invoke(args);
    if let Err(e) = &result {
        debug!(tool = tool_name, kind = e.kind(), "tool reported failure");
    }
    result
}

fn not_found(tool_name: &str) -> String {
    format!("Tool '{tool_name}' not found in tool call map")
}

fn parse_arguments(tool_name: &str, arguments: &str) -> Result<Map<String, Value>, ToolError> {
    if arguments.trim().is_empty() {
        return Ok(Map::new());
    }
    let invalid = |detail: String| {
        ToolError::invalid(format!("Invalid JSON arguments for tool '{tool_name}': {detail}"))
    };
    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(invalid(format!("expected an object, got {other}"))),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Turn a tool result into the text relayed to the model.
///
/// Failures become `Error: ...`. Text longer than `max_chars` characters
/// is cut and marked; `0` disables truncation.
pub fn render_result(result: &ToolResult, max_chars: usize) -> String {
    let text = match result {
        Ok(output) => output.clone(),
        Err(e) => format!("Error: {e}"),
    };
    truncate_chars(text, max_chars)
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    if max_chars == 0 {
        return text;
    }
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let total = text.chars().count();
            format!("{}... [truncated, original length: {}]", &text[..cut], total)
        }
        None => text,
    }
}
