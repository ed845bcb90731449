//! Conversation summary tool.
//!
//! `enhance_summary` takes a model-written summary and compacts the
//! conversation history the dispatcher injects under `messages`:
//!
//! - system messages always survive and move to the front
//! - older user requests survive, everything else older is dropped
//! - a `## Context Summary` user message goes in front of the recent window
//! - the last [`RECENT_WINDOW`] messages survive
//! - assistant tool calls only survive together with all of their results
//!
//! The host receives the compacted history in the JSON result and decides
//! whether to swap it in.

use chrono::Local;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tracing::debug;

use super::{required_str, Tool, ToolError, ToolRegistry, ToolResult, MESSAGES_KEY};
use crate::schema::{make_parameters, ParameterSpec, ParametersBlock};
use crate::types::{Message, Role};

/// Histories longer than this are compacted.
pub const COMPACT_THRESHOLD: usize = 20;
/// Number of trailing messages kept verbatim when compacting.
pub const RECENT_WINDOW: usize = 15;

const SUMMARY_HEADER: &str = "## Context Summary";
const OPTIMIZATION_HEADER: &str = "## Context Optimization Needed";
const SUMMARY_PREVIEW_CHARS: usize = 200;

/// The `summary` module registry.
pub fn registry() -> ToolRegistry {
    ToolRegistry::new("summary").with_tool(EnhanceSummaryTool)
}

pub struct EnhanceSummaryTool;

impl Tool for EnhanceSummaryTool {
    fn name(&self) -> &str {
        "enhance_summary"
    }

    fn description(&self) -> &str {
        "Use a model-generated summary to compact the conversation history, \
         reducing token usage while preserving context."
    }

    fn parameters(&self) -> ParametersBlock {
        make_parameters(&[ParameterSpec::new("content", "string")
            .description("The model-generated summary content to use for optimization.")])
    }

    fn requires_conversation_context(&self) -> bool {
        true
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        let content = required_str(&args, "content")?;
        if content.trim().is_empty() {
            return Err(ToolError::invalid("Content cannot be empty"));
        }
        let history: Vec<Message> = match args.get(MESSAGES_KEY) {
            Some(value) => serde_json::from_value(value.clone())?,
            None => return Err(ToolError::invalid("Conversation history was not provided")),
        };

        let generated_at = Local::now();
        let optimized = compact(&history, content, &generated_at.format("%Y-%m-%d %H:%M:%S").to_string());

        let original_count = history.len();
        let optimized_count = optimized.len();
        let original_chars = total_chars(&history);
        let optimized_chars = total_chars(&optimized);
        debug!(original_count, optimized_count, "conversation compacted");

        let result = json!({
            "success": true,
            "original_message_count": original_count,
            "optimized_message_count": optimized_count,
            "optimization_percentage": reduction(original_count, optimized_count),
            "char_reduction_percentage": reduction(original_chars, optimized_chars),
            "summary_used": true,
            "summary_content": preview(content),
            "timestamp": generated_at.to_rfc3339(),
            "messages": optimized,
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

/// Build the compacted history. `generated_at` is stamped into the summary.
pub fn compact(history: &[Message], summary: &str, generated_at: &str) -> Vec<Message> {
    let split = if history.len() > COMPACT_THRESHOLD {
        history.len() - RECENT_WINDOW
    } else {
        0
    };
    let (older, recent) = history.split_at(split);

    let mut optimized: Vec<Message> = history
        .iter()
        .filter(|m| m.role == Role::System)
        .cloned()
        .collect();
    optimized.extend(
        older
            .iter()
            .filter(|m| m.role == Role::User && !is_synthetic(m))
            .cloned(),
    );
    optimized.push(Message::user(format!(
        "{SUMMARY_HEADER} (Generated at {generated_at})\n\n{summary}\n\n---\n\
         Note: Previous conversation has been summarized above. \
         Key messages are preserved below."
    )));
    optimized.extend(
        recent
            .iter()
            .filter(|m| m.role != Role::System && !is_synthetic(m))
            .cloned(),
    );

    repair_tool_pairs(optimized)
}

/// Earlier summaries and context-optimization prompts.
fn is_synthetic(message: &Message) -> bool {
    message.role == Role::User
        && (message.content.starts_with(SUMMARY_HEADER)
            || message.content.starts_with(OPTIMIZATION_HEADER))
}

/// Drop tool results without their call, and calls missing any result.
fn repair_tool_pairs(messages: Vec<Message>) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len());
    let mut i = 0;
    while i < messages.len() {
        let message = &messages[i];
        if message.role == Role::Tool {
            i += 1;
            continue;
        }
        if !message.has_tool_calls() {
            out.push(message.clone());
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < messages.len() && messages[end].role == Role::Tool {
            end += 1;
        }
        let answered: HashSet<&str> = messages[i + 1..end]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        if message.tool_calls.iter().all(|c| answered.contains(c.id.as_str())) {
            out.extend_from_slice(&messages[i..end]);
        } else {
            debug!(calls = message.tool_calls.len(), "dropping unpaired tool calls");
        }
        i = end;
    }
    out
}

fn total_chars(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.content.chars().count()).sum()
}

fn reduction(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    let pct = (before as f64 - after as f64) / before as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(SUMMARY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;

    fn long_history(turns: usize) -> Vec<Message> {
        let mut history = vec![Message::system("You are a software expert.")];
        for n in 0..turns {
            history.push(Message::user(format!("request {n}")));
            history.push(Message::assistant(format!("answer {n}")));
        }
        history
    }

    fn invoke(history: &[Message], content: &str) -> ToolResult {
        let mut args = Map::new();
        args.insert("content".to_string(), Value::from(content));
        args.insert(MESSAGES_KEY.to_string(), serde_json::to_value(history).unwrap());
        EnhanceSummaryTool.invoke(args)
    }

    #[test]
    fn test_metadata() {
        let tool = EnhanceSummaryTool;
        assert!(tool.requires_conversation_context());
        let params = tool.parameters();
        assert!(!params.properties().contains_key(MESSAGES_KEY));
        assert_eq!(params.required(), ["content"]);
    }

    #[test]
    fn test_short_history_keeps_everything() {
        let history = long_history(3);
        let optimized = compact(&history, "all good", "2026-01-01 00:00:00");
        assert_eq!(optimized.len(), history.len() + 1);
        assert_eq!(optimized[0].role, Role::System);
        assert!(optimized[1].content.starts_with("## Context Summary (Generated at 2026-01-01 00:00:00)"));
        assert!(optimized[1].content.contains("all good"));
        assert_eq!(optimized.last().unwrap().content, "answer 2");
    }

    #[test]
    fn test_long_history_is_compacted() {
        // 1 system + 30 messages
        let history = long_history(15);
        let optimized = compact(&history, "summary", "now");

        // system + 8 older user requests + summary + 15 recent
        assert_eq!(optimized.len(), 1 + 8 + 1 + 15);
        assert_eq!(optimized[0].role, Role::System);
        assert_eq!(optimized[1].content, "request 0");
        assert!(optimized[9].content.starts_with(SUMMARY_HEADER));
        assert_eq!(optimized.last().unwrap().content, "answer 14");
        assert!(!optimized.iter().any(|m| m.content == "answer 0"));
    }

    #[test]
    fn test_previous_summaries_are_replaced() {
        let mut history = long_history(2);
        history.push(Message::user("## Context Summary (Generated at earlier)\n\nold"));
        history.push(Message::user("## Context Optimization Needed (HIGH Priority)"));
        let optimized = compact(&history, "fresh", "now");
        let summaries: Vec<&Message> = optimized
            .iter()
            .filter(|m| m.content.starts_with(SUMMARY_HEADER))
            .collect();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].content.contains("fresh"));
        assert!(!optimized.iter().any(|m| m.content.starts_with(OPTIMIZATION_HEADER)));
    }

    #[test]
    fn test_unpaired_tool_calls_are_dropped() {
        let history = vec![
            Message::user("go"),
            Message::assistant_with_tool_calls("", vec![ToolCall::new("a", "read_file", "{}")]),
            Message::tool_result("a", "file body"),
            Message::assistant_with_tool_calls(
                "",
                vec![
                    ToolCall::new("b", "read_file", "{}"),
                    ToolCall::new("c", "read_file", "{}"),
                ],
            ),
            Message::tool_result("b", "only one answer"),
            Message::tool_result("zz", "orphan"),
            Message::assistant("done"),
        ];
        let repaired = repair_tool_pairs(history);
        let contents: Vec<&str> = repaired.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["go", "", "file body", "done"]);
    }

    #[test]
    fn test_window_start_orphan_result_is_dropped() {
        let mut history = long_history(10);
        // 21 messages: the recent window starts at index 6.
        history[6] = Message::tool_result("lost", "result of a call that fell out of the window");
        let optimized = compact(&history, "s", "now");
        assert!(!optimized.iter().any(|m| m.role == Role::Tool));
    }

    #[test]
    fn test_invoke_reports_statistics() {
        let history = long_history(15);
        let output = invoke(&history, "we built the parser").unwrap();
        let result: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["original_message_count"], 31);
        assert_eq!(result["optimized_message_count"], 25);
        assert_eq!(result["optimization_percentage"], 19.4);
        assert_eq!(result["summary_content"], "we built the parser");
        assert_eq!(result["messages"].as_array().unwrap().len(), 25);
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let err = invoke(&long_history(1), "   ").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_missing_history_is_rejected() {
        let mut args = Map::new();
        args.insert("content".to_string(), Value::from("x"));
        let err = EnhanceSummaryTool.invoke(args).unwrap_err();
        assert!(err.to_string().contains("history"));
    }

    #[test]
    fn test_preview_truncates_long_summaries() {
        let long = "s".repeat(250);
        let shown = preview(&long);
        assert_eq!(shown.len(), 203);
        assert!(shown.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_reduction() {
        assert_eq!(reduction(0, 0), 0.0);
        assert_eq!(reduction(10, 5), 50.0);
        assert_eq!(reduction(3, 2), 33.3);
    }
}
