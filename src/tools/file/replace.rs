//! Replace In File tool.
//!
//! Exact-text replacement: the caller has to quote the current content,
//! which is safer than rewriting the whole file.

use serde_json::{Map, Value};

use crate::schema::{make_parameters, ParameterSpec, ParametersBlock};
use crate::tools::{optional_i64, required_str, Tool, ToolError, ToolResult};

const PREVIEW_CHARS: usize = 80;

pub struct ReplaceInFileTool;

impl Tool for ReplaceInFileTool {
    fn name(&self) -> &str {
        "replace_in_file"
    }

    fn description(&self) -> &str {
        "Replace exact text in a file. old_text must match precisely, \
         including whitespace and indentation. Replaces every occurrence \
         unless count limits it."
    }

    fn parameters(&self) -> ParametersBlock {
        make_parameters(&[
            ParameterSpec::new("file_path", "string")
                .description("The path of the file where content will be replaced."),
            ParameterSpec::new("old_text", "string").description("The text to be replaced."),
            ParameterSpec::new("new_text", "string").description("The new text to replace with."),
            ParameterSpec::new("count", "integer")
                .optional()
                .description("Maximum number of occurrences to replace. -1 for all."),
        ])
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        let file_path = required_str(&args, "file_path")?;
        let old_text = required_str(&args, "old_text")?;
        let new_text = required_str(&args, "new_text")?;
        let count = optional_i64(&args, "count")?.unwrap_or(-1);

        if old_text.is_empty() {
            return Err(ToolError::invalid("old_text must not be empty"));
        }
        if count == 0 || count < -1 {
            return Err(ToolError::invalid(format!(
                "count must be a positive number or -1, got {count}"
            )));
        }

        let content = std::fs::read_to_string(file_path)
            .map_err(|e| ToolError::failed(format!("Failed to read file {file_path}: {e}")))?;

        let found = content.matches(old_text).count();
        if found == 0 {
            let preview: String = old_text.chars().take(PREVIEW_CHARS).collect();
            return Err(ToolError::failed(format!(
                "old_text not found in {file_path}. Make sure it matches exactly \
                 (including whitespace and indentation).\nSearched for: {preview:?}"
            )));
        }

        let (new_content, replaced) = if count == -1 {
            (content.replace(old_text, new_text), found)
        } else {
            let limit = usize::try_from(count).unwrap_or(usize::MAX);
            (content.replacen(old_text, new_text, limit), found.min(limit))
        };

        std::fs::write(file_path, new_content)
            .map_err(|e| ToolError::failed(format!("Failed to write file {file_path}: {e}")))?;

        Ok(format!(
            "Successfully replaced {replaced} occurrence(s) in {file_path}"
        ))
    }
}
