//! Delete tools: whole files or directories, and line ranges within a file.

use serde_json::{Map, Value};
use std::path::Path;

use crate::schema::{make_parameters, ParameterSpec, ParametersBlock};
use crate::tools::{optional_bool, optional_u64, required_str, Tool, ToolError, ToolResult};

pub struct DeleteFileTool;

impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file or directory. Non-empty directories are only removed \
         when recursive is true."
    }

    fn parameters(&self) -> ParametersBlock {
        make_parameters(&[
            ParameterSpec::new("file_path", "string")
                .description("The path of the file or directory to be deleted."),
            ParameterSpec::new("recursive", "boolean")
                .optional()
                .description("Whether to delete directories recursively (default: false)."),
        ])
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        let file_path = required_str(&args, "file_path")?;
        let recursive = optional_bool(&args, "recursive")?.unwrap_or(false);
        let path = Path::new(file_path);

        let metadata = std::fs::symlink_metadata(path)
            .map_err(|_| ToolError::failed(format!("File or directory does not exist: {file_path}")))?;

        if !metadata.is_dir() {
            std::fs::remove_file(path)
                .map_err(|e| ToolError::failed(format!("Failed to delete file {file_path}: {e}")))?;
            return Ok(format!("Successfully deleted file: {file_path}"));
        }

        if recursive {
            std::fs::remove_dir_all(path)
                .map_err(|e| ToolError::failed(format!("Failed to delete directory {file_path}: {e}")))?;
            return Ok(format!("Successfully deleted directory recursively: {file_path}"));
        }

        if std::fs::read_dir(path)?.next().is_some() {
            return Err(ToolError::failed(format!(
                "Directory is not empty. Use recursive=true to delete non-empty directories: {file_path}"
            )));
        }
        std::fs::remove_dir(path)
            .map_err(|e| ToolError::failed(format!("Failed to delete directory {file_path}: {e}")))?;
        Ok(format!("Successfully deleted empty directory: {file_path}"))
    }
}

pub struct DeleteLinesTool;

impl Tool for DeleteLinesTool {
    fn name(&self) -> &str {
        "delete_lines"
    }

    fn description(&self) -> &str {
        "Delete a range of lines (1-based, inclusive) from a text file."
    }

    fn parameters(&self) -> ParametersBlock {
        make_parameters(&[
            ParameterSpec::new("file_path", "string").description("The path of the file."),
            ParameterSpec::new("start_line", "integer")
                .description("The starting line number to delete from (1-based)."),
            ParameterSpec::new("end_line", "integer")
                .optional()
                .description("The ending line number to delete to (inclusive, default: start_line)."),
        ])
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        let file_path = required_str(&args, "file_path")?;
        let start = optional_u64(&args, "start_line")?
            .ok_or_else(|| ToolError::invalid("Missing required parameter: start_line"))?;
        let end = optional_u64(&args, "end_line")?.unwrap_or(start);

        if start < 1 || start > end {
            return Err(ToolError::invalid(format!("Invalid line range: {start}-{end}")));
        }

        let content = std::fs::read_to_string(file_path)
            .map_err(|e| ToolError::failed(format!("Failed to read file {file_path}: {e}")))?;
        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        if end > lines.len() as u64 {
            return Err(ToolError::failed(format!(
                "Line numbers out of range. File has {} lines.",
                lines.len()
            )));
        }

        // Both bounds are within `lines`, so they fit in usize.
        let (first, last) = (start as usize - 1, end as usize);
        let kept: String = lines[..first].iter().chain(&lines[last..]).copied().collect();
        std::fs::write(file_path, kept)
            .map_err(|e| ToolError::failed(format!("Failed to write file {file_path}: {e}")))?;

        Ok(format!("Successfully deleted lines {start}-{end} from {file_path}"))
    }
}
