//! Write File tool.

use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;

use crate::schema::{make_parameters, ParameterSpec, ParametersBlock};
use crate::tools::{optional_str, required_str, Tool, ToolError, ToolResult};

/// Tool that writes or appends content to a file.
pub struct WriteFileTool;

impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file and missing parent \
         directories; overwrites by default, appends with mode 'a'."
    }

    fn parameters(&self) -> ParametersBlock {
        make_parameters(&[
            ParameterSpec::new("file_path", "string").description("The path of the file to write."),
            ParameterSpec::new("content", "string").description("The content to write."),
            ParameterSpec::new("mode", "string")
                .optional()
                .description("'w' to overwrite (default) or 'a' to append."),
        ])
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        let file_path = required_str(&args, "file_path")?;
        let content = required_str(&args, "content")?;
        let append = match optional_str(&args, "mode")?.unwrap_or("w") {
            "w" => false,
            "a" => true,
            other => {
                return Err(ToolError::invalid(format!(
                    "Invalid mode '{other}'. Use 'w' to overwrite or 'a' to append."
                )))
            }
        };

        let path = Path::new(file_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|e| ToolError::failed(format!("Failed to open file {file_path}: {e}")))?;
        file.write_all(content.as_bytes())?;

        let verb = if append { "appended" } else { "wrote" };
        Ok(format!(
            "Successfully {verb} {} characters to file: {file_path}",
            content.chars().count()
        ))
    }
}
