//! Read File tool.

use serde_json::{Map, Value};
use std::path::Path;

use crate::schema::{make_parameters, ParameterSpec, ParametersBlock};
use crate::tools::{required_str, Tool, ToolError, ToolResult};

/// Tool that reads the contents of a file.
pub struct ReadFileTool;

impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the entire content of a text file at the given path."
    }

    fn parameters(&self) -> ParametersBlock {
        make_parameters(&[
            ParameterSpec::new("file_path", "string").description("The path of the file to read.")
        ])
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        let file_path = required_str(&args, "file_path")?;
        let path = Path::new(file_path);
        if !path.exists() {
            return Err(ToolError::failed(format!("File does not exist: {file_path}")));
        }
        if !path.is_file() {
            return Err(ToolError::failed(format!("Path is not a file: {file_path}")));
        }
        std::fs::read_to_string(path)
            .map_err(|e| ToolError::failed(format!("Failed to read file {file_path}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_metadata() {
        let tool = ReadFileTool;
        assert_eq!(tool.name(), "read_file");
        assert!(!tool.description().is_empty());
        assert_eq!(tool.parameters().required(), ["file_path"]);
    }

    #[test]
    fn test_read_existing_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "hello toolbelt").unwrap();

        let result = ReadFileTool
            .invoke(args(json!({ "file_path": tmp.path().to_str().unwrap() })))
            .unwrap();
        assert_eq!(result, "hello toolbelt");
    }

    #[test]
    fn test_read_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.txt");
        let err = ReadFileTool
            .invoke(args(json!({ "file_path": missing.to_str().unwrap() })))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_read_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReadFileTool
            .invoke(args(json!({ "file_path": dir.path().to_str().unwrap() })))
            .unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[test]
    fn test_missing_path_param() {
        let err = ReadFileTool.invoke(Map::new()).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("file_path"));
    }
}
