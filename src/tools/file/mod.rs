//! File tools: read, write, replace, delete and list.

mod delete;
mod list;
mod read;
mod replace;
mod write;

pub use delete::{DeleteFileTool, DeleteLinesTool};
pub use list::ListDirectoryTool;
pub use read::ReadFileTool;
pub use replace::ReplaceInFileTool;
pub use write::WriteFileTool;

use super::ToolRegistry;

/// The `file` module registry.
pub fn registry() -> ToolRegistry {
    ToolRegistry::new("file")
        .with_tool(ReadFileTool)
        .with_tool(WriteFileTool)
        .with_tool(ReplaceInFileTool)
        .with_tool(DeleteFileTool)
        .with_tool(DeleteLinesTool)
        .with_tool(ListDirectoryTool)
}
