//! List Directory tool.
//!
//! Lists files and subdirectories within a path, optionally recursing
//! up to a configurable depth.

use serde_json::{Map, Value};
use std::path::Path;

use crate::schema::{make_parameters, ParameterSpec, ParametersBlock};
use crate::tools::{optional_bool, optional_u64, required_str, Tool, ToolError, ToolResult};

pub struct ListDirectoryTool;

const DEFAULT_MAX_DEPTH: u64 = 3;
const MAX_ENTRIES: usize = 500;

impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List files and directories at the given path. \
         Supports recursive listing with configurable depth. \
         Returns a tree-style listing with file sizes."
    }

    fn parameters(&self) -> ParametersBlock {
        make_parameters(&[
            ParameterSpec::new("path", "string").description("The directory path to list"),
            ParameterSpec::new("recursive", "boolean")
                .optional()
                .description("Whether to list recursively (default: false)"),
            ParameterSpec::new("max_depth", "integer")
                .optional()
                .description("Maximum recursion depth (default: 3, only used when recursive is true)"),
        ])
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        let root = required_str(&args, "path")?;
        let walk = Walk {
            recursive: optional_bool(&args, "recursive")?.unwrap_or(false),
            max_depth: optional_u64(&args, "max_depth")?.unwrap_or(DEFAULT_MAX_DEPTH),
        };

        let dir = Path::new(root);
        if !dir.exists() {
            return Err(ToolError::failed(format!("Path does not exist: {root}")));
        }
        if !dir.is_dir() {
            return Err(ToolError::failed(format!("Path is not a directory: {root}")));
        }

        let mut listing = Vec::new();
        let complete = walk.visit(dir, 0, &mut listing)?;
        Ok(render(root, &listing, complete))
    }
}

/// One line of the listing. `size` is `None` for directories.
struct Entry {
    depth: u64,
    name: String,
    size: Option<u64>,
}

struct Walk {
    recursive: bool,
    max_depth: u64,
}

impl Walk {
    /// Depth-first, sorted by name. Returns `false` once the entry cap is hit.
    fn visit(&self, dir: &Path, depth: u64, listing: &mut Vec<Entry>) -> Result<bool, ToolError> {
        let mut children: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| ToolError::failed(format!("Failed to read directory {}: {e}", dir.display())))?
            .filter_map(Result::ok)
            .collect();
        children.sort_by_key(|c| c.file_name());

        for child in children {
            let name = child.file_name().to_string_lossy().into_owned();
            // Hidden entries at the top level are noise.
            if depth == 0 && name.starts_with('.') {
                continue;
            }
            if listing.len() == MAX_ENTRIES {
                return Ok(false);
            }

            let metadata = child.metadata().ok();
            let is_dir = metadata.as_ref().is_some_and(|m| m.is_dir());
            listing.push(Entry {
                depth,
                name,
                size: if is_dir { None } else { Some(metadata.map_or(0, |m| m.len())) },
            });
            if is_dir && self.recursive && depth < self.max_depth && !self.visit(&child.path(), depth + 1, listing)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn render(root: &str, listing: &[Entry], complete: bool) -> String {
    if listing.is_empty() {
        return format!("{root} (empty directory)");
    }
    let mut out = format!("{root}  ({} entries)\n", listing.len());
    for entry in listing {
        let indent = "  ".repeat(entry.depth as usize);
        match entry.size {
            None => out.push_str(&format!("{indent}{}/\n", entry.name)),
            Some(bytes) => out.push_str(&format!("{indent}{} ({})\n", entry.name, format_size(bytes))),
        }
    }
    if !complete {
        out.push_str(&format!("... (truncated at {MAX_ENTRIES} entries)\n"));
    }
    out
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    match bytes as f64 {
        b if b >= MB => format!("{:.1} MB", b / MB),
        b if b >= KB => format!("{:.1} KB", b / KB),
        _ => format!("{bytes} B"),
    }
}
