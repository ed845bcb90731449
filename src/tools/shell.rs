//! Shell tool.
//!
//! Executes commands via `bash -c` with a timeout and output truncation.
//! The timeout is enforced here, on a private current-thread runtime, so
//! the dispatcher stays a plain synchronous call. Called from inside a
//! host's tokio runtime, the private runtime moves to a scoped thread.

use serde_json::{Map, Value};
use std::process::Output;
use std::time::Duration;

use super::{optional_u64, required_str, Tool, ToolError, ToolRegistry, ToolResult};
use crate::config::ShellConfig;
use crate::schema::{make_parameters, ParameterSpec, ParametersBlock};

const MAX_OUTPUT_BYTES: usize = 100_000;

/// The `shell` module registry.
pub fn registry(config: &ShellConfig) -> ToolRegistry {
    ToolRegistry::new("shell").with_tool(ExecuteCommandTool::new(config))
}

pub struct ExecuteCommandTool {
    default_timeout_secs: u64,
    max_timeout_secs: u64,
}

impl ExecuteCommandTool {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            default_timeout_secs: config.default_timeout_secs,
            max_timeout_secs: config.max_timeout_secs.max(1),
        }
    }
}

impl Default for ExecuteCommandTool {
    fn default() -> Self {
        Self::new(&ShellConfig::default())
    }
}

impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Execute a shell command via bash. Returns stdout and stderr. \
         Use this for build commands, searching files, git operations and \
         similar tasks. Commands run with a timeout (default 30s)."
    }

    fn parameters(&self) -> ParametersBlock {
        make_parameters(&[
            ParameterSpec::new("command", "string").description("The shell command to execute"),
            ParameterSpec::new("timeout", "integer")
                .optional()
                .description("Timeout in seconds (default: 30, max: 300)"),
        ])
    }

    fn invoke(&self, args: Map<String, Value>) -> ToolResult {
        let command = required_str(&args, "command")?;
        let timeout_secs = optional_u64(&args, "timeout")?
            .unwrap_or(self.default_timeout_secs)
            .clamp(1, self.max_timeout_secs);

        let output = if tokio::runtime::Handle::try_current().is_ok() {
            // block_on panics on a thread that already drives a runtime.
            std::thread::scope(|scope| {
                scope
                    .spawn(|| run_with_timeout(command, timeout_secs))
                    .join()
                    .unwrap_or_else(|_| Err(ToolError::failed("Command runner thread panicked")))
            })?
        } else {
            run_with_timeout(command, timeout_secs)?
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut text = String::new();
        if !stdout.is_empty() {
            text.push_str(&truncate_output(&stdout, MAX_OUTPUT_BYTES));
        }
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str("[stderr]\n");
            text.push_str(&truncate_output(&stderr, MAX_OUTPUT_BYTES / 2));
        }

        if text.is_empty() {
            text = format!("(no output, exit code: {exit_code})");
        } else if exit_code != 0 {
            text.push_str(&format!("\n[exit code: {exit_code}]"));
        }
        Ok(text)
    }
}

/// Run `command` under `bash -c` on a private current-thread runtime.
fn run_with_timeout(command: &str, timeout_secs: u64) -> Result<Output, ToolError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tokio::process::Command::new("bash")
                .arg("-c")
                .arg(command)
                .kill_on_drop(true)
                .output(),
        )
        .await
    });

    match result {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ToolError::failed(format!("Failed to execute command: {e}"))),
        Err(_) => Err(ToolError::failed(format!(
            "Command timed out after {timeout_secs}s: {command}"
        ))),
    }
}

/// Keep the head and tail of `output`, dropping the middle.
fn truncate_output(output: &str, max_bytes: usize) -> String {
    if output.len() <= max_bytes {
        return output.to_string();
    }
    let half = max_bytes / 2;
    let mut head_end = half;
    while !output.is_char_boundary(head_end) {
        head_end -= 1;
    }
    let mut tail_start = output.len() - half;
    while !output.is_char_boundary(tail_start) {
        tail_start += 1;
    }
    let omitted = tail_start - head_end;
    format!(
        "{}\n\n... ({omitted} bytes omitted) ...\n\n{}",
        &output[..head_end],
        &output[tail_start..]
    )
}
