use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use toolbelt::{render_result, Dispatcher, Message};

#[derive(Parser)]
#[command(name = "toolbelt")]
#[command(about = "Inspect and call LLM agent tools", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (default: ~/.toolbelt/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Validate arguments against tool schemas")]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List registered tools")]
    List {
        #[arg(long, help = "Print the tool schemas as JSON")]
        json: bool,
    },

    #[command(about = "Call a tool and print its result")]
    Call {
        #[arg(help = "Name of the tool to call")]
        name: String,

        #[arg(help = "Tool arguments as a JSON object", default_value = "{}")]
        arguments: String,

        #[arg(long, help = "JSON file holding the conversation history")]
        history: Option<PathBuf>,
    },
}

pub fn run_list(dispatcher: &Dispatcher, json: bool, out: &mut impl Write) -> Result<()> {
    let registry = dispatcher.registry();
    if json {
        let schemas = serde_json::to_string_pretty(&registry.schemas_json())?;
        writeln!(out, "{}", schemas)?;
        return Ok(());
    }
    for schema in registry.schemas() {
        let origin = registry.origin(schema.name()).unwrap_or("-");
        writeln!(out, "{:<20} [{}] {}", schema.name(), origin, schema.description())?;
    }
    Ok(())
}

pub fn run_call(
    dispatcher: &Dispatcher,
    name: &str,
    arguments: &str,
    history: Option<&Path>,
    max_result_chars: usize,
    out: &mut impl Write,
) -> Result<()> {
    let history = match history {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };
    let result = dispatcher.dispatch_json(name, arguments, &history);
    writeln!(out, "{}", render_result(&result, max_result_chars))?;
    Ok(())
}

fn load_history(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbelt::{create_default_registry, AppConfig};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(create_default_registry(&AppConfig::default()).unwrap())
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_parse_call() {
        let cli = Cli::parse_from(["toolbelt", "--strict", "call", "read_file", r#"{"file_path":"a"}"#]);
        assert!(cli.strict);
        match cli.command {
            Commands::Call { name, arguments, history } => {
                assert_eq!(name, "read_file");
                assert_eq!(arguments, r#"{"file_path":"a"}"#);
                assert!(history.is_none());
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn test_list_plain() {
        let mut buf = Vec::new();
        run_list(&dispatcher(), false, &mut buf).unwrap();
        let text = output(buf);
        assert!(text.contains("read_file"));
        assert!(text.contains("[shell]"));
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn test_list_json() {
        let mut buf = Vec::new();
        run_list(&dispatcher(), true, &mut buf).unwrap();
        let schemas: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(schemas.as_array().unwrap().len(), 8);
        assert_eq!(schemas[0]["type"], "function");
    }

    #[test]
    fn test_call_unknown_tool() {
        let mut buf = Vec::new();
        run_call(&dispatcher(), "nope", "{}", None, 4000, &mut buf).unwrap();
        assert!(output(buf).contains("not found"));
    }

    #[test]
    fn test_call_with_history_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let history = vec![Message::system("sys"), Message::user("hello")];
        std::fs::write(&path, serde_json::to_string(&history).unwrap()).unwrap();

        let mut buf = Vec::new();
        run_call(
            &dispatcher(),
            "enhance_summary",
            r#"{"content":"we said hello"}"#,
            Some(&path),
            0,
            &mut buf,
        )
        .unwrap();
        let result: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(result["original_message_count"], 2);
        assert_eq!(result["optimized_message_count"], 3);
    }

    #[test]
    fn test_bad_history_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();
        let mut buf = Vec::new();
        let err = run_call(&dispatcher(), "read_file", "{}", Some(&path), 0, &mut buf).unwrap_err();
        assert!(err.to_string().contains("Failed to parse history file"));
    }
}
