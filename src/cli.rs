//! CLI commands for inspecting reasoning tree files.
//!
//! Every command loads a tree through [`JsonTreeStore`] and prints a report:
//! the node outline or flow graph, one node's details, or the conversation and
//! trajectory that lead to a node.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::report::{build_flow_graph, describe_step, FlowOptions};
use crate::step::{StepId, StepTree};
use crate::storage::{JsonTreeStore, TreeStore};

/// Reasoning step tree inspector.
#[derive(Parser, Debug, Clone)]
#[command(name = "reasoning-step-tree", version, about)]
pub struct Cli {
    /// Directory holding tree files (overrides TREE_DIR)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format of the `graph` command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// Indented one-line-per-node outline
    Outline,
    /// Flow graph as JSON
    Json,
}

/// Output format of the `conversation` command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationFormat {
    /// `**Role:**` blocks
    Markdown,
    /// Compact message dicts as JSON
    Json,
}

/// Tree inspection subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List tree files under the tree directory
    List,

    /// Show the tree as colored nodes and weighted edges
    Graph {
        /// Tree file to load
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "outline")]
        format: GraphFormat,
    },

    /// Show the details of one step
    Details {
        /// Tree file to load
        file: PathBuf,

        /// Step id (0 is the root)
        step: usize,
    },

    /// Rebuild the conversation leading to a step
    Conversation {
        /// Tree file to load
        file: PathBuf,

        /// Step id (0 is the root)
        step: usize,

        /// Keep the stepper prompt next to the root
        #[arg(long)]
        with_next_stepper: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: ConversationFormat,
    },

    /// Export the trajectory (base conversation + step messages) of a step
    Trajectory {
        /// Tree file to load
        file: PathBuf,

        /// Step id (0 is the root)
        step: usize,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a CLI command.
pub fn execute_command(command: Commands, config: &Config, store: &JsonTreeStore) -> CliResult {
    let result = match command {
        Commands::List => execute_list(store),
        Commands::Graph { file, format } => execute_graph(store, config, &file, format),
        Commands::Details { file, step } => execute_details(store, &file, StepId(step)),
        Commands::Conversation {
            file,
            step,
            with_next_stepper,
            format,
        } => execute_conversation(store, &file, StepId(step), with_next_stepper, format),
        Commands::Trajectory { file, step } => execute_trajectory(store, &file, StepId(step)),
    };

    match result {
        Ok(output) => CliResult::success(output),
        Err(e) => {
            error!(error = %e, "Command failed");
            CliResult::error(format!("Error: {}", e))
        }
    }
}

fn load(store: &JsonTreeStore, file: &Path) -> AppResult<StepTree> {
    let tree = store.load(file)?;
    info!(path = %file.display(), nodes = tree.len(), "Loaded reasoning tree");
    Ok(tree)
}

fn execute_list(store: &JsonTreeStore) -> AppResult<String> {
    let files = store.list()?;
    if files.is_empty() {
        return Ok(format!("No tree files in {}", store.dir().display()));
    }
    Ok(files
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn execute_graph(
    store: &JsonTreeStore,
    config: &Config,
    file: &Path,
    format: GraphFormat,
) -> AppResult<String> {
    let tree = load(store, file)?;
    let graph = build_flow_graph(&tree, &FlowOptions::from(&config.report))?;
    match format {
        GraphFormat::Outline => Ok(graph.to_outline()),
        GraphFormat::Json => Ok(serde_json::to_string_pretty(&graph)?),
    }
}

fn execute_details(store: &JsonTreeStore, file: &Path, step: StepId) -> AppResult<String> {
    let tree = load(store, file)?;
    Ok(describe_step(&tree, step)?)
}

fn execute_conversation(
    store: &JsonTreeStore,
    file: &Path,
    step: StepId,
    with_next_stepper: bool,
    format: ConversationFormat,
) -> AppResult<String> {
    let tree = load(store, file)?;
    let conversation = tree.to_stepped_conversation(step, with_next_stepper)?;
    match format {
        ConversationFormat::Markdown => Ok(conversation.to_markdown()),
        ConversationFormat::Json => Ok(serde_json::to_string_pretty(&conversation.to_mmd())?),
    }
}

fn execute_trajectory(store: &JsonTreeStore, file: &Path, step: StepId) -> AppResult<String> {
    let tree = load(store, file)?;
    let trajectory = tree.to_step_trajectory(step)?;
    Ok(serde_json::to_string_pretty(&trajectory)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Conversation, Message};
    use crate::step::NewReasoningStep;
    use tempfile::tempdir;

    fn store_with_tree() -> (tempfile::TempDir, JsonTreeStore, PathBuf) {
        let dir = tempdir().unwrap();
        let store = JsonTreeStore::with_dir(dir.path());
        let mut tree = StepTree::new(Conversation::new(vec![Message::user("What is 3*3?")]));
        tree.add_step(
            StepTree::ROOT,
            NewReasoningStep::new(
                Message::assistant("3*3 = 9"),
                Message::assistant("Total Score: 9"),
                Message::assistant("Correct."),
            ),
        )
        .unwrap();
        let path = store.save("square", &tree).unwrap();
        (dir, store, path)
    }

    #[test]
    fn test_cli_parses_conversation_command() {
        let cli = Cli::try_parse_from([
            "reasoning-step-tree",
            "--dir",
            "runs",
            "conversation",
            "tree.json",
            "3",
            "--with-next-stepper",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("runs")));
        match cli.command {
            Commands::Conversation {
                step,
                with_next_stepper,
                format,
                ..
            } => {
                assert_eq!(step, 3);
                assert!(with_next_stepper);
                assert_eq!(format, ConversationFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_execute_list() {
        let (_dir, store, path) = store_with_tree();
        let result = execute_command(Commands::List, &Config::default(), &store);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.message, path.display().to_string());
    }

    #[test]
    fn test_execute_conversation_markdown() {
        let (_dir, store, path) = store_with_tree();
        let result = execute_command(
            Commands::Conversation {
                file: path,
                step: 1,
                with_next_stepper: true,
                format: ConversationFormat::Markdown,
            },
            &Config::default(),
            &store,
        );
        assert_eq!(result.exit_code, 0);
        assert_eq!(
            result.message,
            "**User:**\nWhat is 3*3?\n\n**User:**\nnext\n\n**Assistant:**\n3*3 = 9"
        );
    }

    #[test]
    fn test_execute_details_unknown_step() {
        let (_dir, store, path) = store_with_tree();
        let result = execute_command(
            Commands::Details { file: path, step: 5 },
            &Config::default(),
            &store,
        );
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.message, "Error: Tree error: Step not found: 5");
    }

    #[test]
    fn test_execute_graph_missing_file() {
        let (dir, store, _) = store_with_tree();
        let result = execute_command(
            Commands::Graph {
                file: dir.path().join("nope.json"),
                format: GraphFormat::Outline,
            },
            &Config::default(),
            &store,
        );
        assert_eq!(result.exit_code, 1);
        assert!(result.message.starts_with("Error: Storage error: I/O error on"));
    }
}
