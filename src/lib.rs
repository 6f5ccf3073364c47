//! # Reasoning Step Tree
//!
//! Data model for recording LLM "reasoning step" trees produced by chain-of-thought
//! search experiments, plus reports over those trees for visualization front-ends.
//!
//! ## Features
//!
//! - **Conversations**: chat messages, concatenation, compact dict form and Markdown
//! - **Score Extraction**: `Total Score:` and `TERMINAL: YES/NO` annotations parsed from
//!   free-text LLM output, with failures reported to a diagnostic sink
//! - **Step Trees**: arena-backed, parent-linked trees of reasoning steps
//! - **Reconstruction**: the stepped conversation or trajectory leading to any step
//! - **Priority Ordering**: a frontier queue that pops the highest-scoring step first
//! - **Tree Files**: validated JSON persistence of whole trees
//! - **Reports**: score ranges, node colors, accepted-leaf edges and node details
//!
//! ## Example
//!
//! ```
//! use reasoning_step_tree::conversation::{Conversation, Message};
//! use reasoning_step_tree::step::{NewReasoningStep, StepQueue, StepTree};
//!
//! let mut tree = StepTree::new(Conversation::new(vec![Message::user("What is 6*7?")]));
//! let step = tree
//!     .add_step(
//!         StepTree::ROOT,
//!         NewReasoningStep::new(
//!             Message::assistant("6*7 = 42"),
//!             Message::assistant("Arithmetic checks out.\nTotal Score: 9"),
//!             Message::assistant("Verified."),
//!         ),
//!     )
//!     .unwrap();
//!
//! let mut frontier = StepQueue::new();
//! frontier.push_step(&tree, step).unwrap();
//! assert_eq!(frontier.pop(), Some(step));
//!
//! let prompt = tree.to_stepped_conversation(step, true).unwrap();
//! assert_eq!(prompt.len(), 3);
//! ```

#![warn(missing_docs)]

/// Command-line interface over tree files.
pub mod cli;
/// Configuration loaded from the environment.
pub mod config;
/// Chat messages, conversations and annotation extraction.
pub mod conversation;
/// Error types and result aliases for the application.
pub mod error;
/// Score ranges, coloring and flow graphs for tree visualization.
pub mod report;
/// Reasoning step trees, reconstruction and priority ordering.
pub mod step;
/// JSON persistence of reasoning trees.
pub mod storage;

pub use config::Config;
pub use conversation::{Conversation, Message, Role, ScoreMessage, TerminalCheckMessage};
pub use error::{AppError, AppResult};
pub use step::{ReasoningStep, Root, StepId, StepTree};
