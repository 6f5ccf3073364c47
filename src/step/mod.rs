//! Reasoning step trees.
//!
//! A [`StepTree`] is an arena of [`StepNode`]s addressed by [`StepId`]. The node at
//! [`StepTree::ROOT`] is always the [`Root`], which owns the base conversation; every
//! other node is a [`ReasoningStep`] holding a non-owning `parent_step` index. Children
//! are owned by the arena and listed on their parent in insertion order.
//!
//! Paths from any node back to the root are rebuilt on demand, either as a stepped
//! conversation ready to prompt the next generation or as a [`StepTrajectory`] for
//! data export.

mod queue;


pub use queue::*;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

use crate::conversation::{Conversation, Message, ScoreMessage, TerminalCheckMessage};
use crate::error::{TreeError, TreeResult};

/// Content of a step message that marks the end of a reasoning chain.
pub const TERMINATION_MARKER: &str = "Done.";

/// Content of the user prompt inserted between reasoning steps.
pub const STEPPER_CONTENT: &str = "next";

/// The stepper prompt asking the model for the next step.
pub fn stepper_message() -> Message {
    Message::user(STEPPER_CONTENT)
}

/// Index of a step inside its [`StepTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub usize);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The root of a reasoning tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    /// Initial prompt and system context.
    pub base_conversation: Conversation,
}

impl Root {
    /// Score of the root, always 0.0.
    pub fn score(&self) -> f64 {
        0.0
    }
}

/// A generated reasoning step with its score and verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    parent_step: StepId,
    step_message: Message,
    score_message: ScoreMessage,
    verification_message: Message,
    #[serde(default)]
    terminal_message_check: Option<TerminalCheckMessage>,
    #[serde(default)]
    improved_step: Option<StepId>,
    #[serde(default = "default_aborted")]
    aborted: bool,
}

fn default_aborted() -> bool {
    true
}

impl ReasoningStep {
    /// Step this one was generated from.
    pub fn parent_step(&self) -> StepId {
        self.parent_step
    }

    /// The generated reasoning text.
    pub fn step_message(&self) -> &Message {
        &self.step_message
    }

    /// Evaluation of this step.
    pub fn score_message(&self) -> &ScoreMessage {
        &self.score_message
    }

    /// Verification or critique of this step.
    pub fn verification_message(&self) -> &Message {
        &self.verification_message
    }

    /// Optional terminal check.
    pub fn terminal_message_check(&self) -> Option<&TerminalCheckMessage> {
        self.terminal_message_check.as_ref()
    }

    /// Revised version of this step, if one was generated.
    pub fn improved_step(&self) -> Option<StepId> {
        self.improved_step
    }

    /// Whether the branch was pruned rather than accepted.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// Score extracted from the score message.
    pub fn score(&self) -> f64 {
        self.score_message.score()
    }

    /// Terminal decision; `None` without a terminal check or when it is undetermined.
    pub fn is_terminal_step(&self) -> Option<bool> {
        self.terminal_message_check
            .as_ref()
            .and_then(TerminalCheckMessage::is_final)
    }

    /// Whether the step message is exactly [`TERMINATION_MARKER`].
    pub fn is_terminal_marker(&self) -> bool {
        self.step_message.content == TERMINATION_MARKER
    }
}

/// Input for [`StepTree::add_step`].
#[derive(Debug, Clone)]
pub struct NewReasoningStep {
    /// The generated reasoning text.
    pub step_message: Message,
    /// Evaluation of the step.
    pub score_message: ScoreMessage,
    /// Verification or critique of the step.
    pub verification_message: Message,
    /// Optional terminal check.
    pub terminal_message_check: Option<TerminalCheckMessage>,
    /// Initial aborted flag (default true).
    pub aborted: bool,
}

impl NewReasoningStep {
    /// Create a new step input; it starts aborted with no terminal check.
    pub fn new(
        step_message: Message,
        score_message: impl Into<ScoreMessage>,
        verification_message: Message,
    ) -> Self {
        Self {
            step_message,
            score_message: score_message.into(),
            verification_message,
            terminal_message_check: None,
            aborted: true,
        }
    }

    /// Attach a terminal check
    pub fn with_terminal_check(mut self, check: impl Into<TerminalCheckMessage>) -> Self {
        self.terminal_message_check = Some(check.into());
        self
    }

    /// Set the aborted flag
    pub fn with_aborted(mut self, aborted: bool) -> Self {
        self.aborted = aborted;
        self
    }
}

/// Root or reasoning payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// The tree's entry point.
    Root(Root),
    /// A generated step.
    Reasoning(ReasoningStep),
}

/// A node of the tree: its payload plus the ids of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepNode {
    #[serde(flatten)]
    kind: StepKind,
    #[serde(default)]
    child_steps: Vec<StepId>,
}

impl StepNode {
    /// Root or reasoning payload.
    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    /// Children in insertion order.
    pub fn child_steps(&self) -> &[StepId] {
        &self.child_steps
    }

    /// The reasoning payload, if this is not the root.
    pub fn as_reasoning(&self) -> Option<&ReasoningStep> {
        match &self.kind {
            StepKind::Reasoning(step) => Some(step),
            StepKind::Root(_) => None,
        }
    }

    /// The root payload, if this is the root.
    pub fn as_root(&self) -> Option<&Root> {
        match &self.kind {
            StepKind::Root(root) => Some(root),
            StepKind::Reasoning(_) => None,
        }
    }

    /// Whether this is the root.
    pub fn is_root(&self) -> bool {
        matches!(self.kind, StepKind::Root(_))
    }

    /// Parent id; `None` for the root.
    pub fn parent(&self) -> Option<StepId> {
        self.as_reasoning().map(ReasoningStep::parent_step)
    }

    /// Score of the node (0.0 for the root).
    pub fn score(&self) -> f64 {
        match &self.kind {
            StepKind::Root(root) => root.score(),
            StepKind::Reasoning(step) => step.score(),
        }
    }
}

/// Base conversation plus the step messages from the root to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTrajectory {
    /// The root's base conversation.
    pub base_conversation: Conversation,
    /// Step messages in root-to-leaf order.
    pub step_messages: Vec<Message>,
}

/// Arena-backed reasoning tree.
#[derive(Debug, Clone, PartialEq)]
pub struct StepTree {
    nodes: Vec<StepNode>,
}

#[allow(clippy::len_without_is_empty)]
impl StepTree {
    /// Id of the root node.
    pub const ROOT: StepId = StepId(0);

    /// Create a tree holding only a root.
    pub fn new(base_conversation: Conversation) -> Self {
        Self {
            nodes: vec![StepNode {
                kind: StepKind::Root(Root { base_conversation }),
                child_steps: Vec::new(),
            }],
        }
    }

    /// Rebuild a tree from its nodes, checking every structural invariant.
    pub fn from_nodes(nodes: Vec<StepNode>) -> TreeResult<Self> {
        let tree = Self { nodes };
        tree.validate()?;
        debug!(nodes = tree.nodes.len(), "Step tree validated");
        Ok(tree)
    }

    /// All nodes, indexed by `StepId`.
    pub fn nodes(&self) -> &[StepNode] {
        &self.nodes
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over `(id, node)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (StepId, &StepNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (StepId(index), node))
    }

    /// The root payload.
    pub fn root(&self) -> &Root {
        match &self.nodes[Self::ROOT.0].kind {
            StepKind::Root(root) => root,
            // from_nodes rejects trees whose first node is not the root
            StepKind::Reasoning(_) => unreachable!("node 0 is always the root"),
        }
    }

    /// Look up a node.
    pub fn get(&self, id: StepId) -> TreeResult<&StepNode> {
        self.nodes.get(id.0).ok_or(TreeError::StepNotFound(id))
    }

    /// Look up a reasoning step.
    pub fn reasoning(&self, id: StepId) -> TreeResult<&ReasoningStep> {
        self.get(id)?
            .as_reasoning()
            .ok_or(TreeError::NotAReasoningStep(id))
    }

    fn reasoning_mut(&mut self, id: StepId) -> TreeResult<&mut ReasoningStep> {
        match self.nodes.get_mut(id.0) {
            Some(StepNode {
                kind: StepKind::Reasoning(step),
                ..
            }) => Ok(step),
            Some(_) => Err(TreeError::NotAReasoningStep(id)),
            None => Err(TreeError::StepNotFound(id)),
        }
    }

    /// Append a reasoning step under `parent` and return its id.
    pub fn add_step(&mut self, parent: StepId, step: NewReasoningStep) -> TreeResult<StepId> {
        self.get(parent)?;
        let id = StepId(self.nodes.len());
        self.nodes.push(StepNode {
            kind: StepKind::Reasoning(ReasoningStep {
                parent_step: parent,
                step_message: step.step_message,
                score_message: step.score_message,
                verification_message: step.verification_message,
                terminal_message_check: step.terminal_message_check,
                improved_step: None,
                aborted: step.aborted,
            }),
            child_steps: Vec::new(),
        });
        self.nodes[parent.0].child_steps.push(id);
        debug!(step_id = %id, parent_id = %parent, "Reasoning step added");
        Ok(id)
    }

    /// Children of a node in insertion order.
    pub fn children(&self, id: StepId) -> TreeResult<&[StepId]> {
        Ok(self.get(id)?.child_steps())
    }

    /// Parent of a node; `None` for the root.
    pub fn parent(&self, id: StepId) -> TreeResult<Option<StepId>> {
        Ok(self.get(id)?.parent())
    }

    /// Score of a node.
    pub fn score(&self, id: StepId) -> TreeResult<f64> {
        Ok(self.get(id)?.score())
    }

    /// Number of reasoning steps between the root and `id` (0 for the root).
    pub fn depth(&self, id: StepId) -> TreeResult<usize> {
        Ok(self.reasoning_path(id)?.len())
    }

    /// Ids from the root down to `id`, both included.
    pub fn path(&self, id: StepId) -> TreeResult<Vec<StepId>> {
        let mut ids = vec![id];
        let mut node = id;
        while let Some(parent) = self.get(node)?.parent() {
            if ids.len() > self.nodes.len() {
                return Err(TreeError::CycleDetected(id));
            }
            ids.push(parent);
            node = parent;
        }
        ids.reverse();
        Ok(ids)
    }

    /// Reasoning steps from the first one under the root down to `id`.
    fn reasoning_path(&self, id: StepId) -> TreeResult<Vec<&ReasoningStep>> {
        let mut steps = Vec::new();
        let mut node = self.get(id)?;
        while let Some(step) = node.as_reasoning() {
            if steps.len() >= self.nodes.len() {
                return Err(TreeError::CycleDetected(id));
            }
            steps.push(step);
            node = self.get(step.parent_step)?;
        }
        steps.reverse();
        Ok(steps)
    }

    /// Mark a step as accepted (`false`) or pruned (`true`).
    pub fn set_aborted(&mut self, id: StepId, aborted: bool) -> TreeResult<()> {
        self.reasoning_mut(id)?.aborted = aborted;
        Ok(())
    }

    /// Attach or clear the revised version of a step.
    pub fn set_improved_step(&mut self, id: StepId, improved: Option<StepId>) -> TreeResult<()> {
        if let Some(target) = improved {
            self.reasoning(target)?;
        }
        self.reasoning_mut(id)?.improved_step = improved;
        Ok(())
    }

    /// Base conversation followed by `[stepper, step_message]` for each step on the path.
    ///
    /// With `with_next_stepper == false` the stepper adjacent to the root is dropped.
    /// The root itself yields its base conversation unchanged.
    pub fn to_stepped_conversation(
        &self,
        id: StepId,
        with_next_stepper: bool,
    ) -> TreeResult<Conversation> {
        let path = self.reasoning_path(id)?;
        let mut messages = Vec::with_capacity(path.len() * 2);
        for step in path {
            messages.push(stepper_message());
            messages.push(step.step_message.clone());
        }
        if !with_next_stepper && !messages.is_empty() {
            messages.remove(0);
        }
        Ok(self.root().base_conversation.clone() + Conversation::new(messages))
    }

    /// Base conversation plus the step messages from the root to `id`.
    pub fn to_step_trajectory(&self, id: StepId) -> TreeResult<StepTrajectory> {
        let step_messages = self
            .reasoning_path(id)?
            .into_iter()
            .map(|step| step.step_message.clone())
            .collect();
        Ok(StepTrajectory {
            base_conversation: self.root().base_conversation.clone(),
            step_messages,
        })
    }

    /// Priority order of two nodes: the higher score compares as `Less`.
    pub fn priority_cmp(&self, a: StepId, b: StepId) -> TreeResult<Ordering> {
        Ok(Priority(self.score(a)?).cmp(&Priority(self.score(b)?)))
    }

    fn validate(&self) -> TreeResult<()> {
        let invalid = |message: String| TreeError::InvalidStructure { message };

        match self.nodes.first() {
            None => return Err(invalid("tree has no nodes".to_string())),
            Some(node) if !node.is_root() => {
                return Err(invalid("node 0 is not the root".to_string()))
            }
            Some(_) => {}
        }

        let mut listed = 0usize;
        for (id, node) in self.iter() {
            match &node.kind {
                StepKind::Root(_) if id != Self::ROOT => {
                    return Err(invalid(format!("node {} is a second root", id)));
                }
                StepKind::Root(_) => {}
                StepKind::Reasoning(step) => {
                    let parent = self.get(step.parent_step).map_err(|_| {
                        invalid(format!(
                            "node {} has missing parent {}",
                            id, step.parent_step
                        ))
                    })?;
                    if !parent.child_steps.contains(&id) {
                        return Err(invalid(format!(
                            "node {} is not listed as a child of its parent {}",
                            id, step.parent_step
                        )));
                    }
                    if let Some(improved) = step.improved_step {
                        if self.reasoning(improved).is_err() {
                            return Err(invalid(format!(
                                "node {} has improved step {} which is not a reasoning step",
                                id, improved
                            )));
                        }
                    }
                }
            }

            for &child in &node.child_steps {
                let child_parent = self.get(child).ok().and_then(StepNode::parent);
                if child_parent != Some(id) {
                    return Err(invalid(format!(
                        "node {} lists {} as a child but is not its parent",
                        id, child
                    )));
                }
            }
            listed += node.child_steps.len();
        }

        if listed != self.nodes.len() - 1 {
            return Err(invalid("a step is listed more than once as a child".to_string()));
        }

        for (id, _) in self.iter() {
            self.reasoning_path(id)?;
        }
        Ok(())
    }
}
