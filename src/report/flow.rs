use serde::{Deserialize, Serialize};

use super::{accepted_flags, min_max_scores, ScoreRange, ScoreRangeScope};
use crate::config::ReportConfig;
use crate::error::{TreeError, TreeResult};
use crate::step::{StepId, StepKind, StepTree};

const ROOT_BACKGROUND: &str = "#f5f5f5";
const ROOT_BORDER: &str = "#ddd";
const IMPROVED_BORDER: &str = "#888888";
const PLAIN_BORDER: &str = "#EEEEEE";
const ACCEPTED_EDGE: &str = "#33FF33";
const PLAIN_EDGE: &str = "#555555";
const PLACEHOLDER: &str = " [...]";

/// Options for [`build_flow_graph`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowOptions {
    /// Maximum label excerpt length in characters.
    pub label_width: usize,
    /// Whether the root's score takes part in the color range.
    pub scope: ScoreRangeScope,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            label_width: 100,
            scope: ScoreRangeScope::IncludeRoot,
        }
    }
}

impl From<&ReportConfig> for FlowOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            label_width: config.label_width,
            scope: config.score_scope,
        }
    }
}

/// Exploration state shown for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// The tree's root.
    Root,
    /// Pruned or never accepted.
    Unexplored,
    /// Accepted and not terminal.
    Explored,
    /// Accepted and marked as the end of the chain.
    Terminal,
}

/// A node of the flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    /// Stable node id.
    pub id: String,
    /// Step the node was built from.
    pub step: StepId,
    /// Distance from the root.
    pub depth: usize,
    /// Heading plus content excerpt.
    pub label: String,
    /// Background color.
    pub background: String,
    /// Border color.
    pub border: String,
    /// Exploration state.
    pub status: NodeStatus,
}

/// A parent to child edge of the flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    /// Edge id, `e{source}-{target}`.
    pub id: String,
    /// Parent node id.
    pub source: String,
    /// Child node id.
    pub target: String,
    /// Stroke color.
    pub stroke: String,
    /// Stroke width, e.g. `4px`.
    pub stroke_width: String,
    /// Drawing order.
    pub z_index: i32,
    /// Whether the child's subtree reaches an accepted leaf.
    pub accepted: bool,
}

/// Nodes in pre-order plus their edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    /// Score range used for coloring.
    pub score_range: Option<ScoreRange>,
    /// Nodes, parents before children.
    pub nodes: Vec<FlowNode>,
    /// Parent to child edges.
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    /// Indented one-line-per-node outline.
    pub fn to_outline(&self) -> String {
        self.nodes
            .iter()
            .map(|node| {
                let indent = "  ".repeat(node.depth);
                let label = node.label.replace("<br>\n", " | ");
                format!(
                    "{}[{}] {:?} {} {}",
                    indent, node.id, node.status, node.background, label
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Collapse whitespace and cut `text` at a word boundary so it fits in `width`
/// characters, marking the cut with ` [...]`.
pub fn shorten(text: &str, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(PLACEHOLDER.chars().count());
    let mut kept = String::new();
    let mut kept_len = 0;
    for word in words {
        let word_len = word.chars().count();
        let needed = if kept.is_empty() { word_len } else { word_len + 1 };
        if kept_len + needed > budget {
            break;
        }
        if !kept.is_empty() {
            kept.push(' ');
        }
        kept.push_str(word);
        kept_len += needed;
    }

    if kept.is_empty() {
        PLACEHOLDER.trim_start().to_string()
    } else {
        kept + PLACEHOLDER
    }
}

fn node_id(step: StepId) -> String {
    step.to_string()
}

/// Build the flow graph for the whole tree.
pub fn build_flow_graph(tree: &StepTree, options: &FlowOptions) -> TreeResult<FlowGraph> {
    let score_range = min_max_scores(tree, StepTree::ROOT, options.scope)?;
    let range = score_range.unwrap_or(ScoreRange::flat(0.0));
    let accepted = accepted_flags(tree, StepTree::ROOT)?;
    let mut graph = FlowGraph {
        score_range,
        ..FlowGraph::default()
    };

    // (node, depth, parent); the edge into a node is emitted right before the node
    let mut pending = vec![(StepTree::ROOT, 0, None)];
    while let Some((id, depth, parent)) = pending.pop() {
        if graph.nodes.len() >= tree.len() {
            return Err(TreeError::CycleDetected(id));
        }
        if let Some(parent) = parent {
            graph.edges.push(flow_edge(parent, id, accepted[id.0]));
        }
        graph.nodes.push(flow_node(tree, id, depth, &range, options)?);
        let children = tree.get(id)?.child_steps();
        pending.extend(children.iter().rev().map(|&child| (child, depth + 1, Some(id))));
    }
    Ok(graph)
}

fn flow_edge(source: StepId, target: StepId, accepted: bool) -> FlowEdge {
    let (stroke, stroke_width, z_index) = if accepted {
        (ACCEPTED_EDGE, "4px", 10)
    } else {
        (PLAIN_EDGE, "2px", 0)
    };
    FlowEdge {
        id: format!("e{}-{}", node_id(source), node_id(target)),
        source: node_id(source),
        target: node_id(target),
        stroke: stroke.to_string(),
        stroke_width: stroke_width.to_string(),
        z_index,
        accepted,
    }
}

fn flow_node(
    tree: &StepTree,
    id: StepId,
    depth: usize,
    range: &ScoreRange,
    options: &FlowOptions,
) -> TreeResult<FlowNode> {
    let node = match tree.get(id)?.kind() {
        StepKind::Root(root) => {
            let first = root
                .base_conversation
                .messages
                .first()
                .map(|message| message.content.as_str())
                .unwrap_or_default();
            FlowNode {
                id: node_id(id),
                step: id,
                depth,
                label: format!("🌳 Root<br>\n{}", shorten(first, options.label_width)),
                background: ROOT_BACKGROUND.to_string(),
                border: ROOT_BORDER.to_string(),
                status: NodeStatus::Root,
            }
        }
        StepKind::Reasoning(step) => {
            let score = step.score();
            let status = if step.aborted() {
                NodeStatus::Unexplored
            } else if step.is_terminal_marker() || step.is_terminal_step() == Some(true) {
                NodeStatus::Terminal
            } else {
                NodeStatus::Explored
            };
            let border = if step.improved_step().is_some() {
                IMPROVED_BORDER
            } else {
                PLAIN_BORDER
            };
            FlowNode {
                id: node_id(id),
                step: id,
                depth,
                label: format!(
                    "📝 Step (Score: {:.2})<br>\n{}",
                    score,
                    shorten(&step.step_message().content, options.label_width)
                ),
                background: range.color_for(score),
                border: border.to_string(),
                status,
            }
        }
    };
    Ok(node)
}
