//! Tree reports for visualization front-ends.
//!
//! This module turns a [`StepTree`] into renderer-neutral data:
//! - [`min_max_scores`]: the score range used to color nodes
//! - [`has_accepted_leaves`]: whether a subtree reaches an accepted leaf
//! - [`build_flow_graph`]: labelled, colored nodes and weighted edges
//! - [`describe_step`]: a Markdown details pane for one node

mod details;
mod flow;


pub use details::*;
pub use flow::*;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::step::{StepId, StepTree};

/// Color of a step whose score is exactly 0.0.
pub const ZERO_SCORE_COLOR: &str = "#00FF00";

/// Whether the root's fixed 0.0 score takes part in the score range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRangeScope {
    /// Every node of the subtree counts, the root included.
    #[default]
    IncludeRoot,
    /// Only reasoning steps count.
    ExcludeRoot,
}

/// Minimum and maximum score over a set of steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    /// Lowest score seen.
    pub min: f64,
    /// Highest score seen.
    pub max: f64,
}

impl ScoreRange {
    /// A range holding a single score.
    pub fn flat(score: f64) -> Self {
        Self {
            min: score,
            max: score,
        }
    }

    fn include(&mut self, score: f64) {
        self.min = self.min.min(score);
        self.max = self.max.max(score);
    }

    /// Position of `score` inside the range, 0.5 for a flat range.
    pub fn weight(&self, score: f64) -> f64 {
        if self.max == self.min {
            0.5
        } else {
            ((score - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        }
    }

    /// Node background for `score`: red for the low end, green for the high end.
    pub fn color_for(&self, score: f64) -> String {
        if score == 0.0 {
            return ZERO_SCORE_COLOR.to_string();
        }
        let weight = self.weight(score);
        let red = (40.0 + 200.0 * (1.0 - weight)) as u8;
        let green = (40.0 + 200.0 * weight) as u8;
        format!("#{:02x}{:02x}{:02x}", red, green, 40u8)
    }
}

/// Score range of the subtree rooted at `from`.
///
/// Returns `None` when no node qualifies, i.e. a childless root with
/// [`ScoreRangeScope::ExcludeRoot`].
pub fn min_max_scores(
    tree: &StepTree,
    from: StepId,
    scope: ScoreRangeScope,
) -> TreeResult<Option<ScoreRange>> {
    let mut range: Option<ScoreRange> = None;
    let mut pending = vec![from];
    while let Some(id) = pending.pop() {
        let node = tree.get(id)?;
        pending.extend(node.child_steps().iter().copied());
        if node.is_root() && scope == ScoreRangeScope::ExcludeRoot {
            continue;
        }
        let score = node.score();
        match range.as_mut() {
            Some(range) => range.include(score),
            None => range = Some(ScoreRange::flat(score)),
        }
    }
    Ok(range)
}

/// Whether the subtree at `id` contains an accepted leaf.
///
/// A reasoning leaf is accepted when it is not aborted; an aborted inner step
/// cuts off its whole subtree. The root has no aborted flag and no terminal
/// check, so a childless root is never accepted.
pub fn has_accepted_leaves(tree: &StepTree, id: StepId) -> TreeResult<bool> {
    Ok(accepted_flags(tree, id)?[id.0])
}

/// [`has_accepted_leaves`] for every node of the subtree at `from`, indexed by
/// `StepId`. Nodes outside the subtree are `false`.
pub(crate) fn accepted_flags(tree: &StepTree, from: StepId) -> TreeResult<Vec<bool>> {
    let mut order = Vec::new();
    let mut pending = vec![from];
    while let Some(id) = pending.pop() {
        if order.len() >= tree.len() {
            return Err(TreeError::CycleDetected(from));
        }
        order.push(id);
        pending.extend(tree.get(id)?.child_steps().iter().copied());
    }

    // Children come after their parent in `order`, so walking it backwards
    // settles every child first.
    let mut accepted = vec![false; tree.len()];
    for &id in order.iter().rev() {
        let node = tree.get(id)?;
        accepted[id.0] = match node.as_reasoning() {
            Some(step) if node.child_steps().is_empty() => !step.aborted(),
            Some(step) if step.aborted() => false,
            _ => node.child_steps().iter().any(|child| accepted[child.0]),
        };
    }
    Ok(accepted)
}
