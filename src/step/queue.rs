//! Score-based priority ordering for search frontiers.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::{StepId, StepTree};
use crate::error::TreeResult;

/// A score under inverted order: the higher score compares as `Less`.
///
/// A min-heap over `Priority` therefore yields the highest score first.
#[derive(Debug, Clone, Copy)]
pub struct Priority(pub f64);

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.total_cmp(&self.0)
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    priority: Priority,
    seq: u64,
    step: StepId,
}

/// Frontier of steps that pops the highest-scoring step first.
///
/// Steps with equal scores pop in insertion order.
#[derive(Debug, Default)]
pub struct StepQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    next_seq: u64,
}

impl StepQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a step with an explicit score.
    pub fn push(&mut self, step: StepId, score: f64) {
        let entry = QueueEntry {
            priority: Priority(score),
            seq: self.next_seq,
            step,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// Push a step using its score in `tree`.
    pub fn push_step(&mut self, tree: &StepTree, step: StepId) -> TreeResult<()> {
        let score = tree.score(step)?;
        self.push(step, score);
        Ok(())
    }

    /// Pop the highest-scoring step.
    pub fn pop(&mut self) -> Option<StepId> {
        self.pop_with_score().map(|(step, _)| step)
    }

    /// Pop the highest-scoring step along with its score.
    pub fn pop_with_score(&mut self) -> Option<(StepId, f64)> {
        self.heap
            .pop()
            .map(|Reverse(entry)| (entry.step, entry.priority.0))
    }

    /// The step `pop` would return next.
    pub fn peek(&self) -> Option<StepId> {
        self.heap.peek().map(|Reverse(entry)| entry.step)
    }

    /// Number of queued steps
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
