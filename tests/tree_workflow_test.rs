//! Integration tests for the full tree workflow
//!
//! Builds a small search tree the way a best-first search would, persists it,
//! reloads it and checks reconstruction and reports against the reloaded tree.

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

use reasoning_step_tree::conversation::{Conversation, Message};
use reasoning_step_tree::report::{
    build_flow_graph, has_accepted_leaves, min_max_scores, FlowOptions, NodeStatus,
    ScoreRangeScope,
};
use reasoning_step_tree::step::{NewReasoningStep, StepId, StepQueue, StepTree};
use reasoning_step_tree::storage::{JsonTreeStore, TreeStore};

fn candidate(content: &str, score_text: &str) -> NewReasoningStep {
    NewReasoningStep::new(
        Message::assistant(content),
        Message::assistant(score_text),
        Message::assistant("The step follows from the previous one."),
    )
}

/// Expand the best frontier step twice, accepting each popped step.
fn search_tree() -> StepTree {
    let base = Conversation::from_mmd(&[
        json!({"role": "system", "content": "Solve step by step."}),
        json!({"role": "user", "content": "Solve 2x + 4 = 10."}),
    ])
    .unwrap();
    let mut tree = StepTree::new(base);
    let mut frontier = StepQueue::new();

    let first = tree
        .add_step(StepTree::ROOT, candidate("Subtract 4: 2x = 6.", "Good.\nTotal Score: 8"))
        .unwrap();
    let weak = tree
        .add_step(StepTree::ROOT, candidate("Divide by 4.", "Wrong.\nTotal Score: 2"))
        .unwrap();
    let garbled = tree
        .add_step(StepTree::ROOT, candidate("Guess x = 7.", "score unclear"))
        .unwrap();
    for id in [weak, first, garbled] {
        frontier.push_step(&tree, id).unwrap();
    }

    let best = frontier.pop().unwrap();
    assert_eq!(best, first);
    tree.set_aborted(best, false).unwrap();

    let second = tree
        .add_step(best, candidate("Divide by 2: x = 3.", "Correct.\nTotal Score: 9"))
        .unwrap();
    frontier.push_step(&tree, second).unwrap();
    let best = frontier.pop().unwrap();
    assert_eq!(best, second);
    tree.set_aborted(best, false).unwrap();

    let done = tree
        .add_step(
            best,
            candidate("Done.", "Total Score: 10")
                .with_terminal_check(Message::assistant("The answer is final.\nTERMINAL: YES"))
                .with_aborted(false),
        )
        .unwrap();
    assert!(tree.reasoning(done).unwrap().is_terminal_marker());

    let remaining: Vec<StepId> = std::iter::from_fn(|| frontier.pop()).collect();
    assert_eq!(remaining, vec![weak, garbled]);
    tree
}

#[test]
fn test_tree_survives_storage_round_trip() {
    let dir = tempdir().unwrap();
    let store = JsonTreeStore::with_dir(dir.path());
    let tree = search_tree();

    let path = store.save("linear-equation", &tree).unwrap();
    assert_eq!(store.list().unwrap(), vec![path.clone()]);

    let loaded = store.load(&path).unwrap();
    assert_eq!(loaded, tree);
    assert_eq!(loaded.len(), 6);
    assert_eq!(loaded.score(StepId(3)).unwrap(), -1.0);
}

#[test]
fn test_reconstruction_after_reload() {
    let dir = tempdir().unwrap();
    let store = JsonTreeStore::with_dir(dir.path());
    let path = store.save("linear-equation", &search_tree()).unwrap();
    let tree = store.load(&path).unwrap();

    let done = StepId(5);
    assert_eq!(tree.depth(done).unwrap(), 3);

    let trajectory = tree.to_step_trajectory(done).unwrap();
    assert_eq!(
        trajectory.step_messages,
        vec![
            Message::assistant("Subtract 4: 2x = 6."),
            Message::assistant("Divide by 2: x = 3."),
            Message::assistant("Done."),
        ]
    );

    let conversation = tree.to_stepped_conversation(done, false).unwrap();
    assert_eq!(conversation.len(), 2 + 5);
    assert_eq!(
        conversation.to_mmd()[2..].to_vec(),
        vec![
            json!({"role": "assistant", "content": "Subtract 4: 2x = 6."}),
            json!({"role": "user", "content": "next"}),
            json!({"role": "assistant", "content": "Divide by 2: x = 3."}),
            json!({"role": "user", "content": "next"}),
            json!({"role": "assistant", "content": "Done."}),
        ]
    );
    assert_eq!(
        tree.to_stepped_conversation(done, true).unwrap().len(),
        2 + 6
    );
}

#[test]
fn test_reports_after_reload() {
    let tree = search_tree();

    let range = min_max_scores(&tree, StepTree::ROOT, ScoreRangeScope::ExcludeRoot)
        .unwrap()
        .unwrap();
    assert_eq!((range.min, range.max), (-1.0, 10.0));

    assert!(has_accepted_leaves(&tree, StepTree::ROOT).unwrap());
    assert!(!has_accepted_leaves(&tree, StepId(2)).unwrap());

    let graph = build_flow_graph(&tree, &FlowOptions::default()).unwrap();
    assert_eq!(graph.nodes.len(), 6);
    assert_eq!(graph.edges.len(), 5);
    let accepted: Vec<&str> = graph
        .edges
        .iter()
        .filter(|edge| edge.accepted)
        .map(|edge| edge.id.as_str())
        .collect();
    assert_eq!(accepted, vec!["e0-1", "e1-4", "e4-5"]);

    let statuses: Vec<NodeStatus> = graph.nodes.iter().map(|node| node.status).collect();
    assert_eq!(
        statuses,
        vec![
            NodeStatus::Root,
            NodeStatus::Explored,
            NodeStatus::Explored,
            NodeStatus::Terminal,
            NodeStatus::Unexplored,
            NodeStatus::Unexplored,
        ]
    );
}
