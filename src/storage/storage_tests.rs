//! Unit tests for tree file encoding and the JSON tree store.

use super::*;
use crate::conversation::{Conversation, Message};
use crate::error::TreeError;
use crate::step::{NewReasoningStep, StepId};
use serde_json::{json, Value};
use tempfile::tempdir;

fn sample_tree() -> StepTree {
    let mut tree = StepTree::new(Conversation::new(vec![Message::user("Solve x+1=3")]));
    let first = tree
        .add_step(
            StepTree::ROOT,
            NewReasoningStep::new(
                Message::assistant("Subtract 1."),
                Message::assistant("Total Score: 6"),
                Message::assistant("Correct."),
            ),
        )
        .unwrap();
    let done = tree
        .add_step(
            first,
            NewReasoningStep::new(
                Message::assistant("Done."),
                Message::assistant("Total Score: 9"),
                Message::assistant("Correct."),
            )
            .with_terminal_check(Message::assistant("TERMINAL: YES"))
            .with_aborted(false),
        )
        .unwrap();
    tree.set_improved_step(first, Some(done)).unwrap();
    tree
}

#[test]
fn test_encode_decode_preserves_tree() {
    let tree = sample_tree();
    let json = encode_tree(&tree).unwrap();
    let decoded = decode_tree(&json).unwrap();
    assert_eq!(decoded, tree);
    assert_eq!(decoded.score(StepId(2)).unwrap(), 9.0);
    assert_eq!(decoded.reasoning(StepId(1)).unwrap().improved_step(), Some(StepId(2)));
}

#[test]
fn test_encoded_layout() {
    let value: Value = serde_json::from_str(&encode_tree(&sample_tree()).unwrap()).unwrap();
    assert_eq!(value["format_version"], json!(1));
    assert!(value["saved_at"].is_string());

    let nodes = value["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0]["kind"], json!("root"));
    assert_eq!(
        nodes[0]["base_conversation"],
        json!([{"role": "user", "content": "Solve x+1=3"}])
    );
    assert_eq!(nodes[0]["child_steps"], json!([1]));
    assert_eq!(nodes[1]["kind"], json!("reasoning"));
    assert_eq!(nodes[1]["parent_step"], json!(0));
    assert_eq!(
        nodes[1]["score_message"],
        json!({"role": "assistant", "content": "Total Score: 6"})
    );
    assert_eq!(nodes[2]["aborted"], json!(false));
}

#[test]
fn test_decode_defaults_optional_fields() {
    let json = r#"{
        "format_version": 1,
        "saved_at": "2024-11-01T12:00:00Z",
        "nodes": [
            {"kind": "root", "base_conversation": [{"role": "user", "content": "q"}], "child_steps": [1]},
            {"kind": "reasoning", "parent_step": 0,
             "step_message": {"role": "assistant", "content": "s"},
             "score_message": {"role": "assistant", "content": "Total Score: 2"},
             "verification_message": {"role": "assistant", "content": "ok"}}
        ]
    }"#;
    let tree = decode_tree(json).unwrap();
    let step = tree.reasoning(StepId(1)).unwrap();
    assert!(step.aborted());
    assert!(step.terminal_message_check().is_none());
    assert!(step.improved_step().is_none());
    assert!(tree.children(StepId(1)).unwrap().is_empty());
}

#[test]
fn test_decode_rejects_unknown_version() {
    let mut value: Value = serde_json::from_str(&encode_tree(&sample_tree()).unwrap()).unwrap();
    value["format_version"] = json!(7);
    let err = decode_tree(&value.to_string()).unwrap_err();
    assert!(matches!(
        err,
        StorageError::UnsupportedVersion {
            found: 7,
            expected: 1
        }
    ));
}

#[test]
fn test_decode_rejects_broken_links() {
    let mut value: Value = serde_json::from_str(&encode_tree(&sample_tree()).unwrap()).unwrap();
    value["nodes"][0]["child_steps"] = json!([]);
    let err = decode_tree(&value.to_string()).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Invalid(TreeError::InvalidStructure { .. })
    ));
}

#[test]
fn test_decode_rejects_bad_message_schema() {
    let mut value: Value = serde_json::from_str(&encode_tree(&sample_tree()).unwrap()).unwrap();
    value["nodes"][1]["step_message"]["role"] = json!("narrator");
    assert!(matches!(
        decode_tree(&value.to_string()).unwrap_err(),
        StorageError::Json(_)
    ));
}

#[test]
fn test_json_store_save_load_list() {
    let dir = tempdir().unwrap();
    let store = JsonTreeStore::with_dir(dir.path().join("trees"));
    assert!(store.list().unwrap().is_empty());

    let tree = sample_tree();
    let path = store.save("run-1", &tree).unwrap();
    assert_eq!(path, dir.path().join("trees").join("run-1.json"));
    let nested = store.save("aime/problem-2.json", &tree);
    assert!(nested.is_err());

    std::fs::create_dir_all(dir.path().join("trees").join("aime")).unwrap();
    let nested = store.save("aime/problem-2.json", &tree).unwrap();
    std::fs::write(dir.path().join("trees").join("notes.txt"), "ignore me").unwrap();

    assert_eq!(store.list().unwrap(), vec![nested.clone(), path.clone()]);
    assert_eq!(store.load(&path).unwrap(), tree);
    assert_eq!(store.load(&nested).unwrap(), tree);
}

#[test]
fn test_json_store_load_missing_file() {
    let dir = tempdir().unwrap();
    let store = JsonTreeStore::with_dir(dir.path());
    let err = store.load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
}
