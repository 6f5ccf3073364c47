use crate::error::TreeResult;
use crate::step::{StepId, StepKind, StepTree};

/// Markdown details pane for one node.
pub fn describe_step(tree: &StepTree, id: StepId) -> TreeResult<String> {
    let mut sections = vec!["### Details".to_string()];

    match tree.get(id)?.kind() {
        StepKind::Root(root) => {
            sections.push("#### Base Conversation".to_string());
            let lines = root
                .base_conversation
                .iter()
                .map(|message| format!("- {}: {}", message.role, message.content))
                .collect::<Vec<_>>();
            sections.push(lines.join("\n"));
        }
        StepKind::Reasoning(step) => {
            if step.aborted() {
                sections.push("#### Unexplored Step".to_string());
            } else {
                sections.push("#### Explored Step".to_string());
            }
            sections.push(step.step_message().content.clone());
            sections.push(format!("#### Score: {:?}", step.score()));
            sections.push("#### Verification".to_string());
            sections.push(step.verification_message().content.clone());
            sections.push("#### Score Reasoning".to_string());
            sections.push(step.score_message().content.clone());
            if let Some(check) = step.terminal_message_check() {
                sections.push("#### Terminal Check".to_string());
                sections.push(check.content.clone());
            }
        }
    }

    Ok(sections.join("\n\n"))
}
