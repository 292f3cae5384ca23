//! Conversation export to Markdown and JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use transcript_store::{Conversation, Role};

/// Write a conversation as a Markdown transcript. Returns the created path.
pub fn export_markdown(conversation: &Conversation, dir: &Path) -> Result<PathBuf, String> {
    let path = export_path(conversation, dir, "md");
    let mut output = String::new();

    let title = if conversation.name.is_empty() {
        format!("Conversation #{}", conversation.id)
    } else {
        conversation.name.clone()
    };
    output.push_str(&format!("# {title}\n\n"));
    output.push_str(&format!(
        "Model: {} | Turns: {} | Cost: ${:.6} | Tokens: {}\n\n",
        conversation.model,
        conversation.turns.len(),
        conversation.total_cost,
        conversation.total_tokens
    ));

    for turn in &conversation.turns {
        let heading = match turn.role {
            Role::System => "System",
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        output.push_str(&format!("## {heading}\n\n{}\n\n", turn.content));

        if let Some(metadata) = &turn.metadata {
            if !metadata.citations.is_empty() {
                output.push_str("Sources:\n");
                for (index, citation) in metadata.citations.iter().enumerate() {
                    output.push_str(&format!("{}. {citation}\n", index + 1));
                }
                output.push('\n');
            }
        }
    }

    write_export(&path, output.as_bytes())?;
    Ok(path)
}

/// Write a conversation as pretty-printed JSON. Returns the created path.
pub fn export_json(conversation: &Conversation, dir: &Path) -> Result<PathBuf, String> {
    let path = export_path(conversation, dir, "json");
    let body = serde_json::to_vec_pretty(conversation)
        .map_err(|error| format!("cannot serialize conversation: {error}"))?;
    write_export(&path, &body)?;
    Ok(path)
}

fn export_path(conversation: &Conversation, dir: &Path, extension: &str) -> PathBuf {
    // Derive a stable, filesystem-safe stamp from the last update time.
    let stamp: String = conversation
        .updated_at
        .chars()
        .map(|c| if c == ':' { '-' } else { c })
        .collect();
    dir.join(format!(
        "conversation-{}-{stamp}.{extension}",
        conversation.id
    ))
}

fn write_export(path: &Path, body: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|error| format!("cannot create {}: {error}", parent.display()))?;
    }
    fs::write(path, body).map_err(|error| format!("cannot write {}: {error}", path.display()))
}
