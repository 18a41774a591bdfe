//! Typed storage keys.
//!
//! All blobs live under agent-scoped prefixes so that deleting an agent's
//! artifacts is a prefix removal. File names are sanitized before they enter
//! a key: path separators and parent references are rejected.

use std::fmt;

use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// A renderable storage key.
pub trait StorageKey: fmt::Display {
    /// Renders the key as an object path.
    fn path(&self) -> String {
        self.to_string()
    }
}

fn validate_file_name(file_name: &str) -> StorageResult<()> {
    if file_name.is_empty() {
        return Err(StorageError::invalid_path("empty file name"));
    }
    if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
        return Err(StorageError::invalid_path(format!(
            "file name must not contain path components: {file_name}"
        )));
    }
    Ok(())
}

/// Key for an uploaded knowledge file:
/// `agents/{agent_id}/sources/{source_id}/{file_name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceKey {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Knowledge source record.
    pub source_id: Uuid,
    /// Original file name.
    pub file_name: String,
}

impl SourceKey {
    /// Creates a new source key, validating the file name.
    pub fn new(
        agent_id: Uuid,
        source_id: Uuid,
        file_name: impl Into<String>,
    ) -> StorageResult<Self> {
        let file_name = file_name.into();
        validate_file_name(&file_name)?;
        Ok(Self {
            agent_id,
            source_id,
            file_name,
        })
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agents/{}/sources/{}/{}",
            self.agent_id, self.source_id, self.file_name
        )
    }
}

impl StorageKey for SourceKey {}

/// Key for a chat image:
/// `agents/{agent_id}/chat/{conversation_id}/images/{image_id}/{file_name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatImageKey {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Conversation the image belongs to.
    pub conversation_id: Uuid,
    /// Image record.
    pub image_id: Uuid,
    /// Original file name.
    pub file_name: String,
}

impl ChatImageKey {
    /// Creates a new chat image key, validating the file name.
    pub fn new(
        agent_id: Uuid,
        conversation_id: Uuid,
        image_id: Uuid,
        file_name: impl Into<String>,
    ) -> StorageResult<Self> {
        let file_name = file_name.into();
        validate_file_name(&file_name)?;
        Ok(Self {
            agent_id,
            conversation_id,
            image_id,
            file_name,
        })
    }

    /// Returns the conversation-level prefix, used for cascade deletion.
    pub fn conversation_prefix(agent_id: Uuid, conversation_id: Uuid) -> String {
        format!("agents/{agent_id}/chat/{conversation_id}/")
    }
}

impl fmt::Display for ChatImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agents/{}/chat/{}/images/{}/{}",
            self.agent_id, self.conversation_id, self.image_id, self.file_name
        )
    }
}

impl StorageKey for ChatImageKey {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_key_layout() {
        let agent = Uuid::nil();
        let source = Uuid::nil();
        let key = SourceKey::new(agent, source, "handbook.pdf").unwrap();

        assert_eq!(
            key.path(),
            format!("agents/{agent}/sources/{source}/handbook.pdf")
        );
    }

    #[test]
    fn chat_image_key_layout() {
        let id = Uuid::nil();
        let key = ChatImageKey::new(id, id, id, "photo.png").unwrap();
        assert!(key.path().starts_with(&ChatImageKey::conversation_prefix(id, id)));
        assert!(key.path().ends_with("photo.png"));
    }

    #[test]
    fn rejects_path_traversal() {
        let id = Uuid::nil();
        assert!(SourceKey::new(id, id, "../escape.txt").is_err());
        assert!(SourceKey::new(id, id, "a/b.txt").is_err());
        assert!(SourceKey::new(id, id, "").is_err());
    }
}
