//! Chat image model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::chat_images;

/// An agent- and conversation-scoped image blob reference.
///
/// Cascade-deleted with its conversation; the blob itself is removed by the
/// caller using the stored key.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatImage {
    /// Unique image identifier.
    pub id: Uuid,
    /// Owning agent.
    pub agent_id: Uuid,
    /// Conversation the image belongs to.
    pub conversation_id: Uuid,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub byte_size: i64,
    /// Object-store key of the image bytes.
    pub storage_key: String,
    /// Timestamp when the image was created.
    pub created_at: Timestamp,
}

/// Data for creating a new chat image.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chat_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChatImage {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Conversation.
    pub conversation_id: Uuid,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub byte_size: i64,
    /// Object-store key.
    pub storage_key: String,
}
