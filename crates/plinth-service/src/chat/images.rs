//! Image-capability gating and inline encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use plinth_opendal::StorageBackend;
use plinth_postgres::PgConnection;
use plinth_postgres::model::ModelCapabilities;
use plinth_postgres::query::ChatImageRepository;
use plinth_inference::client::ContentPart;
use uuid::Uuid;

use super::IncomingPart;
use crate::TRACING_TARGET;

/// Placeholder substituted for image parts when the selected model has no
/// image input capability.
pub const IMAGE_SKIPPED_PLACEHOLDER: &str =
    "[Image attachment skipped - selected model does not support image input]";

/// Placeholder substituted when an image reference cannot be loaded.
pub const IMAGE_UNAVAILABLE_PLACEHOLDER: &str = "[Image attachment unavailable]";

/// Resolves incoming message parts against the selected model's
/// capabilities.
///
/// Image parts on a text-only model degrade to a textual placeholder rather
/// than failing the turn; supported images are fetched and inlined as
/// base64 data URLs with their stored MIME type.
pub(crate) async fn resolve_parts(
    conn: &mut PgConnection,
    storage: &StorageBackend,
    capabilities: ModelCapabilities,
    parts: &[IncomingPart],
) -> Vec<ContentPart> {
    let mut resolved = Vec::with_capacity(parts.len());

    for part in parts {
        match part {
            IncomingPart::Text { text } => resolved.push(ContentPart::text(text.clone())),
            IncomingPart::Image { image_id } => {
                if !capabilities.image_input {
                    resolved.push(ContentPart::text(IMAGE_SKIPPED_PLACEHOLDER));
                    continue;
                }
                resolved.push(load_image(conn, storage, *image_id).await);
            }
        }
    }

    resolved
}

async fn load_image(
    conn: &mut PgConnection,
    storage: &StorageBackend,
    image_id: Uuid,
) -> ContentPart {
    let image = match conn.find_chat_image(image_id).await {
        Ok(Some(image)) => image,
        Ok(None) => {
            tracing::warn!(
                target: TRACING_TARGET,
                image_id = %image_id,
                "Chat image record missing"
            );
            return ContentPart::text(IMAGE_UNAVAILABLE_PLACEHOLDER);
        }
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                image_id = %image_id,
                error = %error,
                "Chat image lookup failed"
            );
            return ContentPart::text(IMAGE_UNAVAILABLE_PLACEHOLDER);
        }
    };

    match storage.read(&image.storage_key).await {
        Ok(bytes) => {
            let encoded = STANDARD.encode(&bytes);
            ContentPart::inline_image(&image.mime_type, &encoded)
        }
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                image_id = %image_id,
                error = %error,
                "Chat image blob fetch failed"
            );
            ContentPart::text(IMAGE_UNAVAILABLE_PLACEHOLDER)
        }
    }
}
