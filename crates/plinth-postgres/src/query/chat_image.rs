//! Chat image repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{ChatImage, NewChatImage};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for chat image database operations.
pub trait ChatImageRepository {
    /// Creates a new chat image record.
    fn create_chat_image(
        &mut self,
        new_image: NewChatImage,
    ) -> impl Future<Output = PgResult<ChatImage>> + Send;

    /// Finds a chat image by id.
    fn find_chat_image(
        &mut self,
        image_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<ChatImage>>> + Send;

    /// Deletes a chat image record.
    fn delete_chat_image(
        &mut self,
        image_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;

    /// Deletes all image records of a conversation, returning the deleted
    /// rows so the caller can remove the blobs.
    fn delete_conversation_images(
        &mut self,
        conversation_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<ChatImage>>> + Send;
}

impl ChatImageRepository for PgConnection {
    async fn create_chat_image(&mut self, new_image: NewChatImage) -> PgResult<ChatImage> {
        use schema::chat_images;

        let image = diesel::insert_into(chat_images::table)
            .values(&new_image)
            .returning(ChatImage::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(image)
    }

    async fn find_chat_image(&mut self, image_id: Uuid) -> PgResult<Option<ChatImage>> {
        use schema::chat_images::dsl;

        let image = dsl::chat_images
            .filter(dsl::id.eq(image_id))
            .select(ChatImage::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(image)
    }

    async fn delete_chat_image(&mut self, image_id: Uuid) -> PgResult<usize> {
        use schema::chat_images::{self, dsl};

        let affected = diesel::delete(chat_images::table.filter(dsl::id.eq(image_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(affected)
    }

    async fn delete_conversation_images(
        &mut self,
        conversation_id: Uuid,
    ) -> PgResult<Vec<ChatImage>> {
        use schema::chat_images::{self, dsl};

        let deleted =
            diesel::delete(chat_images::table.filter(dsl::conversation_id.eq(conversation_id)))
                .returning(ChatImage::as_returning())
                .get_results(self)
                .await
                .map_err(PgError::from)?;

        Ok(deleted)
    }
}
