//! Knowledge source status enumeration.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle status of a knowledge source.
///
/// Corresponds to the `SOURCE_STATUS` PostgreSQL enum. Created by upload
/// initiation, `uploaded` on confirm, `processing` during ingestion, then
/// `indexed` on success or `failed` with recorded error messages.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::SourceStatus"]
pub enum SourceStatus {
    /// Upload confirmed; bytes are in the object store.
    #[db_rename = "uploaded"]
    #[serde(rename = "uploaded")]
    #[default]
    Uploaded,

    /// Text extraction completed, chunks not yet indexed.
    #[db_rename = "parsed"]
    #[serde(rename = "parsed")]
    Parsed,

    /// Ingestion pipeline is running.
    #[db_rename = "processing"]
    #[serde(rename = "processing")]
    Processing,

    /// All chunks embedded and written to both indices.
    #[db_rename = "indexed"]
    #[serde(rename = "indexed")]
    Indexed,

    /// Ingestion failed; see the source's error messages.
    #[db_rename = "failed"]
    #[serde(rename = "failed")]
    Failed,
}

impl SourceStatus {
    /// Returns whether ingestion may start from this state.
    #[inline]
    pub fn can_be_ingested(self) -> bool {
        matches!(
            self,
            SourceStatus::Uploaded | SourceStatus::Indexed | SourceStatus::Failed
        )
    }

    /// Returns whether the source is queryable.
    #[inline]
    pub fn is_indexed(self) -> bool {
        matches!(self, SourceStatus::Indexed)
    }

    /// Returns whether ingestion is currently running.
    #[inline]
    pub fn is_processing(self) -> bool {
        matches!(self, SourceStatus::Processing)
    }
}
