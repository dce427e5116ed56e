//! Persistent-store contract for jobsift, with in-memory and Postgres backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobsift_core::{CandidateProfile, JobPosting, JobSource, PostingChanges};
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::{MemoryProfileStore, MemoryStore};
pub use postgres::{PgProfileStore, PgStore};

pub const CRATE_NAME: &str = "jobsift-store";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("posting {0} not found")]
    PostingNotFound(Uuid),
    #[error("posting already exists for {source_name}:{source_ref}")]
    DuplicateKey {
        source_name: String,
        source_ref: String,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed stored document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Store operations the sync and matching paths depend on.
///
/// Implementations must enforce uniqueness of the `(source_name, source_ref)`
/// dedup key; under concurrent writers that means a unique constraint or an
/// equivalent serialization point.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_source(&self, name: &str) -> Result<Option<JobSource>, StoreError>;

    /// Create-or-update a source row keyed by name.
    async fn upsert_source(&self, source: &JobSource) -> Result<(), StoreError>;

    async fn find_posting(
        &self,
        source_name: &str,
        source_ref: &str,
    ) -> Result<Option<JobPosting>, StoreError>;

    async fn insert_posting(&self, posting: &JobPosting) -> Result<(), StoreError>;

    /// Apply a partial update; `None` fields are left untouched.
    async fn update_posting(&self, id: Uuid, changes: &PostingChanges) -> Result<(), StoreError>;

    /// All active postings in stable insertion order.
    async fn active_postings(&self) -> Result<Vec<JobPosting>, StoreError>;

    /// Bulk staleness cleanup: flips `active = false` on every active posting
    /// whose `last_synced` is strictly before `cutoff`. Returns the count
    /// affected. Rows are never deleted.
    async fn mark_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Read-only access to the external candidate-profile store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Most-recently-updated profile for the user, if any. Absence is a
    /// valid, non-error state.
    async fn latest_profile(&self, user_id: &str) -> Result<Option<CandidateProfile>, StoreError>;
}
