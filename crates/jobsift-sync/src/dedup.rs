//! Dedup decisions: one store row per (source, source-native id).

use chrono::{DateTime, Utc};
use jobsift_core::{JobPosting, NormalizedPosting, PostingChanges};
use jobsift_store::{JobStore, StoreError};
use tracing::debug;

/// What one normalized payload did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    Created,
    Updated,
    /// Nothing significant differed; the write was skipped entirely.
    Unchanged,
}

/// Create, update, or no-op a normalized posting against existing state.
/// Rows are never deleted here; staleness is the cleanup policy's job.
pub async fn reconcile(
    store: &dyn JobStore,
    normalized: NormalizedPosting,
    now: DateTime<Utc>,
) -> Result<DedupOutcome, StoreError> {
    let existing = store
        .find_posting(&normalized.source_name, &normalized.source_ref)
        .await?;

    let Some(existing) = existing else {
        store.insert_posting(&normalized.into_posting(now)).await?;
        return Ok(DedupOutcome::Created);
    };

    let changes = diff_significant(&existing, &normalized, now);
    if changes.is_empty() {
        debug!(
            source = %existing.source_name,
            source_ref = %existing.source_ref,
            "posting unchanged; skipping write"
        );
        return Ok(DedupOutcome::Unchanged);
    }

    store.update_posting(existing.id, &changes).await?;
    Ok(DedupOutcome::Updated)
}

/// Significant-field diff. Optional payload fields that are absent carry no
/// information and never clobber stored values.
fn diff_significant(
    existing: &JobPosting,
    normalized: &NormalizedPosting,
    now: DateTime<Utc>,
) -> PostingChanges {
    let mut changes = PostingChanges::default();

    if existing.title != normalized.title {
        changes.title = Some(normalized.title.clone());
    }
    if existing.company != normalized.company {
        changes.company = Some(normalized.company.clone());
    }
    if existing.description != normalized.description {
        changes.description = Some(normalized.description.clone());
    }
    if let Some(location) = &normalized.location {
        if existing.location.as_deref() != Some(location) {
            changes.location = Some(location.clone());
        }
    }
    if let Some(salary_min) = normalized.salary_min {
        if existing.salary_min != Some(salary_min) {
            changes.salary_min = Some(salary_min);
        }
    }
    if let Some(salary_max) = normalized.salary_max {
        if existing.salary_max != Some(salary_max) {
            changes.salary_max = Some(salary_max);
        }
    }
    if existing.application_url != normalized.application_url {
        changes.application_url = Some(normalized.application_url.clone());
    }
    // The source is returning this posting again: revive it.
    if !existing.active {
        changes.active = Some(true);
    }

    if !changes.is_empty() {
        changes.last_synced = Some(now);
    }
    changes
}
