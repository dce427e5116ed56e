//! Per-source sync coordination: fetch, normalize, reconcile, report.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jobsift_core::JobSource;
use jobsift_sources::{FetchError, ListingFetcher, SourceConfig, SourceRegistry};
use jobsift_store::{JobStore, StoreError};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::dedup::{reconcile, DedupOutcome};
use crate::normalize::normalize;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unknown source: {0}")]
    UnknownSource(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-source outcome counts for one cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Payload items rejected by the normalizer (missing mandatory fields).
    pub dropped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success_count: usize,
    pub failure_count: usize,
    pub reports: Vec<SourceReport>,
}

impl SyncSummary {
    pub fn created_total(&self) -> usize {
        self.reports.iter().map(|r| r.created).sum()
    }
}

/// Runs sources against the store. The registry is immutable configuration
/// handed in at startup.
pub struct SyncCoordinator {
    registry: SourceRegistry,
    fetcher: Arc<dyn ListingFetcher>,
    store: Arc<dyn JobStore>,
}

impl SyncCoordinator {
    pub fn new(
        registry: SourceRegistry,
        fetcher: Arc<dyn ListingFetcher>,
        store: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
        }
    }

    pub fn store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    /// One sync of a single named source. Unrecoverable source errors (auth
    /// failure, timeout, malformed response) surface as `Err`.
    pub async fn sync_one(&self, name: &str) -> Result<SourceReport, SyncError> {
        let source = self
            .registry
            .get(name)
            .ok_or_else(|| SyncError::UnknownSource(name.to_string()))?;
        sync_source(self.fetcher.as_ref(), self.store.as_ref(), source).await
    }

    /// One full cycle: every configured source concurrently, settle-all join.
    /// A source's failure is counted and logged, never escalated.
    pub async fn sync_all(&self) -> SyncSummary {
        let started_at = Utc::now();
        let mut set = JoinSet::new();
        for source in self.registry.sources.iter().cloned() {
            let fetcher = Arc::clone(&self.fetcher);
            let store = Arc::clone(&self.store);
            set.spawn(async move {
                let result = sync_source(fetcher.as_ref(), store.as_ref(), &source).await;
                (source.name, result)
            });
        }

        let mut reports = Vec::new();
        let mut failure_count = 0usize;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(report))) => {
                    info!(
                        source = %name,
                        created = report.created,
                        updated = report.updated,
                        unchanged = report.unchanged,
                        dropped = report.dropped,
                        "source sync succeeded"
                    );
                    reports.push(report);
                }
                Ok((name, Err(err))) => {
                    warn!(source = %name, error = %err, "source sync failed");
                    failure_count += 1;
                }
                Err(join_err) => {
                    warn!(error = %join_err, "source sync task aborted");
                    failure_count += 1;
                }
            }
        }
        // Join order is completion order; reports stay deterministic by name.
        reports.sort_by(|a, b| a.source.cmp(&b.source));

        SyncSummary {
            started_at,
            finished_at: Utc::now(),
            success_count: reports.len(),
            failure_count,
            reports,
        }
    }

    /// Retire active postings whose `last_synced` is older than `days` days.
    /// They remain queryable as inactive history.
    pub async fn cleanup_inactive(&self, days: u32) -> Result<u64, SyncError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let affected = self.store.mark_inactive_before(cutoff).await?;
        info!(days, affected, "staleness cleanup complete");
        Ok(affected)
    }
}

async fn sync_source(
    fetcher: &dyn ListingFetcher,
    store: &dyn JobStore,
    source: &SourceConfig,
) -> Result<SourceReport, SyncError> {
    let items = fetcher.fetch_listings(source).await?;

    let mut report = SourceReport {
        source: source.name.clone(),
        ..Default::default()
    };
    // Sequential per source; the dedup key's unique constraint is the
    // serialization point if this is ever parallelized.
    for item in &items {
        let Some(normalized) = normalize(item, &source.name) else {
            report.dropped += 1;
            continue;
        };
        match reconcile(store, normalized, Utc::now()).await? {
            DedupOutcome::Created => report.created += 1,
            DedupOutcome::Updated => report.updated += 1,
            DedupOutcome::Unchanged => report.unchanged += 1,
        }
    }

    // Only a fully successful pass refreshes the source's last-sync stamp.
    store
        .upsert_source(&JobSource {
            name: source.name.clone(),
            display_name: source.display_name.clone(),
            base_url: source.base_url.clone(),
            last_sync: Some(Utc::now()),
        })
        .await?;

    Ok(report)
}
