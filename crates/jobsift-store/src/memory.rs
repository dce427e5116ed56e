//! In-memory store backend, used by tests and local runs without Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobsift_core::{CandidateProfile, JobPosting, JobSource, PostingChanges};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{JobStore, ProfileStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    sources: HashMap<String, JobSource>,
    // Insertion order doubles as the stable retrieval order for matching.
    postings: Vec<JobPosting>,
    by_key: HashMap<(String, String), Uuid>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows held, active or not. Test observability helper.
    pub async fn posting_count(&self) -> usize {
        self.inner.read().await.postings.len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_source(&self, name: &str) -> Result<Option<JobSource>, StoreError> {
        Ok(self.inner.read().await.sources.get(name).cloned())
    }

    async fn upsert_source(&self, source: &JobSource) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .sources
            .insert(source.name.clone(), source.clone());
        Ok(())
    }

    async fn find_posting(
        &self,
        source_name: &str,
        source_ref: &str,
    ) -> Result<Option<JobPosting>, StoreError> {
        let inner = self.inner.read().await;
        let key = (source_name.to_string(), source_ref.to_string());
        let Some(id) = inner.by_key.get(&key) else {
            return Ok(None);
        };
        Ok(inner.postings.iter().find(|p| p.id == *id).cloned())
    }

    async fn insert_posting(&self, posting: &JobPosting) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = (posting.source_name.clone(), posting.source_ref.clone());
        if inner.by_key.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                source_name: posting.source_name.clone(),
                source_ref: posting.source_ref.clone(),
            });
        }
        inner.by_key.insert(key, posting.id);
        inner.postings.push(posting.clone());
        Ok(())
    }

    async fn update_posting(&self, id: Uuid, changes: &PostingChanges) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let Some(posting) = inner.postings.iter_mut().find(|p| p.id == id) else {
            return Err(StoreError::PostingNotFound(id));
        };
        if let Some(title) = &changes.title {
            posting.title = title.clone();
        }
        if let Some(company) = &changes.company {
            posting.company = company.clone();
        }
        if let Some(description) = &changes.description {
            posting.description = description.clone();
        }
        if let Some(location) = &changes.location {
            posting.location = Some(location.clone());
        }
        if let Some(salary_min) = changes.salary_min {
            posting.salary_min = Some(salary_min);
        }
        if let Some(salary_max) = changes.salary_max {
            posting.salary_max = Some(salary_max);
        }
        if let Some(application_url) = &changes.application_url {
            posting.application_url = application_url.clone();
        }
        if let Some(active) = changes.active {
            posting.active = active;
        }
        if let Some(last_synced) = changes.last_synced {
            posting.last_synced = last_synced;
        }
        Ok(())
    }

    async fn active_postings(&self) -> Result<Vec<JobPosting>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .postings
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }

    async fn mark_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let mut affected = 0u64;
        for posting in inner.postings.iter_mut() {
            if posting.active && posting.last_synced < cutoff {
                posting.active = false;
                affected += 1;
            }
        }
        Ok(affected)
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, CandidateProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, profile: CandidateProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn latest_profile(&self, user_id: &str) -> Result<Option<CandidateProfile>, StoreError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use jobsift_core::{EmploymentType, ExperienceLevel, LocationType};

    fn mk_posting(source_ref: &str, last_synced: DateTime<Utc>) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: format!("Engineer {source_ref}"),
            company: "Acme".into(),
            company_logo: None,
            description: "Build things".into(),
            requirements: None,
            location: None,
            location_type: LocationType::Unknown,
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            employment_type: EmploymentType::Unknown,
            experience_level: ExperienceLevel::Unknown,
            application_url: format!("https://acme.example/jobs/{source_ref}"),
            source_name: "boardly".into(),
            source_ref: source_ref.into(),
            source_url: None,
            posted_at: None,
            last_synced,
            active: true,
            skills: vec![],
            created_at: last_synced,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap()
    }

    #[tokio::test]
    async fn insert_then_find_by_dedup_key() {
        let store = MemoryStore::new();
        let posting = mk_posting("a1", now());
        store.insert_posting(&posting).await.unwrap();

        let found = store.find_posting("boardly", "a1").await.unwrap().unwrap();
        assert_eq!(found.id, posting.id);
        assert!(store.find_posting("boardly", "zz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_insert_with_same_key_is_rejected() {
        let store = MemoryStore::new();
        store.insert_posting(&mk_posting("a1", now())).await.unwrap();
        let err = store.insert_posting(&mk_posting("a1", now())).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(store.posting_count().await, 1);
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_untouched() {
        let store = MemoryStore::new();
        let posting = mk_posting("a1", now());
        store.insert_posting(&posting).await.unwrap();

        let later = now() + Duration::hours(1);
        let changes = PostingChanges {
            application_url: Some("https://acme.example/apply/a1".into()),
            last_synced: Some(later),
            ..Default::default()
        };
        store.update_posting(posting.id, &changes).await.unwrap();

        let updated = store.find_posting("boardly", "a1").await.unwrap().unwrap();
        assert_eq!(updated.id, posting.id);
        assert_eq!(updated.application_url, "https://acme.example/apply/a1");
        assert_eq!(updated.title, posting.title);
        assert_eq!(updated.last_synced, later);
    }

    #[tokio::test]
    async fn mark_inactive_before_is_a_strict_cutoff() {
        let store = MemoryStore::new();
        let stale = mk_posting("old", now() - Duration::days(31));
        let fresh = mk_posting("new", now() - Duration::days(29));
        store.insert_posting(&stale).await.unwrap();
        store.insert_posting(&fresh).await.unwrap();

        let affected = store
            .mark_inactive_before(now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let actives = store.active_postings().await.unwrap();
        assert_eq!(actives.len(), 1);
        assert_eq!(actives[0].source_ref, "new");

        // Already-inactive rows are not counted again.
        let again = store
            .mark_inactive_before(now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn active_postings_preserve_insertion_order() {
        let store = MemoryStore::new();
        for source_ref in ["a", "b", "c"] {
            store.insert_posting(&mk_posting(source_ref, now())).await.unwrap();
        }
        let refs: Vec<String> = store
            .active_postings()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.source_ref)
            .collect();
        assert_eq!(refs, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn missing_profile_is_none_not_error() {
        let store = MemoryProfileStore::new();
        assert!(store.latest_profile("nobody").await.unwrap().is_none());

        store
            .put(CandidateProfile {
                user_id: "u1".into(),
                skills: vec!["rust".into()],
                ..Default::default()
            })
            .await;
        let profile = store.latest_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.skills, vec!["rust"]);
    }
}
