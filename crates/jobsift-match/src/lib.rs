//! Matching engine: ranks active postings against a candidate profile.
//!
//! Independent of the sync path; reads the store and the profile store and
//! never writes either.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jobsift_core::{CandidateProfile, JobPosting, MatchResult};
use jobsift_store::{JobStore, ProfileStore, StoreError};
use tracing::debug;

pub mod score;

pub use score::{experience_factor, score_posting, tenure_years, MatchWeights};

pub const CRATE_NAME: &str = "jobsift-match";

pub struct MatchEngine {
    store: Arc<dyn JobStore>,
    profiles: Arc<dyn ProfileStore>,
    weights: MatchWeights,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn JobStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            profiles,
            weights: MatchWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: MatchWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Ranked matches for a user, at most `limit` long. A user without a
    /// profile gets an empty list, not an error.
    pub async fn find_matches(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchResult>, StoreError> {
        let Some(profile) = self.profiles.latest_profile(user_id).await? else {
            debug!(user_id, "no candidate profile; returning empty match list");
            return Ok(Vec::new());
        };
        let postings = self.store.active_postings().await?;
        Ok(rank(&profile, postings, limit, Utc::now(), &self.weights))
    }
}

/// Score and order postings: descending by score, ties keep retrieval order
/// (stable sort, no secondary key), truncated to `limit`.
pub fn rank(
    profile: &CandidateProfile,
    postings: Vec<JobPosting>,
    limit: usize,
    now: DateTime<Utc>,
    weights: &MatchWeights,
) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = postings
        .into_iter()
        .map(|posting| score_posting(profile, posting, now, weights))
        .collect();
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jobsift_core::{EmploymentType, ExperienceLevel, JobSkill, LocationType};
    use jobsift_store::{MemoryProfileStore, MemoryStore};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap()
    }

    fn mk_posting(source_ref: &str, skills: Vec<JobSkill>) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            company_logo: None,
            description: "Build services".into(),
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
            last_synced: now(),
            active: true,
            skills,
            created_at: now(),
        }
    }

    #[tokio::test]
    async fn missing_profile_returns_empty_matches() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_posting(&mk_posting("a1", vec![]))
            .await
            .unwrap();
        let engine = MatchEngine::new(store, Arc::new(MemoryProfileStore::new()));

        let matches = engine.find_matches("ghost", 10).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn inactive_postings_are_never_matched() {
        let store = Arc::new(MemoryStore::new());
        let mut inactive = mk_posting("gone", vec![]);
        inactive.active = false;
        store.insert_posting(&inactive).await.unwrap();
        store
            .insert_posting(&mk_posting("live", vec![]))
            .await
            .unwrap();

        let profiles = Arc::new(MemoryProfileStore::new());
        profiles
            .put(CandidateProfile {
                user_id: "u1".into(),
                skills: vec!["rust".into()],
                ..Default::default()
            })
            .await;

        let engine = MatchEngine::new(store, profiles);
        let matches = engine.find_matches("u1", 10).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].posting.source_ref, "live");
    }

    #[test]
    fn rank_orders_descending_and_truncates() {
        let profile = CandidateProfile {
            user_id: "u1".into(),
            skills: vec!["sql".into()],
            ..Default::default()
        };
        let postings = vec![
            mk_posting("none", vec![JobSkill::required("Go")]),
            mk_posting("hit", vec![JobSkill::required("SQL")]),
            mk_posting("also-none", vec![JobSkill::required("Java")]),
        ];

        let ranked = rank(&profile, postings, 2, now(), &MatchWeights::default());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].posting.source_ref, "hit");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn equal_scores_keep_retrieval_order() {
        let profile = CandidateProfile {
            user_id: "u1".into(),
            ..Default::default()
        };
        let postings = vec![
            mk_posting("first", vec![]),
            mk_posting("second", vec![]),
            mk_posting("third", vec![]),
        ];

        let ranked = rank(&profile, postings, 10, now(), &MatchWeights::default());
        let refs: Vec<&str> = ranked.iter().map(|r| r.posting.source_ref.as_str()).collect();
        assert_eq!(refs, vec!["first", "second", "third"]);
        assert!(ranked.windows(2).all(|w| w[0].score == w[1].score));
    }
}
