//! Core domain model for the jobsift pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "jobsift-core";

/// How a posting expects work to be located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Remote,
    Hybrid,
    Onsite,
    #[default]
    Unknown,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Remote => "remote",
            LocationType::Hybrid => "hybrid",
            LocationType::Onsite => "onsite",
            LocationType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    #[default]
    Unknown,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
            EmploymentType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
    #[default]
    Unknown,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Executive => "executive",
            ExperienceLevel::Unknown => "unknown",
        }
    }

    /// Human-readable label for match explanations.
    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry level",
            ExperienceLevel::Mid => "mid level",
            ExperienceLevel::Senior => "senior level",
            ExperienceLevel::Executive => "executive level",
            ExperienceLevel::Unknown => "unknown level",
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external listing provider, keyed by `name`.
///
/// Created on the first successful sync from that source and refreshed every
/// successful cycle; never deleted automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSource {
    pub name: String,
    pub display_name: String,
    pub base_url: String,
    pub last_sync: Option<DateTime<Utc>>,
}

/// A skill attached to a posting. `required: false` means nice-to-have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSkill {
    pub name: String,
    pub required: bool,
}

impl JobSkill {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn preferred(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// The deduplicated unit of record.
///
/// Invariant: `(source_name, source_ref)` identifies exactly one row; a later
/// sync either leaves it unchanged, updates mutable fields, or flips
/// `active = false` once the source stops returning it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub company_logo: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    pub location: Option<String>,
    pub location_type: LocationType,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub application_url: String,
    pub source_name: String,
    pub source_ref: String,
    pub source_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub last_synced: DateTime<Utc>,
    pub active: bool,
    pub skills: Vec<JobSkill>,
    pub created_at: DateTime<Utc>,
}

impl JobPosting {
    /// The dedup key identifying one real-world posting.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.source_name, &self.source_ref)
    }
}

/// Normalized handoff contract from the normalizer into the dedup step:
/// a posting's content before it has store identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    pub title: String,
    pub company: String,
    pub company_logo: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    pub location: Option<String>,
    pub location_type: LocationType,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub application_url: String,
    pub source_name: String,
    pub source_ref: String,
    pub source_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub skills: Vec<JobSkill>,
}

impl NormalizedPosting {
    /// Promote to a full posting row at first sight of this dedup key.
    pub fn into_posting(self, now: DateTime<Utc>) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: self.title,
            company: self.company,
            company_logo: self.company_logo,
            description: self.description,
            requirements: self.requirements,
            location: self.location,
            location_type: self.location_type,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            salary_currency: self.salary_currency,
            employment_type: self.employment_type,
            experience_level: self.experience_level,
            application_url: self.application_url,
            source_name: self.source_name,
            source_ref: self.source_ref,
            source_url: self.source_url,
            posted_at: self.posted_at,
            last_synced: now,
            active: true,
            skills: self.skills,
            created_at: now,
        }
    }
}

/// Partial update over a posting's significant fields. `None` leaves the
/// stored value untouched; `last_synced` is always written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingChanges {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub application_url: Option<String>,
    pub active: Option<bool>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl PostingChanges {
    /// True when no significant field changed.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.salary_min.is_none()
            && self.salary_max.is_none()
            && self.application_url.is_none()
            && self.active.is_none()
    }
}

/// One work-history entry; `ended_at = None` means still current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHistoryEntry {
    pub title: String,
    pub description: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Candidate profile, read-only input to matching. Owned by the external
/// profile store; never created or mutated by this pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub user_id: String,
    pub skills: Vec<String>,
    pub work_history: Vec<WorkHistoryEntry>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub desired_location: Option<String>,
    #[serde(default)]
    pub remote_preference: Option<bool>,
}

/// One scored candidate-to-posting match. Computed on demand, request-scoped,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub posting: JobPosting,
    pub score: f64,
    pub matched_skills: Vec<String>,
    pub reasons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn enum_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&EmploymentType::FullTime).unwrap(),
            "\"full_time\""
        );
        assert_eq!(
            serde_json::from_str::<LocationType>("\"remote\"").unwrap(),
            LocationType::Remote
        );
        assert_eq!(
            serde_json::from_str::<ExperienceLevel>("\"executive\"").unwrap(),
            ExperienceLevel::Executive
        );
    }

    #[test]
    fn normalized_posting_promotion_sets_identity_fields() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().unwrap();
        let normalized = NormalizedPosting {
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            company_logo: None,
            description: "Build services".into(),
            requirements: None,
            location: None,
            location_type: LocationType::Remote,
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            employment_type: EmploymentType::FullTime,
            experience_level: ExperienceLevel::Mid,
            application_url: "https://acme.example/jobs/1".into(),
            source_name: "boardly".into(),
            source_ref: "1".into(),
            source_url: None,
            posted_at: None,
            skills: vec![JobSkill::required("rust")],
        };

        let posting = normalized.into_posting(now);
        assert!(posting.active);
        assert_eq!(posting.last_synced, now);
        assert_eq!(posting.created_at, now);
        assert_eq!(posting.dedup_key(), ("boardly", "1"));
    }

    #[test]
    fn empty_changes_are_detected() {
        let mut changes = PostingChanges::default();
        assert!(changes.is_empty());
        changes.application_url = Some("https://acme.example/jobs/2".into());
        assert!(!changes.is_empty());
    }
}
