//! Postgres store backend (sqlx, runtime queries).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobsift_core::{
    CandidateProfile, EmploymentType, ExperienceLevel, JobPosting, JobSkill, JobSource,
    LocationType, PostingChanges,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{JobStore, ProfileStore, StoreError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| StoreError::Database(sqlx::Error::Migrate(Box::new(err))))
    }
}

fn location_type_from_str(value: &str) -> LocationType {
    match value {
        "remote" => LocationType::Remote,
        "hybrid" => LocationType::Hybrid,
        "onsite" => LocationType::Onsite,
        _ => LocationType::Unknown,
    }
}

fn employment_type_from_str(value: &str) -> EmploymentType {
    match value {
        "full_time" => EmploymentType::FullTime,
        "part_time" => EmploymentType::PartTime,
        "contract" => EmploymentType::Contract,
        "internship" => EmploymentType::Internship,
        _ => EmploymentType::Unknown,
    }
}

fn experience_level_from_str(value: &str) -> ExperienceLevel {
    match value {
        "entry" => ExperienceLevel::Entry,
        "mid" => ExperienceLevel::Mid,
        "senior" => ExperienceLevel::Senior,
        "executive" => ExperienceLevel::Executive,
        _ => ExperienceLevel::Unknown,
    }
}

fn posting_from_row(row: &PgRow) -> Result<JobPosting, StoreError> {
    let location_type: String = row.try_get("location_type")?;
    let employment_type: String = row.try_get("employment_type")?;
    let experience_level: String = row.try_get("experience_level")?;
    let skills_json: serde_json::Value = row.try_get("skills")?;
    let skills: Vec<JobSkill> = serde_json::from_value(skills_json)?;

    Ok(JobPosting {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        company: row.try_get("company")?,
        company_logo: row.try_get("company_logo")?,
        description: row.try_get("description")?,
        requirements: row.try_get("requirements")?,
        location: row.try_get("location")?,
        location_type: location_type_from_str(&location_type),
        salary_min: row.try_get("salary_min")?,
        salary_max: row.try_get("salary_max")?,
        salary_currency: row.try_get("salary_currency")?,
        employment_type: employment_type_from_str(&employment_type),
        experience_level: experience_level_from_str(&experience_level),
        application_url: row.try_get("application_url")?,
        source_name: row.try_get("source_name")?,
        source_ref: row.try_get("source_ref")?,
        source_url: row.try_get("source_url")?,
        posted_at: row.try_get("posted_at")?,
        last_synced: row.try_get("last_synced")?,
        active: row.try_get("active")?,
        skills,
        created_at: row.try_get("created_at")?,
    })
}

const POSTING_COLUMNS: &str = "id, title, company, company_logo, description, requirements, \
     location, location_type, salary_min, salary_max, salary_currency, employment_type, \
     experience_level, application_url, source_name, source_ref, source_url, posted_at, \
     last_synced, active, skills, created_at";

#[async_trait]
impl JobStore for PgStore {
    async fn find_source(&self, name: &str) -> Result<Option<JobSource>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT name, display_name, base_url, last_sync
              FROM job_sources
             WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(JobSource {
                name: row.try_get("name")?,
                display_name: row.try_get("display_name")?,
                base_url: row.try_get("base_url")?,
                last_sync: row.try_get("last_sync")?,
            })
        })
        .transpose()
    }

    async fn upsert_source(&self, source: &JobSource) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO job_sources (name, display_name, base_url, last_sync)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
               SET display_name = EXCLUDED.display_name,
                   base_url = EXCLUDED.base_url,
                   last_sync = EXCLUDED.last_sync
            "#,
        )
        .bind(&source.name)
        .bind(&source.display_name)
        .bind(&source.base_url)
        .bind(source.last_sync)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_posting(
        &self,
        source_name: &str,
        source_ref: &str,
    ) -> Result<Option<JobPosting>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {POSTING_COLUMNS} FROM job_postings WHERE source_name = $1 AND source_ref = $2"
        ))
        .bind(source_name)
        .bind(source_ref)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(posting_from_row).transpose()
    }

    async fn insert_posting(&self, posting: &JobPosting) -> Result<(), StoreError> {
        let skills = serde_json::to_value(&posting.skills)?;
        let result = sqlx::query(
            r#"
            INSERT INTO job_postings (
                id, title, company, company_logo, description, requirements,
                location, location_type, salary_min, salary_max, salary_currency,
                employment_type, experience_level, application_url, source_name,
                source_ref, source_url, posted_at, last_synced, active, skills, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            ON CONFLICT (source_name, source_ref) DO NOTHING
            "#,
        )
        .bind(posting.id)
        .bind(&posting.title)
        .bind(&posting.company)
        .bind(&posting.company_logo)
        .bind(&posting.description)
        .bind(&posting.requirements)
        .bind(&posting.location)
        .bind(posting.location_type.as_str())
        .bind(posting.salary_min)
        .bind(posting.salary_max)
        .bind(&posting.salary_currency)
        .bind(posting.employment_type.as_str())
        .bind(posting.experience_level.as_str())
        .bind(&posting.application_url)
        .bind(&posting.source_name)
        .bind(&posting.source_ref)
        .bind(&posting.source_url)
        .bind(posting.posted_at)
        .bind(posting.last_synced)
        .bind(posting.active)
        .bind(skills)
        .bind(posting.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateKey {
                source_name: posting.source_name.clone(),
                source_ref: posting.source_ref.clone(),
            });
        }
        Ok(())
    }

    async fn update_posting(&self, id: Uuid, changes: &PostingChanges) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE job_postings
               SET title = COALESCE($2, title),
                   company = COALESCE($3, company),
                   description = COALESCE($4, description),
                   location = COALESCE($5, location),
                   salary_min = COALESCE($6, salary_min),
                   salary_max = COALESCE($7, salary_max),
                   application_url = COALESCE($8, application_url),
                   active = COALESCE($9, active),
                   last_synced = COALESCE($10, last_synced)
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.company)
        .bind(&changes.description)
        .bind(&changes.location)
        .bind(changes.salary_min)
        .bind(changes.salary_max)
        .bind(&changes.application_url)
        .bind(changes.active)
        .bind(changes.last_synced)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PostingNotFound(id));
        }
        Ok(())
    }

    async fn active_postings(&self) -> Result<Vec<JobPosting>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {POSTING_COLUMNS} FROM job_postings WHERE active ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(posting_from_row).collect()
    }

    async fn mark_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE job_postings
               SET active = FALSE
             WHERE active
               AND last_synced < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Profile reader over a `candidate_profiles` table holding one JSONB
/// document per revision; the newest revision wins.
#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn latest_profile(&self, user_id: &str) -> Result<Option<CandidateProfile>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT data
              FROM candidate_profiles
             WHERE user_id = $1
             ORDER BY updated_at DESC
             LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let data: serde_json::Value = row.try_get("data")?;
        Ok(Some(serde_json::from_value(data)?))
    }
}
