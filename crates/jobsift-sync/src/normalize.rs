//! Heterogeneous raw payload → canonical posting normalization.
//!
//! Pure transformation: no I/O, no store access. A payload missing title,
//! company, or description after cleaning is dropped (`None`), never an error.

use jobsift_core::{EmploymentType, ExperienceLevel, JobSkill, LocationType, NormalizedPosting};
use jobsift_sources::payload::{
    datetime_field, f64_field, nested_f64, nested_str, str_field, string_list,
};
use serde_json::Value as JsonValue;

const TITLE_KEYS: &[&str] = &["title", "job_title", "position", "name"];
const COMPANY_KEYS: &[&str] = &["company", "company_name", "employer"];
const DESCRIPTION_KEYS: &[&str] = &["description", "job_description", "summary", "snippet"];
const REQUIREMENTS_KEYS: &[&str] = &["requirements", "qualifications"];
const LOCATION_KEYS: &[&str] = &["location", "city", "candidate_required_location"];
const LOGO_KEYS: &[&str] = &["company_logo", "logo", "company_logo_url"];
const APPLY_URL_KEYS: &[&str] = &["application_url", "apply_url", "url", "link"];
const SOURCE_URL_KEYS: &[&str] = &["source_url", "permalink", "job_url"];
const REF_KEYS: &[&str] = &["id", "job_id", "slug"];
const EMPLOYMENT_KEYS: &[&str] = &["employment_type", "job_type", "type", "contract_type"];
const SALARY_MIN_KEYS: &[&str] = &["salary_min", "min_salary", "salary_from"];
const SALARY_MAX_KEYS: &[&str] = &["salary_max", "max_salary", "salary_to"];
const CURRENCY_KEYS: &[&str] = &["salary_currency", "currency"];
const POSTED_KEYS: &[&str] = &["posted_at", "created", "date_posted", "publication_date"];
const REQUIRED_SKILL_KEYS: &[&str] = &["required_skills", "skills"];
const PREFERRED_SKILL_KEYS: &[&str] = &["preferred_skills", "nice_to_have"];

// Level keyword families, checked in this fixed order; the first family with
// any match wins. "Senior Engineering Manager" therefore resolves to the
// earliest matching family, not the loudest word.
const ENTRY_KEYWORDS: &[&str] = &[
    "entry level",
    "entry-level",
    "junior",
    "graduate",
    "intern",
    "trainee",
];
const MID_KEYWORDS: &[&str] = &["mid level", "mid-level", "intermediate", "associate"];
const SENIOR_KEYWORDS: &[&str] = &["senior", "staff", "principal", "lead"];
const EXECUTIVE_KEYWORDS: &[&str] = &[
    "executive",
    "director",
    "vice president",
    "head of",
    "chief",
];

const REQUIREMENT_MARKERS: &[&str] = &["requirements", "qualifications"];
const REQUIREMENT_END_MARKERS: &[&str] = &["responsibilities", "benefits"];

/// Collapse internal whitespace runs to single spaces and trim the ends.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map one raw listing item to a canonical posting, or drop it.
pub fn normalize(raw: &JsonValue, source_name: &str) -> Option<NormalizedPosting> {
    let title = clean_text(str_field(raw, TITLE_KEYS)?);
    let company = clean_text(
        str_field(raw, COMPANY_KEYS).or_else(|| nested_str(raw, &["company", "name"]))?,
    );
    let description = clean_text(str_field(raw, DESCRIPTION_KEYS)?);
    if title.is_empty() || company.is_empty() || description.is_empty() {
        return None;
    }

    let application_url = str_field(raw, APPLY_URL_KEYS)
        .map(ToString::to_string)
        .unwrap_or_default();
    let source_ref = ref_field(raw).or_else(|| {
        (!application_url.is_empty()).then(|| application_url.clone())
    })?;

    let location = str_field(raw, LOCATION_KEYS)
        .map(clean_text)
        .filter(|s| !s.is_empty());
    let requirements = str_field(raw, REQUIREMENTS_KEYS)
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .or_else(|| extract_requirements(&description));

    let mut skills: Vec<JobSkill> = string_list(raw, REQUIRED_SKILL_KEYS)
        .into_iter()
        .map(JobSkill::required)
        .collect();
    skills.extend(
        string_list(raw, PREFERRED_SKILL_KEYS)
            .into_iter()
            .map(JobSkill::preferred),
    );

    Some(NormalizedPosting {
        location_type: infer_location_type(location.as_deref(), &description),
        employment_type: infer_employment_type(str_field(raw, EMPLOYMENT_KEYS), &title),
        experience_level: infer_experience_level(&format!("{title} {description}")),
        salary_min: f64_field(raw, SALARY_MIN_KEYS).or_else(|| nested_f64(raw, &["salary", "min"])),
        salary_max: f64_field(raw, SALARY_MAX_KEYS).or_else(|| nested_f64(raw, &["salary", "max"])),
        salary_currency: str_field(raw, CURRENCY_KEYS)
            .or_else(|| nested_str(raw, &["salary", "currency"]))
            .map(ToString::to_string),
        company_logo: str_field(raw, LOGO_KEYS)
            .or_else(|| nested_str(raw, &["company", "logo"]))
            .map(ToString::to_string),
        source_url: str_field(raw, SOURCE_URL_KEYS).map(ToString::to_string),
        posted_at: datetime_field(raw, POSTED_KEYS),
        title,
        company,
        description,
        requirements,
        location,
        application_url,
        source_name: source_name.to_string(),
        source_ref,
        skills,
    })
}

/// Source-native identifier; numeric ids are common and stringified.
fn ref_field(raw: &JsonValue) -> Option<String> {
    REF_KEYS.iter().find_map(|key| match raw.get(*key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn infer_location_type(location: Option<&str>, description: &str) -> LocationType {
    let description = description.to_lowercase();
    let location_lc = location.map(str::to_lowercase).unwrap_or_default();
    if location_lc.contains("remote") || description.contains("remote") {
        LocationType::Remote
    } else if description.contains("hybrid") {
        LocationType::Hybrid
    } else if location.is_some() {
        LocationType::Onsite
    } else {
        LocationType::Unknown
    }
}

/// Substring table over the payload's employment field; falls back to the
/// title so "Marketing Intern" still classifies without a type field.
fn infer_employment_type(raw_value: Option<&str>, title: &str) -> EmploymentType {
    let text = raw_value.unwrap_or(title).to_lowercase();
    if text.contains("full") || text.contains("permanent") {
        EmploymentType::FullTime
    } else if text.contains("part") {
        EmploymentType::PartTime
    } else if text.contains("contract") || text.contains("freelance") || text.contains("temporary")
    {
        EmploymentType::Contract
    } else if text.contains("intern") {
        EmploymentType::Internship
    } else {
        EmploymentType::Unknown
    }
}

fn infer_experience_level(text: &str) -> ExperienceLevel {
    let text = text.to_lowercase();
    let families: [(&[&str], ExperienceLevel); 4] = [
        (ENTRY_KEYWORDS, ExperienceLevel::Entry),
        (MID_KEYWORDS, ExperienceLevel::Mid),
        (SENIOR_KEYWORDS, ExperienceLevel::Senior),
        (EXECUTIVE_KEYWORDS, ExperienceLevel::Executive),
    ];
    for (keywords, level) in families {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return level;
        }
    }
    ExperienceLevel::Unknown
}

/// Best-effort slice of the description between a requirements marker and a
/// responsibilities/benefits marker. Not required to be correct.
fn extract_requirements(description: &str) -> Option<String> {
    let start = REQUIREMENT_MARKERS
        .iter()
        .filter_map(|marker| find_ascii_ci(description, marker).map(|idx| idx + marker.len()))
        .min()?;
    let rest = &description[start..];
    let end = REQUIREMENT_END_MARKERS
        .iter()
        .filter_map(|marker| find_ascii_ci(rest, marker))
        .min()
        .unwrap_or(rest.len());
    let slice = clean_text(rest[..end].trim_start_matches([':', '-', ' ']));
    (!slice.is_empty()).then_some(slice)
}

// ASCII case-insensitive substring search; returned offsets are valid char
// boundaries because the needle is ASCII.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_payload() -> JsonValue {
        json!({
            "id": 42,
            "title": "  Backend   Engineer ",
            "company": "Acme Corp",
            "description": "Build and run services.",
            "apply_url": "https://acme.example/jobs/42/apply",
        })
    }

    #[test]
    fn missing_mandatory_fields_are_dropped() {
        for field in ["title", "company", "description"] {
            let mut payload = base_payload();
            payload.as_object_mut().unwrap().remove(field);
            assert!(normalize(&payload, "boardly").is_none(), "missing {field}");
        }

        // Whitespace-only counts as missing after cleaning.
        let mut payload = base_payload();
        payload["title"] = json!("   ");
        assert!(normalize(&payload, "boardly").is_none());
    }

    #[test]
    fn whitespace_is_collapsed_and_trimmed() {
        let posting = normalize(&base_payload(), "boardly").unwrap();
        assert_eq!(posting.title, "Backend Engineer");
        assert_eq!(posting.source_name, "boardly");
        assert_eq!(posting.source_ref, "42");
    }

    #[test]
    fn alternate_field_names_are_tolerated() {
        let payload = json!({
            "job_id": "ref-9",
            "position": "Data Analyst",
            "company": {"name": "Globex", "logo": "https://globex.example/logo.png"},
            "snippet": "Crunch numbers.",
            "link": "https://globex.example/jobs/9",
            "salary": {"min": 70000, "max": 90000, "currency": "EUR"},
        });
        let posting = normalize(&payload, "opengigs").unwrap();
        assert_eq!(posting.title, "Data Analyst");
        assert_eq!(posting.company, "Globex");
        assert_eq!(posting.source_ref, "ref-9");
        assert_eq!(posting.application_url, "https://globex.example/jobs/9");
        assert_eq!(posting.salary_min, Some(70000.0));
        assert_eq!(posting.salary_max, Some(90000.0));
        assert_eq!(posting.salary_currency.as_deref(), Some("EUR"));
        assert_eq!(
            posting.company_logo.as_deref(),
            Some("https://globex.example/logo.png")
        );
    }

    #[test]
    fn payload_without_native_id_falls_back_to_apply_url() {
        let payload = json!({
            "title": "QA Engineer",
            "company": "Acme",
            "description": "Test things.",
            "url": "https://acme.example/jobs/qa",
        });
        let posting = normalize(&payload, "boardly").unwrap();
        assert_eq!(posting.source_ref, "https://acme.example/jobs/qa");

        // No id and no URL at all: nothing stable to dedup on.
        let payload = json!({
            "title": "QA Engineer",
            "company": "Acme",
            "description": "Test things.",
        });
        assert!(normalize(&payload, "boardly").is_none());
    }

    #[test]
    fn location_type_inference_order() {
        assert_eq!(
            infer_location_type(Some("Remote (US)"), "desc"),
            LocationType::Remote
        );
        assert_eq!(
            infer_location_type(Some("Berlin"), "work fully remote"),
            LocationType::Remote
        );
        assert_eq!(
            infer_location_type(Some("Berlin"), "hybrid schedule, 2 days on site"),
            LocationType::Hybrid
        );
        assert_eq!(infer_location_type(Some("Berlin"), "desc"), LocationType::Onsite);
        assert_eq!(infer_location_type(None, "desc"), LocationType::Unknown);
    }

    #[test]
    fn employment_type_substring_table() {
        assert_eq!(
            infer_employment_type(Some("Full-time"), ""),
            EmploymentType::FullTime
        );
        assert_eq!(
            infer_employment_type(Some("permanent"), ""),
            EmploymentType::FullTime
        );
        assert_eq!(
            infer_employment_type(Some("Part-time"), ""),
            EmploymentType::PartTime
        );
        assert_eq!(
            infer_employment_type(Some("Freelance"), ""),
            EmploymentType::Contract
        );
        assert_eq!(
            infer_employment_type(None, "Marketing Intern"),
            EmploymentType::Internship
        );
        assert_eq!(infer_employment_type(None, "Engineer"), EmploymentType::Unknown);
    }

    #[test]
    fn experience_level_first_family_wins() {
        assert_eq!(infer_experience_level("Junior Developer"), ExperienceLevel::Entry);
        assert_eq!(
            infer_experience_level("Mid-level backend role"),
            ExperienceLevel::Mid
        );
        assert_eq!(
            infer_experience_level("Senior Platform Engineer"),
            ExperienceLevel::Senior
        );
        assert_eq!(
            infer_experience_level("Director of Engineering"),
            ExperienceLevel::Executive
        );
        // Both "senior" and "director" present: senior's family is checked first.
        assert_eq!(
            infer_experience_level("Senior Director of Data"),
            ExperienceLevel::Senior
        );
        assert_eq!(infer_experience_level("Developer"), ExperienceLevel::Unknown);
    }

    #[test]
    fn requirements_sliced_between_markers() {
        let description =
            "Great role. Requirements: 3 years of Rust, SQL. Benefits: free coffee.";
        let requirements = extract_requirements(description).unwrap();
        assert_eq!(requirements, "3 years of Rust, SQL.");

        // No end marker: slice runs to the end of the description.
        let description = "Qualifications: strong communication skills";
        assert_eq!(
            extract_requirements(description).unwrap(),
            "strong communication skills"
        );

        assert!(extract_requirements("Plain description.").is_none());
    }

    #[test]
    fn explicit_requirements_field_wins_over_extraction() {
        let mut payload = base_payload();
        payload["requirements"] = json!("Rust, Postgres");
        payload["description"] =
            json!("Requirements: something else entirely. Responsibilities: ship.");
        let posting = normalize(&payload, "boardly").unwrap();
        assert_eq!(posting.requirements.as_deref(), Some("Rust, Postgres"));
    }

    #[test]
    fn skills_split_required_and_preferred() {
        let mut payload = base_payload();
        payload["required_skills"] = json!(["SQL", "Python"]);
        payload["nice_to_have"] = json!([{"name": "Docker"}]);
        let posting = normalize(&payload, "boardly").unwrap();
        assert_eq!(posting.skills.len(), 3);
        assert!(posting.skills[0].required);
        assert!(posting.skills[1].required);
        assert!(!posting.skills[2].required);
        assert_eq!(posting.skills[2].name, "Docker");
    }
}
