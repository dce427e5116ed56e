//! Factor computation for candidate-to-posting scores.
//!
//! Five independent factors, each normalized to [0, 1] before weighting:
//! skills (required + preferred), experience fit, location fit, keyword
//! overlap, and salary fit. The weighted contributions sum to at most 100.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jobsift_core::{CandidateProfile, ExperienceLevel, JobPosting, LocationType, MatchResult};

#[derive(Debug, Clone, Copy)]
pub struct MatchWeights {
    pub required_skills: f64,
    pub preferred_skills: f64,
    pub experience: f64,
    pub location: f64,
    pub keywords: f64,
    pub salary: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            required_skills: 30.0,
            preferred_skills: 10.0,
            experience: 25.0,
            location: 15.0,
            keywords: 10.0,
            salary: 10.0,
        }
    }
}

/// Neutral salary factor until candidate salary expectations are modeled.
pub const SALARY_NEUTRAL_FACTOR: f64 = 0.5;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "your", "our", "are", "will", "have", "this", "that",
    "from", "about", "who", "what", "all", "can", "not", "but", "they", "their", "has", "was",
    "were", "been", "into", "over", "more", "than", "then", "these", "those", "each", "per",
    "via", "any", "its",
];

/// Total work-history tenure in years; open-ended entries run to `now`.
pub fn tenure_years(profile: &CandidateProfile, now: DateTime<Utc>) -> f64 {
    profile
        .work_history
        .iter()
        .map(|entry| {
            let end = entry.ended_at.unwrap_or(now);
            (end - entry.started_at).num_days().max(0) as f64 / 365.25
        })
        .sum()
}

/// Experience band table. Unknown level is neutral; candidates with no
/// history are handled by the caller before this lookup.
pub fn experience_factor(level: ExperienceLevel, years: f64) -> f64 {
    match level {
        ExperienceLevel::Unknown => 0.5,
        ExperienceLevel::Entry => {
            if years <= 2.0 {
                1.0
            } else if years <= 5.0 {
                0.6
            } else {
                0.3
            }
        }
        ExperienceLevel::Mid => {
            if (2.0..=7.0).contains(&years) {
                1.0
            } else if (1.0..2.0).contains(&years) || (7.0..=10.0).contains(&years) {
                0.6
            } else {
                0.3
            }
        }
        ExperienceLevel::Senior => {
            if years >= 5.0 {
                1.0
            } else if years >= 3.0 {
                0.6
            } else {
                0.2
            }
        }
        ExperienceLevel::Executive => {
            if years >= 8.0 {
                1.0
            } else if years >= 5.0 {
                0.6
            } else {
                0.2
            }
        }
    }
}

struct SkillMatch {
    required_fraction: f64,
    preferred_fraction: f64,
    matched: Vec<String>,
}

// Skill equality is case-insensitive and exact; an empty required (or
// preferred) set contributes zero for that term, never full credit.
fn skill_match(profile: &CandidateProfile, posting: &JobPosting) -> SkillMatch {
    let candidate: Vec<String> = profile.skills.iter().map(|s| s.to_lowercase()).collect();

    let mut matched = Vec::new();
    let (mut required_total, mut required_hit) = (0usize, 0usize);
    let (mut preferred_total, mut preferred_hit) = (0usize, 0usize);
    for skill in &posting.skills {
        let hit = candidate.iter().any(|c| *c == skill.name.to_lowercase());
        if skill.required {
            required_total += 1;
            required_hit += usize::from(hit);
        } else {
            preferred_total += 1;
            preferred_hit += usize::from(hit);
        }
        if hit {
            matched.push(skill.name.clone());
        }
    }

    let fraction = |hit: usize, total: usize| {
        if total == 0 {
            0.0
        } else {
            hit as f64 / total as f64
        }
    };
    SkillMatch {
        required_fraction: fraction(required_hit, required_total),
        preferred_fraction: fraction(preferred_hit, preferred_total),
        matched,
    }
}

fn location_factor(posting: &JobPosting) -> f64 {
    // Placeholder until candidate location preference is modeled: remote and
    // unspecified-location postings score full, everything else 0.7.
    match posting.location_type {
        LocationType::Remote => 1.0,
        _ if posting.location.is_none() => 1.0,
        _ => 0.7,
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(&word.as_str()))
        .collect()
}

fn candidate_keywords(profile: &CandidateProfile) -> HashSet<String> {
    let mut text = String::new();
    for entry in &profile.work_history {
        text.push_str(&entry.title);
        text.push(' ');
        if let Some(description) = &entry.description {
            text.push_str(description);
            text.push(' ');
        }
    }
    for skill in &profile.skills {
        text.push_str(skill);
        text.push(' ');
    }
    for item in &profile.education {
        text.push_str(item);
        text.push(' ');
    }
    tokenize(&text)
}

fn keyword_factor(profile: &CandidateProfile, posting: &JobPosting) -> f64 {
    let posting_words = tokenize(&format!("{} {}", posting.title, posting.description));
    if posting_words.is_empty() {
        return 0.0;
    }
    let candidate_words = candidate_keywords(profile);
    let matched = posting_words
        .iter()
        .filter(|word| {
            candidate_words
                .iter()
                .any(|c| c.contains(word.as_str()) || word.contains(c.as_str()))
        })
        .count();
    matched as f64 / posting_words.len() as f64
}

/// Score one posting against a profile. The matched-skill and reason lists
/// are derived independently of the numeric score for explainability.
pub fn score_posting(
    profile: &CandidateProfile,
    posting: JobPosting,
    now: DateTime<Utc>,
    weights: &MatchWeights,
) -> MatchResult {
    let skills = skill_match(profile, &posting);
    let experience = if profile.work_history.is_empty() {
        0.5
    } else {
        experience_factor(posting.experience_level, tenure_years(profile, now))
    };
    let location = location_factor(&posting);
    let keywords = keyword_factor(profile, &posting);

    let score = (skills.required_fraction * weights.required_skills
        + skills.preferred_fraction * weights.preferred_skills
        + experience * weights.experience
        + location * weights.location
        + keywords * weights.keywords
        + SALARY_NEUTRAL_FACTOR * weights.salary)
        .clamp(0.0, 100.0);

    let mut reasons = Vec::new();
    if !skills.matched.is_empty() {
        let shown = skills
            .matched
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if skills.matched.len() > 3 {
            reasons.push(format!(
                "Matches {} skills: {} +{} more",
                skills.matched.len(),
                shown,
                skills.matched.len() - 3
            ));
        } else {
            reasons.push(format!("Matches {} skills: {}", skills.matched.len(), shown));
        }
    }
    if posting.experience_level != ExperienceLevel::Unknown {
        reasons.push(format!("{} role", posting.experience_level.label()));
    }
    if posting.location_type == LocationType::Remote {
        reasons.push("Remote work".to_string());
    }

    MatchResult {
        posting,
        score,
        matched_skills: skills.matched,
        reasons,
    }
}
