//! Catalog Store — canonical internship records and their query surface.
//!
//! Records are normalized ONCE at ingestion (see `ingest`): paid flag,
//! combined location string, openings count, and sector category are all
//! derived up front so scoring never touches raw dataset fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod ingest;

pub use ingest::sample_records;

/// Sector category derived from the job title.
///
/// Deliberately simple keyword heuristic, not a precision classifier:
/// the first matching keyword group wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Technology,
    Finance,
    Engineering,
    SocialWork,
    UrbanPlanning,
    General,
}

impl Sector {
    pub fn from_title(title: &str) -> Self {
        let title = title.to_lowercase();
        if title.contains("it") || title.contains("software") || title.contains("data") {
            Sector::Technology
        } else if title.contains("finance") {
            Sector::Finance
        } else if title.contains("engineer") {
            Sector::Engineering
        } else if title.contains("social") {
            Sector::SocialWork
        } else if title.contains("urban") {
            Sector::UrbanPlanning
        } else {
            Sector::General
        }
    }

    /// Lowercase label used by the industry cross-containment match.
    pub fn match_label(&self) -> &'static str {
        match self {
            Sector::Technology => "technology",
            Sector::Finance => "finance",
            Sector::Engineering => "engineering",
            Sector::SocialWork => "social work",
            Sector::UrbanPlanning => "urban planning",
            Sector::General => "general",
        }
    }

    /// Display label used by the legacy-format projection.
    pub fn legacy_label(&self) -> &'static str {
        match self {
            Sector::Technology => "Information Technology",
            Sector::Finance => "Banking & Finance",
            Sector::Engineering => "Engineering",
            Sector::SocialWork => "Social Work",
            Sector::UrbanPlanning => "Urban Planning",
            Sector::General => "General",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "full-time")]
    FullTime,
    #[serde(rename = "part-time")]
    PartTime,
}

/// Canonical internship record. Immutable once loaded; owned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Internship {
    pub id: String,
    pub title: String,
    pub company: String,
    pub city: String,
    pub state: String,
    /// "City, State" — kept combined because both the location filter and
    /// the location-preference score match against it.
    pub location: String,
    /// Raw stipend string; "Unpaid" is the sentinel, otherwise "<amount> /month".
    pub stipend: String,
    pub is_paid: bool,
    pub duration: String,
    pub start_date: String,
    pub posted_date: String,
    pub apply_by: String,
    pub openings: u32,
    /// Remaining capacity when the dataset carries it. Drives the
    /// capacity penalty; absent means "unknown", never "zero".
    pub remaining_slots: Option<u32>,
    pub job_type: JobType,
    pub sector: Sector,
}

impl Internship {
    /// Remaining-to-total slot ratio, when both sides are known and sane.
    pub fn capacity_ratio(&self) -> Option<f64> {
        let remaining = self.remaining_slots?;
        if self.openings == 0 {
            return None;
        }
        Some(remaining as f64 / self.openings as f64)
    }

    pub fn is_immediate_start(&self) -> bool {
        self.start_date.to_lowercase().contains("immediately")
    }
}

/// Filter criteria for catalog queries. All fields are optional and ANDed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub location: Option<String>,
    pub state: Option<String>,
    pub paid: Option<bool>,
    pub job_type: Option<JobType>,
    pub search: Option<String>,
}

/// Dataset statistics for the status/overview endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub paid: usize,
    pub unpaid: usize,
    pub full_time: usize,
    pub part_time: usize,
    pub states: usize,
    pub companies: usize,
    pub avg_stipend: u32,
}

/// Read-only store of internship records, shared across requests.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<Internship>,
}

impl Catalog {
    pub fn new(records: Vec<Internship>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Internship> {
        self.records.iter().find(|i| i.id == id)
    }

    /// Returns the records matching `filter`. Records with a known
    /// remaining-slot count of zero are excluded — they cannot be applied to.
    pub fn filter(&self, filter: &CatalogFilter) -> Vec<Internship> {
        self.records
            .iter()
            .filter(|i| matches!(i.remaining_slots, None | Some(1..)))
            .filter(|i| match &filter.location {
                Some(loc) => i.location.to_lowercase().contains(&loc.to_lowercase()),
                None => true,
            })
            .filter(|i| match &filter.state {
                Some(state) => i.state.eq_ignore_ascii_case(state),
                None => true,
            })
            .filter(|i| match filter.paid {
                Some(paid) => i.is_paid == paid,
                None => true,
            })
            .filter(|i| match filter.job_type {
                Some(jt) => i.job_type == jt,
                None => true,
            })
            .filter(|i| match &filter.search {
                Some(term) => {
                    let term = term.to_lowercase();
                    i.title.to_lowercase().contains(&term)
                        || i.company.to_lowercase().contains(&term)
                        || i.location.to_lowercase().contains(&term)
                }
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Fixed small record set used by the last-resort fallback tier.
    pub fn sample_fallback(&self) -> Vec<Internship> {
        sample_records()
    }

    pub fn stats(&self) -> CatalogStats {
        let total = self.records.len();
        let paid = self.records.iter().filter(|i| i.is_paid).count();
        let full_time = self
            .records
            .iter()
            .filter(|i| i.job_type == JobType::FullTime)
            .count();

        let mut states: Vec<&str> = self.records.iter().map(|i| i.state.as_str()).collect();
        states.sort_unstable();
        states.dedup();

        let mut companies: Vec<&str> = self.records.iter().map(|i| i.company.as_str()).collect();
        companies.sort_unstable();
        companies.dedup();

        CatalogStats {
            total,
            paid,
            unpaid: total - paid,
            full_time,
            part_time: total - full_time,
            states: states.len(),
            companies: companies.len(),
            avg_stipend: average_stipend(&self.records),
        }
    }
}

/// Mean of the leading integer in each paid stipend string ("10000 /month").
fn average_stipend(records: &[Internship]) -> u32 {
    let amounts: Vec<u32> = records
        .iter()
        .filter(|i| i.is_paid)
        .filter_map(|i| leading_integer(&i.stipend))
        .collect();
    if amounts.is_empty() {
        return 0;
    }
    let sum: u64 = amounts.iter().map(|&a| a as u64).sum();
    (sum as f64 / amounts.len() as f64).round() as u32
}

fn leading_integer(s: &str) -> Option<u32> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Projection of a canonical record into the legacy portal format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyInternship {
    pub id: String,
    pub role: String,
    pub company: String,
    pub location: String,
    pub state: String,
    pub district: String,
    pub sector: String,
    pub area: String,
    pub opportunities: u32,
    pub description: String,
    pub qualifications: String,
    pub skills: String,
    pub salary: String,
    pub duration: String,
    #[serde(rename = "type")]
    pub pay_type: String,
    pub preferred_gender: String,
    pub company_logo: String,
    pub applied: u32,
    pub created_at: DateTime<Utc>,
}

impl LegacyInternship {
    pub fn from_internship(internship: &Internship) -> Self {
        let logo_text: String = internship.company.chars().take(3).collect();
        Self {
            id: internship.id.clone(),
            role: internship.title.clone(),
            company: internship.company.clone(),
            location: internship.location.clone(),
            state: internship.state.clone(),
            district: internship.city.clone(),
            sector: internship.sector.legacy_label().to_string(),
            area: internship.title.clone(),
            opportunities: internship.openings,
            description: format!("{} position at {}", internship.title, internship.company),
            qualifications: "As per job requirements".to_string(),
            skills: skills_from_title(&internship.title),
            salary: internship.stipend.clone(),
            duration: internship.duration.clone(),
            pay_type: if internship.is_paid { "paid" } else { "unpaid" }.to_string(),
            preferred_gender: "Any".to_string(),
            company_logo: format!(
                "https://via.placeholder.com/100x100/2d4f93/ffffff?text={logo_text}"
            ),
            applied: 0,
            created_at: Utc::now(),
        }
    }
}

/// Keyword → skill-list table for the legacy projection. Same substring
/// heuristic family as `Sector::from_title`.
const TITLE_SKILLS: &[(&str, &[&str])] = &[
    ("it", &["Programming", "Software Development"]),
    ("software", &["Programming", "Software Development"]),
    ("data", &["Data Analysis", "Database Management"]),
    ("finance", &["Financial Analysis", "Accounting"]),
    ("civil", &["Civil Engineering", "Construction Management"]),
    ("social", &["Community Development", "Social Work"]),
    ("urban", &["Urban Planning", "Project Management"]),
    ("media", &["Communication", "Social Media"]),
];

fn skills_from_title(title: &str) -> String {
    let title = title.to_lowercase();
    let mut skills: Vec<&str> = Vec::new();
    for (keyword, skill_set) in TITLE_SKILLS {
        if title.contains(keyword) {
            for skill in *skill_set {
                if !skills.contains(skill) {
                    skills.push(skill);
                }
            }
        }
    }
    if skills.is_empty() {
        "Professional Skills".to_string()
    } else {
        skills.join(", ")
    }
}
