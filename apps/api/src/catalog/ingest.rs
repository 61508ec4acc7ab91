//! Dataset ingestion — raw AICTE rows → canonical `Internship` records.
//!
//! All field derivation (paid flag, combined location, openings count,
//! sector) happens here, exactly once per record.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::{Catalog, Internship, JobType, Sector};

/// A row as it appears in the exported AICTE dataset. Field names mirror
/// the dataset headers, including the "Numer of Openings" typo.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInternship {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "Job Title")]
    pub job_title: String,
    #[serde(rename = "Job Type", default)]
    pub job_type: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Posted Date", default)]
    pub posted_date: String,
    #[serde(rename = "Cities", default)]
    pub cities: String,
    #[serde(rename = "States", default)]
    pub states: String,
    #[serde(rename = "Stipend", default)]
    pub stipend: String,
    #[serde(rename = "Start Date", default)]
    pub start_date: String,
    #[serde(rename = "Duration", default)]
    pub duration: String,
    #[serde(rename = "Numer of Openings", default)]
    pub openings: String,
    #[serde(rename = "Late date to apply", default)]
    pub apply_by: String,
    #[serde(default)]
    pub remaining_slots: Option<u32>,
}

/// Normalizes one raw row. `index` is the 1-based row position, used for
/// the synthetic id when the dataset carries none.
pub fn normalize(raw: RawInternship, index: usize) -> Internship {
    let id = raw.id.unwrap_or_else(|| format!("AICTE_{index}"));
    let is_paid = raw.stipend != "Unpaid";
    let location = format!("{}, {}", raw.cities, raw.states);
    let job_type = if raw.job_type == "Full Time" {
        JobType::FullTime
    } else {
        JobType::PartTime
    };
    let sector = Sector::from_title(&raw.job_title);
    let openings = raw.openings.trim().parse::<u32>().unwrap_or(1);

    Internship {
        id,
        title: raw.job_title,
        company: raw.company_name,
        city: raw.cities,
        state: raw.states,
        location,
        stipend: raw.stipend,
        is_paid,
        duration: raw.duration,
        start_date: raw.start_date,
        posted_date: raw.posted_date,
        apply_by: raw.apply_by,
        openings,
        remaining_slots: raw.remaining_slots,
        job_type,
        sector,
    }
}

impl Catalog {
    /// Loads the catalog from a JSON array of raw rows, falling back to the
    /// built-in sample set when no path is configured or the load fails.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No dataset path configured; using built-in sample records");
            return Catalog::new(sample_records());
        };

        match load_records(path) {
            Ok(records) => {
                info!("Loaded {} internships from {}", records.len(), path.display());
                Catalog::new(records)
            }
            Err(e) => {
                warn!(
                    "Failed to load dataset from {}: {e}; using built-in sample records",
                    path.display()
                );
                Catalog::new(sample_records())
            }
        }
    }
}

fn load_records(path: &Path) -> anyhow::Result<Vec<Internship>> {
    let text = std::fs::read_to_string(path)?;
    let raw: Vec<RawInternship> = serde_json::from_str(&text)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| normalize(r, i + 1))
        .collect())
}

/// The built-in sample dataset. Doubles as the development catalog and as
/// the fixed record set behind the last-resort fallback tier.
pub fn sample_records() -> Vec<Internship> {
    let rows = [
        (
            "IT & E-GOVERNANCE",
            "State Mission Management Unit, AMRUT Kerala",
            "Thiruvananthapuram",
            "Kerala",
            "10000 /month",
            "6 Months",
            "Immediately",
            "06-10-2023",
            "12-11-2023",
            "1",
        ),
        (
            "CIVIL ENGINEER (INTERN)",
            "Thrissur Municipal Corporation",
            "Thrissur",
            "Kerala",
            "10000 /month",
            "6 Months",
            "Immediately",
            "18-06-2024",
            "25-01-2025",
            "1",
        ),
        (
            "DATA SCIENCE INTERN",
            "Tech Solutions India",
            "Bangalore",
            "Karnataka",
            "15000 /month",
            "12 Months",
            "Immediately",
            "01-01-2025",
            "15-02-2025",
            "5",
        ),
        (
            "FINANCE INTERN",
            "Kudumbashree Mission",
            "Kochi",
            "Kerala",
            "8000 /month",
            "3 Months",
            "01-03-2025",
            "10-01-2025",
            "20-02-2025",
            "2",
        ),
        (
            "SOCIAL MEDIA INTERN",
            "District Administration Pune",
            "Pune",
            "Maharashtra",
            "Unpaid",
            "4 Months",
            "Immediately",
            "05-12-2024",
            "10-01-2025",
            "3",
        ),
        (
            "URBAN PLANNING ASSISTANT",
            "Smart City Mission Bhopal",
            "Bhopal",
            "Madhya Pradesh",
            "12000 /month",
            "6 Months",
            "15-02-2025",
            "20-12-2024",
            "30-01-2025",
            "2",
        ),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            normalize(
                RawInternship {
                    id: None,
                    job_title: row.0.to_string(),
                    job_type: "Full Time".to_string(),
                    company_name: row.1.to_string(),
                    posted_date: row.7.to_string(),
                    cities: row.2.to_string(),
                    states: row.3.to_string(),
                    stipend: row.4.to_string(),
                    start_date: row.6.to_string(),
                    duration: row.5.to_string(),
                    openings: row.9.to_string(),
                    apply_by: row.8.to_string(),
                    remaining_slots: None,
                },
                i + 1,
            )
        })
        .collect()
}

/// Minimal paid full-time record for unit tests across the crate.
#[cfg(test)]
pub fn test_internship(id: &str, title: &str, city: &str, state: &str) -> Internship {
    normalize(
        RawInternship {
            id: Some(id.to_string()),
            job_title: title.to_string(),
            job_type: "Full Time".to_string(),
            company_name: "Test Co".to_string(),
            posted_date: "01-01-2025".to_string(),
            cities: city.to_string(),
            states: state.to_string(),
            stipend: "10000 /month".to_string(),
            start_date: "Immediately".to_string(),
            duration: "6 Months".to_string(),
            openings: "1".to_string(),
            apply_by: "01-02-2025".to_string(),
            remaining_slots: None,
        },
        1,
    )
}
