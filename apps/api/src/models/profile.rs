use serde::{Deserialize, Serialize};

/// Affirmative-action reservation category, as captured during registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationCategory {
    General,
    #[serde(rename = "OBC")]
    Obc,
    #[serde(rename = "SC")]
    Sc,
    #[serde(rename = "ST")]
    St,
}

/// A candidate profile as submitted with a recommendation request.
///
/// Everything except `name` is optional: missing fields contribute neutral
/// scores rather than errors. `skills` is free text, matched with
/// comma-token heuristics by the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub preferred_location: Option<String>,
    #[serde(default)]
    pub preferred_industry: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub category: Option<ReservationCategory>,
}

impl UserProfile {
    /// True when the profile states a concrete location preference.
    /// The UI uses "Any" as its no-preference sentinel.
    pub fn has_location_preference(&self) -> bool {
        matches!(&self.preferred_location, Some(l) if !l.trim().is_empty() && l != "Any")
    }

    /// True when the profile states a concrete industry preference.
    /// "Open to all" is the no-preference sentinel.
    pub fn has_industry_preference(&self) -> bool {
        matches!(&self.preferred_industry, Some(i) if !i.trim().is_empty() && i != "Open to all")
    }
}
