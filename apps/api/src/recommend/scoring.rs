//! Compatibility Scorer — additive rule-based scoring of a profile against
//! an internship, plus the capacity penalty and fairness adjustments.
//!
//! The keyword heuristics live in `const` lookup tables rather than
//! scattered conditionals. They are deliberately simple substring checks,
//! not a classifier; tests pin the table semantics.

use crate::catalog::Internship;
use crate::models::profile::{ReservationCategory, UserProfile};

const BASE_SCORE: u32 = 50;
const MAX_SCORE: u32 = 100;

/// Education match: the first qualification keyword whose title-keyword
/// group hits wins +25. A qualification that matches nothing still earns
/// +10 partial credit. Order matters: "Computer Science Engineering"
/// resolves through the "engineering" row first.
const EDUCATION_TITLE_KEYWORDS: &[(&str, &[&str])] = &[
    ("engineering", &["engineer", "civil", "it"]),
    ("computer", &["it"]),
    ("finance", &["finance"]),
    ("social", &["social"]),
];

/// Skill-keyword ↔ title-keyword pairs, +15 per hit, capped at +20 total.
const SKILL_TITLE_KEYWORDS: &[(&str, &str)] = &[
    ("programming", "it"),
    ("finance", "finance"),
    ("social", "social"),
    ("communication", "media"),
    ("data", "data"),
];

/// Rule-based compatibility score in [0, 100].
///
/// Base 50, plus education (+25/+10), skills (≤+20), location preference
/// (+20/+10/0), state (+10), paid (+10), industry/sector (+15), clamped
/// to 100. Missing profile fields contribute nothing rather than erroring.
pub fn compatibility_score(profile: &UserProfile, internship: &Internship) -> u32 {
    let mut score = BASE_SCORE;

    let title = internship.title.to_lowercase();
    let location = internship.location.to_lowercase();

    // Education matching (25 points, 10 partial)
    if let Some(qualification) = non_blank(&profile.qualification) {
        let education = qualification.to_lowercase();
        let direct = EDUCATION_TITLE_KEYWORDS.iter().find(|(edu_kw, title_kws)| {
            education.contains(edu_kw) && title_kws.iter().any(|kw| title.contains(kw))
        });
        score += if direct.is_some() { 25 } else { 10 };
    }

    // Skills matching (up to 20 points)
    if let Some(skills) = non_blank(&profile.skills) {
        let skills = skills.to_lowercase();
        let skill_points: u32 = SKILL_TITLE_KEYWORDS
            .iter()
            .filter(|(skill_kw, title_kw)| skills.contains(skill_kw) && title.contains(title_kw))
            .map(|_| 15)
            .sum();
        score += skill_points.min(20);
    }

    // Location preference (20 points, 10 neutral when none stated)
    if profile.has_location_preference() {
        let preferred = profile.preferred_location.as_deref().unwrap_or_default();
        if location.contains(&preferred.to_lowercase()) {
            score += 20;
        }
    } else {
        score += 10;
    }

    // State matching (10 points)
    if let Some(state) = non_blank(&profile.state) {
        if internship
            .state
            .to_lowercase()
            .contains(&state.to_lowercase())
        {
            score += 10;
        }
    }

    // Paid internship preference (10 points)
    if internship.is_paid {
        score += 10;
    }

    // Industry/sector matching (15 points)
    if profile.has_industry_preference() {
        let industry = profile
            .preferred_industry
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        let sector = internship.sector.match_label();
        if sector.contains(&industry) || industry.contains(sector) {
            score += 15;
        }
    }

    score.min(MAX_SCORE)
}

/// Capacity penalty: a remaining-to-total ratio below 0.2 multiplies the
/// score by 0.85, floored. Unknown capacity leaves the score untouched.
pub fn capacity_penalty(score: u32, internship: &Internship) -> u32 {
    match internship.capacity_ratio() {
        Some(ratio) if ratio < 0.2 => (score as f64 * 0.85).floor() as u32,
        _ => score,
    }
}

/// Fairness boost: +20 for SC/ST, +10 for OBC, and +10 more when the
/// candidate's district reads rural or the internship has no resolvable
/// city while its state is known. Clamped to 100.
pub fn fairness_boost(score: u32, profile: &UserProfile, internship: &Internship) -> u32 {
    let mut boost = 0;

    match profile.category {
        Some(ReservationCategory::Sc) | Some(ReservationCategory::St) => boost += 20,
        Some(ReservationCategory::Obc) => boost += 10,
        _ => {}
    }

    let rural_district = profile
        .district
        .as_deref()
        .map(|d| d.to_lowercase().contains("rural"))
        .unwrap_or(false);
    let unresolvable_city =
        internship.city.trim().is_empty() && !internship.state.trim().is_empty();
    if rural_district || unresolvable_city {
        boost += 10;
    }

    (score + boost).min(MAX_SCORE)
}

/// Full adjusted score. The order is fixed: base score, then capacity
/// penalty, then fairness boost, then the final clamp. Reordering changes
/// boundary scores.
pub fn adjusted_score(profile: &UserProfile, internship: &Internship, fairness: bool) -> u32 {
    let base = compatibility_score(profile, internship);
    let after_capacity = capacity_penalty(base, internship);
    let adjusted = if fairness {
        fairness_boost(after_capacity, profile, internship)
    } else {
        after_capacity
    };
    adjusted.min(MAX_SCORE)
}

/// Short natural-language reasoning for a scored match: tier phrase by
/// threshold, optional stipend and location notes, comma-joined.
pub fn reasoning_text(profile: &UserProfile, internship: &Internship, score: u32) -> String {
    let mut reasons = Vec::new();

    if score >= 80 {
        reasons.push("Excellent match for your profile".to_string());
    } else if score >= 70 {
        reasons.push("Good alignment with your background".to_string());
    } else {
        reasons.push("Potential growth opportunity".to_string());
    }

    if internship.is_paid {
        reasons.push(format!("offers {} stipend", internship.stipend));
    }

    if profile.has_location_preference() {
        let preferred = profile.preferred_location.as_deref().unwrap_or_default();
        if internship
            .location
            .to_lowercase()
            .contains(&preferred.to_lowercase())
        {
            reasons.push("matches your location preference".to_string());
        }
    }

    format!("{}.", reasons.join(", "))
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}
