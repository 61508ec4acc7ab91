//! Profile Fingerprinter — stable cache key over a fixed profile subset.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::models::profile::UserProfile;

/// The fixed field subset the fingerprint covers. Struct field order is
/// the serialization order, so the key is stable across calls.
#[derive(Serialize)]
struct FingerprintFields<'a> {
    name: &'a str,
    qualification: Option<&'a str>,
    skills: Option<&'a str>,
    location: Option<&'a str>,
    industry: Option<&'a str>,
    state: Option<&'a str>,
}

/// Derives the cache key for a profile: canonical JSON of the fixed field
/// subset, base64-encoded. Pure; identical inputs always produce identical
/// output.
///
/// Known limitation: `category` and `district` are NOT part of the key, so
/// a cached result can be stale with respect to fairness inputs — a
/// category change inside the validity window returns the previously
/// cached, non-fairness-adjusted list.
pub fn fingerprint(profile: &UserProfile) -> String {
    let fields = FingerprintFields {
        name: &profile.name,
        qualification: profile.qualification.as_deref(),
        skills: profile.skills.as_deref(),
        location: profile.preferred_location.as_deref(),
        industry: profile.preferred_industry.as_deref(),
        state: profile.state.as_deref(),
    };
    // Serialization of a plain struct of strings cannot fail.
    let json = serde_json::to_string(&fields).unwrap_or_default();
    STANDARD.encode(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ReservationCategory;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Asha".to_string(),
            qualification: Some("B.Tech".to_string()),
            skills: Some("programming".to_string()),
            preferred_location: Some("Bangalore".to_string()),
            preferred_industry: Some("Technology".to_string()),
            state: Some("Karnataka".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(fingerprint(&profile()), fingerprint(&profile()));
    }

    #[test]
    fn test_fingerprint_changes_with_skills() {
        let mut other = profile();
        other.skills = Some("finance".to_string());
        assert_ne!(fingerprint(&profile()), fingerprint(&other));
    }

    #[test]
    fn test_category_and_district_do_not_affect_fingerprint() {
        let mut other = profile();
        other.category = Some(ReservationCategory::Sc);
        other.district = Some("Pune Rural".to_string());
        assert_eq!(fingerprint(&profile()), fingerprint(&other));
    }

    #[test]
    fn test_missing_fields_differ_from_empty_fields() {
        let mut with_empty = profile();
        with_empty.skills = Some(String::new());
        let mut with_none = profile();
        with_none.skills = None;
        assert_ne!(fingerprint(&with_empty), fingerprint(&with_none));
    }
}
