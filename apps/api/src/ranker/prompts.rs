//! Prompt construction for the external ranker.

use crate::catalog::Internship;
use crate::models::profile::UserProfile;

use super::PROMPT_CANDIDATE_LIMIT;

/// Fairness clause appended when the fairness toggle is on. Kept modest on
/// purpose: the ranker adjusts scores, it does not reorder wholesale.
const FAIRNESS_CLAUSE: &str = "\
Fairness adjustment: apply a modest score boost (5-20%) to internships that \
improve access for candidates from underrepresented categories (SC/ST/OBC) or \
rural regions, and a modest penalty to internships that are nearly full \
(low remaining capacity). Do not let the adjustment exceed 20% in either \
direction.";

/// Builds the ranking instruction: profile summary, a numbered list of at
/// most [`PROMPT_CANDIDATE_LIMIT`] candidates, and the exact response
/// schema. `internship_index` in the response refers to this numbering.
pub fn ranking_prompt(profile: &UserProfile, candidates: &[Internship], fairness: bool) -> String {
    let user_context = format!(
        "User Profile:\n\
         - Name: {}\n\
         - Education: {} in {}\n\
         - Skills: {}\n\
         - Location Preference: {}\n\
         - Industry Interest: {}\n\
         - State: {}\n\
         - Specialization: {}",
        profile.name,
        profile.qualification.as_deref().unwrap_or("Not specified"),
        profile.course.as_deref().unwrap_or("General"),
        profile.skills.as_deref().unwrap_or("Not specified"),
        profile.preferred_location.as_deref().unwrap_or("Any"),
        profile.preferred_industry.as_deref().unwrap_or("Open to all"),
        profile.state.as_deref().unwrap_or("Not specified"),
        profile.specialization.as_deref().unwrap_or("General"),
    );

    let listed = candidates.len().min(PROMPT_CANDIDATE_LIMIT);
    let internship_summary = candidates
        .iter()
        .take(PROMPT_CANDIDATE_LIMIT)
        .enumerate()
        .map(|(i, internship)| {
            format!(
                "{}. {} at {} ({}, {}) - Stipend: {}, Duration: {}",
                i + 1,
                internship.title,
                internship.company,
                internship.city,
                internship.state,
                internship.stipend,
                internship.duration
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let fairness_section = if fairness {
        format!("\n{FAIRNESS_CLAUSE}\n")
    } else {
        String::new()
    };

    format!(
        r#"You are an AI career counselor specializing in internship recommendations for Indian students.

{user_context}

Available Internships (showing top {listed}):
{internship_summary}

Task: Analyze the user's profile and rank the top 10 most suitable internships from the list above. Consider:

1. Field/Domain Match: How well does the internship align with the user's education and skills?
2. Location Preference: Geographic compatibility with user's preference
3. Career Growth: Relevance to user's career aspirations
4. Skill Development: Opportunity to develop relevant skills
5. Company Reputation: Quality of work environment and learning
{fairness_section}
Provide response in this EXACT JSON format:
{{
  "recommendations": [
    {{
      "rank": 1,
      "internship_index": 5,
      "match_score": 95,
      "reasoning": "Perfect match because...",
      "key_benefits": ["Skill development in relevant area", "Good location match"]
    }}
  ]
}}

Ensure internship_index corresponds to the number in the list above. Provide exactly 10 recommendations, ranked from best (1) to good (10)."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ingest::test_internship;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Asha".to_string(),
            qualification: Some("B.Tech".to_string()),
            skills: Some("programming".to_string()),
            preferred_location: Some("Bangalore".to_string()),
            state: Some("Karnataka".to_string()),
            ..Default::default()
        }
    }

    fn candidates(n: usize) -> Vec<Internship> {
        (0..n)
            .map(|i| test_internship(&format!("C{i}"), "IT Intern", "Bangalore", "Karnataka"))
            .collect()
    }

    #[test]
    fn test_prompt_lists_at_most_twenty_candidates() {
        let prompt = ranking_prompt(&profile(), &candidates(30), false);
        assert!(prompt.contains("showing top 20"));
        assert!(prompt.contains("\n20. "));
        assert!(!prompt.contains("\n21. "));
    }

    #[test]
    fn test_prompt_contains_profile_fields() {
        let prompt = ranking_prompt(&profile(), &candidates(2), false);
        assert!(prompt.contains("Name: Asha"));
        assert!(prompt.contains("B.Tech"));
        assert!(prompt.contains("Location Preference: Bangalore"));
    }

    #[test]
    fn test_prompt_defaults_for_missing_fields() {
        let prompt = ranking_prompt(&UserProfile::default(), &candidates(1), false);
        assert!(prompt.contains("Skills: Not specified"));
        assert!(prompt.contains("Industry Interest: Open to all"));
    }

    #[test]
    fn test_fairness_clause_only_when_enabled() {
        let with = ranking_prompt(&profile(), &candidates(2), true);
        let without = ranking_prompt(&profile(), &candidates(2), false);
        assert!(with.contains("Fairness adjustment"));
        assert!(!without.contains("Fairness adjustment"));
    }

    #[test]
    fn test_prompt_pins_response_schema() {
        let prompt = ranking_prompt(&profile(), &candidates(2), false);
        assert!(prompt.contains(r#""internship_index""#));
        assert!(prompt.contains("EXACT JSON format"));
    }
}
