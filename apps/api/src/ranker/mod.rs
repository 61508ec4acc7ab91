//! External Ranker Adapter — the single point of contact with the local
//! text-generation backend (Ollama-style API).
//!
//! ARCHITECTURAL RULE: every fault here stays here. The adapter returns
//! `RankerError` values; the orchestrator converts any of them into the
//! rule-based path. Nothing in this module may panic on bad remote output.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Internship;
use crate::models::profile::UserProfile;

pub mod prompts;

/// Probe timeout for the startup health check.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// How many candidates the prompt lists.
pub const PROMPT_CANDIDATE_LIMIT: usize = 20;
/// Maximum recommendations accepted back from the ranker.
pub const MAX_RESULTS: usize = 10;

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 2000;
const TOP_P: f32 = 0.9;
const REPEAT_PENALTY: f32 = 1.1;

#[derive(Debug, Error)]
pub enum RankerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ranker API returned status {status}")]
    Api { status: u16 },

    #[error("no JSON object found in ranker output")]
    NoJson,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("ranker returned no usable recommendations")]
    Empty,
}

/// A single ranked pick, before orchestrator enrichment. Produced by the
/// remote ranker or by the rule-based path.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub internship: Internship,
    pub rank: u32,
    pub match_score: u32,
    pub reasoning: String,
    /// Benefits named by the ranker; the rule path leaves this empty and
    /// lets enrichment derive them.
    pub benefits: Vec<String>,
    pub recommended_by_ai: bool,
    /// Locally computed score. `None` on the remote path.
    pub compatibility_score: Option<u32>,
}

/// Ranking capability. The engine holds one of these and decides per
/// request whether to use it or fall back to the local scorer.
#[async_trait]
pub trait Ranker: Send + Sync {
    /// Cheap reachability check, run once at engine initialization.
    async fn probe(&self) -> bool;

    /// Ranks `candidates` (≤50) for `profile`. Returns at most
    /// [`MAX_RESULTS`] picks or an error; never panics on remote garbage.
    async fn rank(
        &self,
        profile: &UserProfile,
        candidates: &[Internship],
        fairness: bool,
    ) -> Result<Vec<RankedCandidate>, RankerError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
    top_p: f32,
    repeat_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct RankedResponse {
    #[serde(default)]
    recommendations: Vec<RankedEntry>,
}

#[derive(Debug, Deserialize)]
struct RankedEntry {
    rank: u32,
    /// 1-based index into the numbered candidate list in the prompt.
    internship_index: usize,
    match_score: u32,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    key_benefits: Vec<String>,
}

/// Ranker backed by an Ollama-compatible `/api/generate` endpoint.
pub struct OllamaRanker {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaRanker {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl Ranker for OllamaRanker {
    async fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Ranker reachable at {}", self.base_url);
                true
            }
            Ok(response) => {
                warn!("Ranker probe returned status {}", response.status());
                false
            }
            Err(e) => {
                warn!("Ranker probe failed: {e}");
                false
            }
        }
    }

    async fn rank(
        &self,
        profile: &UserProfile,
        candidates: &[Internship],
        fairness: bool,
    ) -> Result<Vec<RankedCandidate>, RankerError> {
        let prompt = prompts::ranking_prompt(profile, candidates, fairness);

        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_TOKENS,
                top_p: TOP_P,
                repeat_penalty: REPEAT_PENALTY,
            },
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RankerError::Api {
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = response.json().await?;
        let picks = parse_ranked_response(&body.response, candidates)?;

        debug!("Ranker produced {} picks", picks.len());
        Ok(picks)
    }
}

/// Parses the completion text back into ranked picks.
///
/// Contract: the completion embeds one JSON object of shape
/// `{"recommendations": [{rank, internship_index, match_score, reasoning,
/// key_benefits}]}`. `internship_index` is 1-based into the prompt's
/// numbered list; out-of-range entries are dropped.
pub fn parse_ranked_response(
    text: &str,
    candidates: &[Internship],
) -> Result<Vec<RankedCandidate>, RankerError> {
    let json = extract_json_object(text).ok_or(RankerError::NoJson)?;
    let parsed: RankedResponse = serde_json::from_str(json)?;

    let picks: Vec<RankedCandidate> = parsed
        .recommendations
        .into_iter()
        .filter_map(|entry| {
            if entry.internship_index == 0 || entry.internship_index > candidates.len() {
                warn!(
                    "Dropping ranked entry with out-of-range index {}",
                    entry.internship_index
                );
                return None;
            }
            let internship = candidates[entry.internship_index - 1].clone();
            Some(RankedCandidate {
                internship,
                rank: entry.rank,
                match_score: entry.match_score.min(100),
                reasoning: entry.reasoning,
                benefits: entry.key_benefits,
                recommended_by_ai: true,
                compatibility_score: None,
            })
        })
        .take(MAX_RESULTS)
        .collect();

    if picks.is_empty() {
        return Err(RankerError::Empty);
    }
    Ok(picks)
}

/// Finds the first balanced JSON object substring, tracking string literals
/// and escapes so braces inside strings do not confuse the depth count.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ingest::test_internship;

    fn candidates(n: usize) -> Vec<Internship> {
        (0..n)
            .map(|i| test_internship(&format!("C{i}"), "IT Intern", "Bangalore", "Karnataka"))
            .collect()
    }

    #[test]
    fn test_extract_json_object_plain() {
        assert_eq!(extract_json_object(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_json_object_with_surrounding_prose() {
        let text = "Here are your results:\n{\"a\": 1}\nHope that helps!";
        assert_eq!(extract_json_object(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_object_nested() {
        let text = r#"prefix {"a": {"b": 2}} suffix"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 2}}"#));
    }

    #[test]
    fn test_extract_json_object_braces_inside_strings() {
        let text = r#"{"a": "}{", "b": 1}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_extract_json_object_none_for_plain_text() {
        assert_eq!(extract_json_object("not json"), None);
    }

    #[test]
    fn test_extract_json_object_none_for_unbalanced() {
        assert_eq!(extract_json_object(r#"{"a": 1"#), None);
    }

    #[test]
    fn test_parse_maps_one_based_indices() {
        let text = r#"{"recommendations": [
            {"rank": 1, "internship_index": 2, "match_score": 92,
             "reasoning": "strong fit", "key_benefits": ["growth"]}
        ]}"#;
        let picks = parse_ranked_response(text, &candidates(3)).unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].internship.id, "C1");
        assert_eq!(picks[0].match_score, 92);
        assert_eq!(picks[0].benefits, vec!["growth".to_string()]);
        assert!(picks[0].recommended_by_ai);
    }

    #[test]
    fn test_parse_drops_out_of_range_indices() {
        let text = r#"{"recommendations": [
            {"rank": 1, "internship_index": 0, "match_score": 90, "reasoning": ""},
            {"rank": 2, "internship_index": 99, "match_score": 85, "reasoning": ""},
            {"rank": 3, "internship_index": 1, "match_score": 80, "reasoning": ""}
        ]}"#;
        let picks = parse_ranked_response(text, &candidates(2)).unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].internship.id, "C0");
    }

    #[test]
    fn test_parse_caps_results_at_ten() {
        let entries: Vec<String> = (1..=15)
            .map(|i| {
                format!(
                    r#"{{"rank": {i}, "internship_index": {i}, "match_score": 90, "reasoning": ""}}"#
                )
            })
            .collect();
        let text = format!(r#"{{"recommendations": [{}]}}"#, entries.join(","));
        let picks = parse_ranked_response(&text, &candidates(15)).unwrap();
        assert_eq!(picks.len(), MAX_RESULTS);
    }

    #[test]
    fn test_parse_failure_on_plain_text() {
        assert!(matches!(
            parse_ranked_response("not json", &candidates(3)),
            Err(RankerError::NoJson)
        ));
    }

    #[test]
    fn test_parse_failure_when_all_entries_dropped() {
        let text = r#"{"recommendations": [
            {"rank": 1, "internship_index": 50, "match_score": 90, "reasoning": ""}
        ]}"#;
        assert!(matches!(
            parse_ranked_response(text, &candidates(2)),
            Err(RankerError::Empty)
        ));
    }

    #[test]
    fn test_parse_clamps_match_score() {
        let text = r#"{"recommendations": [
            {"rank": 1, "internship_index": 1, "match_score": 250, "reasoning": ""}
        ]}"#;
        let picks = parse_ranked_response(text, &candidates(1)).unwrap();
        assert_eq!(picks[0].match_score, 100);
    }
}
