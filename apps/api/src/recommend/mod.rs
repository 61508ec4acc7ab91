//! Recommendation pipeline: fingerprinting, rule-based scoring, and the
//! orchestrator that arbitrates between the external ranker and the local
//! scorer.

use serde::{Deserialize, Serialize};

use crate::catalog::{Internship, LegacyInternship};

pub mod engine;
pub mod fingerprint;
pub mod handlers;
pub mod scoring;

/// A fully enriched recommendation as returned to callers. Created per
/// request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecommendation {
    #[serde(flatten)]
    pub internship: Internship,
    /// Locally computed rule score. Absent when the external ranker
    /// produced the ordering.
    pub compatibility_score: Option<u32>,
    pub ai_match_score: u32,
    pub ai_reasoning: String,
    pub ai_benefits: Vec<String>,
    /// 1-based position in the returned list.
    pub ai_rank: u32,
    pub recommended_by_ai: bool,
    pub application_deadline: String,
    pub openings_available: u32,
    pub is_immediate_start: bool,
    pub converted_format: LegacyInternship,
}
