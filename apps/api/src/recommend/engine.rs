//! Recommendation Orchestrator — chooses between the external ranker and
//! the local rule scorer, enriches results, and caches the last answer.
//!
//! `generate_recommendations` is total: it degrades through three tiers
//! (external ranker → rule-based scorer → static fallback set) and never
//! surfaces an error to the caller.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, CatalogFilter, Internship, LegacyInternship};
use crate::models::profile::UserProfile;
use crate::ranker::{RankedCandidate, Ranker, MAX_RESULTS};
use crate::recommend::fingerprint::fingerprint;
use crate::recommend::scoring::{adjusted_score, reasoning_text};
use crate::recommend::ScoredRecommendation;

/// Candidate-set bound before ranking. Exists to keep the external-ranking
/// prompt small; the rule-based path respects it too for consistency.
const CANDIDATE_LIMIT: usize = 50;
/// Size of the static fallback list.
const FALLBACK_COUNT: usize = 5;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a cached result stays valid.
    pub cache_validity: Duration,
    /// Global fairness toggle; a per-call override wins when present.
    pub fairness_boost: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_validity: Duration::from_secs(5 * 60),
            fairness_boost: false,
        }
    }
}

/// Single cache slot. A new computation unconditionally overwrites it;
/// concurrent requests are last-write-wins.
struct CacheEntry {
    fingerprint: String,
    recommendations: Vec<ScoredRecommendation>,
    created_at: Instant,
}

#[derive(Default)]
struct EngineState {
    initialized: bool,
    ranker_available: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub has_cache: bool,
    pub age_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub initialized: bool,
    pub ranker_connected: bool,
    pub catalog_size: usize,
    pub cache: CacheStatus,
}

/// The recommendation engine. One explicit instance per process, carried
/// in `AppState`; holds the catalog, the ranker capability, and the single
/// cache slot.
pub struct RecommendationEngine {
    config: EngineConfig,
    catalog: Arc<Catalog>,
    ranker: Arc<dyn Ranker>,
    cache: Mutex<Option<CacheEntry>>,
    state: Mutex<EngineState>,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<Catalog>, ranker: Arc<dyn Ranker>, config: EngineConfig) -> Self {
        Self {
            config,
            catalog,
            ranker,
            cache: Mutex::new(None),
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Lazily initializes engine state on first use. Idempotent; a race
    /// between first callers at worst probes the ranker twice.
    pub async fn ensure_initialized(&self) {
        if lock(&self.state).initialized {
            return;
        }
        let available = self.ranker.probe().await;
        let mut state = lock(&self.state);
        state.initialized = true;
        state.ranker_available = available;
        if available {
            info!("Recommendation engine ready with external ranker");
        } else {
            info!("Recommendation engine ready in rule-based mode (ranker unreachable)");
        }
    }

    /// Re-probes the ranker and resets engine state. The availability flag
    /// is otherwise cached for the process lifetime.
    pub async fn reinitialize(&self) {
        lock(&self.state).initialized = false;
        self.ensure_initialized().await;
    }

    /// Generates an ordered recommendation list for `profile`. Never fails:
    /// any unexpected error inside the pipeline yields the static fallback
    /// set instead.
    pub async fn generate_recommendations(
        &self,
        profile: &UserProfile,
        force_refresh: bool,
        fairness_override: Option<bool>,
    ) -> Vec<ScoredRecommendation> {
        self.ensure_initialized().await;

        match self
            .try_generate(profile, force_refresh, fairness_override)
            .await
        {
            Ok(recommendations) => recommendations,
            Err(e) => {
                error!("Recommendation pipeline failed: {e:#}; serving fallback set");
                self.fallback_recommendations()
            }
        }
    }

    async fn try_generate(
        &self,
        profile: &UserProfile,
        force_refresh: bool,
        fairness_override: Option<bool>,
    ) -> anyhow::Result<Vec<ScoredRecommendation>> {
        let fairness = fairness_override.unwrap_or(self.config.fairness_boost);
        let profile_fingerprint = fingerprint(profile);

        if !force_refresh {
            if let Some(cached) = self.cached(&profile_fingerprint) {
                debug!("Returning cached recommendations");
                return Ok(cached);
            }
        }

        let candidates = self.prefiltered_candidates(profile);
        debug!("{} candidates after pre-filtering", candidates.len());

        let ranker_available = lock(&self.state).ranker_available;
        let picks = if ranker_available && !candidates.is_empty() {
            match self.ranker.rank(profile, &candidates, fairness).await {
                Ok(picks) => picks,
                Err(e) => {
                    // Fail open: a ranker fault must look like an absent
                    // ranker, not an error.
                    warn!("External ranker failed ({e}); using rule-based scorer");
                    self.rule_based(profile, &candidates, fairness)
                }
            }
        } else {
            self.rule_based(profile, &candidates, fairness)
        };

        let recommendations = self.enrich(picks);
        if recommendations.is_empty() {
            anyhow::bail!("no candidates matched the profile filters");
        }

        *lock(&self.cache) = Some(CacheEntry {
            fingerprint: profile_fingerprint,
            recommendations: recommendations.clone(),
            created_at: Instant::now(),
        });

        info!("Generated {} recommendations", recommendations.len());
        Ok(recommendations)
    }

    fn cached(&self, profile_fingerprint: &str) -> Option<Vec<ScoredRecommendation>> {
        let cache = lock(&self.cache);
        let entry = cache.as_ref()?;
        if entry.fingerprint == profile_fingerprint
            && entry.created_at.elapsed() < self.config.cache_validity
        {
            return Some(entry.recommendations.clone());
        }
        None
    }

    pub fn clear_cache(&self) {
        *lock(&self.cache) = None;
        debug!("Recommendation cache cleared");
    }

    /// Server-side pre-filter: only location preference and state narrow
    /// the candidate set; every other criterion is applied by ranking.
    /// Beyond [`CANDIDATE_LIMIT`] records, paid internships with the most
    /// openings are kept.
    fn prefiltered_candidates(&self, profile: &UserProfile) -> Vec<Internship> {
        let filter = CatalogFilter {
            location: profile
                .has_location_preference()
                .then(|| profile.preferred_location.clone())
                .flatten(),
            state: profile.state.clone().filter(|s| !s.trim().is_empty()),
            ..Default::default()
        };

        let mut candidates = self.catalog.filter(&filter);
        if candidates.len() > CANDIDATE_LIMIT {
            candidates.sort_by(|a, b| {
                b.is_paid
                    .cmp(&a.is_paid)
                    .then(b.openings.cmp(&a.openings))
            });
            candidates.truncate(CANDIDATE_LIMIT);
        }
        candidates
    }

    /// Local scoring path: score, sort descending (stable, so candidate
    /// order breaks ties), keep the top ten, rank 1..N.
    fn rule_based(
        &self,
        profile: &UserProfile,
        candidates: &[Internship],
        fairness: bool,
    ) -> Vec<RankedCandidate> {
        let mut rng = rand::thread_rng();

        let mut scored: Vec<(u32, &Internship)> = candidates
            .iter()
            .map(|internship| (adjusted_score(profile, internship, fairness), internship))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(MAX_RESULTS)
            .enumerate()
            .map(|(i, (score, internship))| RankedCandidate {
                internship: internship.clone(),
                rank: i as u32 + 1,
                match_score: (score + rng.gen_range(0..10)).min(95),
                reasoning: reasoning_text(profile, internship, score),
                benefits: Vec::new(),
                recommended_by_ai: false,
                compatibility_score: Some(score),
            })
            .collect()
    }

    /// Enrichment: benefits, deadline passthrough, openings, immediate
    /// start, legacy projection. Benefits named by the remote ranker are
    /// kept and the flag-derived list is appended, so every result carries
    /// the two generic entries.
    fn enrich(&self, picks: Vec<RankedCandidate>) -> Vec<ScoredRecommendation> {
        picks
            .into_iter()
            .map(|pick| {
                let internship = pick.internship;
                let mut benefits = pick.benefits;
                benefits.extend(generate_benefits(&internship));
                ScoredRecommendation {
                    compatibility_score: pick.compatibility_score,
                    ai_match_score: pick.match_score,
                    ai_reasoning: pick.reasoning,
                    ai_benefits: benefits,
                    ai_rank: pick.rank,
                    recommended_by_ai: pick.recommended_by_ai,
                    application_deadline: internship.apply_by.clone(),
                    openings_available: internship.openings.max(1),
                    is_immediate_start: internship.is_immediate_start(),
                    converted_format: LegacyInternship::from_internship(&internship),
                    internship,
                }
            })
            .collect()
    }

    /// Last-resort tier: a fixed-size list from the static sample set with
    /// bounded pseudo-scores. Must never fail.
    pub fn fallback_recommendations(&self) -> Vec<ScoredRecommendation> {
        let mut rng = rand::thread_rng();
        self.catalog
            .sample_fallback()
            .into_iter()
            .take(FALLBACK_COUNT)
            .enumerate()
            .map(|(i, internship)| ScoredRecommendation {
                compatibility_score: None,
                ai_match_score: 65 + rng.gen_range(0..20),
                ai_reasoning: "Basic compatibility based on available information".to_string(),
                ai_benefits: vec![
                    "Learning opportunity".to_string(),
                    "Professional experience".to_string(),
                ],
                ai_rank: i as u32 + 1,
                recommended_by_ai: false,
                application_deadline: internship.apply_by.clone(),
                openings_available: internship.openings.max(1),
                is_immediate_start: internship.is_immediate_start(),
                converted_format: LegacyInternship::from_internship(&internship),
                internship,
            })
            .collect()
    }

    pub fn status(&self) -> EngineStatus {
        let state = lock(&self.state);
        let cache = lock(&self.cache);
        EngineStatus {
            initialized: state.initialized,
            ranker_connected: state.ranker_available,
            catalog_size: self.catalog.len(),
            cache: CacheStatus {
                has_cache: cache.is_some(),
                age_ms: cache
                    .as_ref()
                    .map(|e| e.created_at.elapsed().as_millis() as u64)
                    .unwrap_or(0),
            },
        }
    }
}

/// Lock helper that shrugs off poisoning: the engine must stay total even
/// if a panicking test thread poisoned a mutex.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Benefits derived from record flags, always ending with the two generic
/// entries.
fn generate_benefits(internship: &Internship) -> Vec<String> {
    let mut benefits = Vec::new();

    if internship.is_paid {
        benefits.push(format!("Paid position: {}", internship.stipend));
    }
    if !internship.duration.trim().is_empty() {
        benefits.push(format!("Duration: {}", internship.duration));
    }
    if internship.is_immediate_start() {
        benefits.push("Immediate start available".to_string());
    }
    if internship.openings > 1 {
        benefits.push(format!("{} positions available", internship.openings));
    }

    benefits.push("Professional experience".to_string());
    benefits.push("Skill development".to_string());
    benefits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ingest::{sample_records, test_internship};
    use crate::models::profile::ReservationCategory;
    use crate::ranker::RankerError;
    use async_trait::async_trait;

    /// Test double for the ranker capability.
    struct StubRanker {
        available: bool,
        fail: bool,
    }

    #[async_trait]
    impl Ranker for StubRanker {
        async fn probe(&self) -> bool {
            self.available
        }

        async fn rank(
            &self,
            _profile: &UserProfile,
            candidates: &[Internship],
            _fairness: bool,
        ) -> Result<Vec<RankedCandidate>, RankerError> {
            if self.fail {
                return Err(RankerError::NoJson);
            }
            Ok(candidates
                .iter()
                .take(MAX_RESULTS)
                .enumerate()
                .map(|(i, internship)| RankedCandidate {
                    internship: internship.clone(),
                    rank: i as u32 + 1,
                    match_score: 90,
                    reasoning: "stub".to_string(),
                    benefits: vec!["stub benefit".to_string()],
                    recommended_by_ai: true,
                    compatibility_score: None,
                })
                .collect())
        }
    }

    fn engine_with(
        records: Vec<Internship>,
        ranker: StubRanker,
        config: EngineConfig,
    ) -> RecommendationEngine {
        RecommendationEngine::new(
            Arc::new(Catalog::new(records)),
            Arc::new(ranker),
            config,
        )
    }

    fn offline() -> StubRanker {
        StubRanker {
            available: false,
            fail: false,
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Asha".to_string(),
            qualification: Some("Computer Science Engineering".to_string()),
            skills: Some("programming, data".to_string()),
            preferred_location: Some("Any".to_string()),
            state: None,
            ..Default::default()
        }
    }

    fn many_records(n: usize) -> Vec<Internship> {
        (0..n)
            .map(|i| test_internship(&format!("R{i}"), "IT Intern", "Bangalore", "Karnataka"))
            .collect()
    }

    #[tokio::test]
    async fn test_cache_hit_returns_identical_list() {
        let engine = engine_with(sample_records(), offline(), EngineConfig::default());
        let first = engine.generate_recommendations(&profile(), false, None).await;
        let second = engine.generate_recommendations(&profile(), false, None).await;
        // Identical including the jittered ai_match_score: no recomputation.
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cache_requires_fingerprint_match() {
        let engine = engine_with(sample_records(), offline(), EngineConfig::default());
        let first = engine.generate_recommendations(&profile(), false, None).await;

        let mut other = profile();
        other.skills = Some("finance".to_string());
        let second = engine.generate_recommendations(&other, false, None).await;
        assert_ne!(
            first[0].compatibility_score, second[0].compatibility_score,
            "different profiles must not share cached scores"
        );
    }

    /// Name-only profile whose scores sit well below the clamp, so
    /// fairness deltas stay visible.
    fn minimal_profile() -> UserProfile {
        UserProfile {
            name: "Ravi".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_category_change_hits_stale_cache() {
        // Documented limitation: the fingerprint ignores fairness fields,
        // so a category change within the validity window still hits.
        let engine = engine_with(sample_records(), offline(), EngineConfig::default());
        let first = engine
            .generate_recommendations(&minimal_profile(), false, None)
            .await;

        let mut sc = minimal_profile();
        sc.category = Some(ReservationCategory::Sc);
        let second = engine.generate_recommendations(&sc, false, Some(true)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let engine = engine_with(sample_records(), offline(), EngineConfig::default());
        let cached = engine
            .generate_recommendations(&minimal_profile(), false, None)
            .await;

        let mut sc = minimal_profile();
        sc.category = Some(ReservationCategory::Sc);
        let refreshed = engine
            .generate_recommendations(&sc, true, Some(true))
            .await;

        let cached_top = cached[0].compatibility_score.unwrap();
        let refreshed_top = refreshed[0].compatibility_score.unwrap();
        assert_eq!(refreshed_top, (cached_top + 20).min(100));
    }

    #[tokio::test]
    async fn test_expired_cache_is_ignored() {
        let config = EngineConfig {
            cache_validity: Duration::from_millis(0),
            ..Default::default()
        };
        let engine = engine_with(sample_records(), offline(), config);
        engine.generate_recommendations(&profile(), false, None).await;

        let mut sc = profile();
        sc.category = Some(ReservationCategory::Sc);
        let second = engine.generate_recommendations(&sc, false, Some(true)).await;
        // Zero validity: the second call recomputes, so fairness applies.
        assert!(second[0].compatibility_score.is_some());
        assert!(second.iter().all(|r| !r.recommended_by_ai));
    }

    #[tokio::test]
    async fn test_rule_path_truncates_to_top_ten() {
        let engine = engine_with(many_records(15), offline(), EngineConfig::default());
        let recs = engine.generate_recommendations(&profile(), false, None).await;

        assert_eq!(recs.len(), 10);
        for (i, rec) in recs.iter().enumerate() {
            assert_eq!(rec.ai_rank, i as u32 + 1);
        }
        let scores: Vec<u32> = recs.iter().map(|r| r.compatibility_score.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_ranker_failure_falls_back_to_rule_path() {
        let ranker = StubRanker {
            available: true,
            fail: true,
        };
        let engine = engine_with(sample_records(), ranker, EngineConfig::default());
        let recs = engine.generate_recommendations(&profile(), false, None).await;

        assert!(!recs.is_empty());
        assert!(recs.iter().all(|r| !r.recommended_by_ai));
        assert!(recs.iter().all(|r| r.compatibility_score.is_some()));
    }

    #[tokio::test]
    async fn test_ranker_success_is_used() {
        let ranker = StubRanker {
            available: true,
            fail: false,
        };
        let engine = engine_with(sample_records(), ranker, EngineConfig::default());
        let recs = engine.generate_recommendations(&profile(), false, None).await;

        assert!(!recs.is_empty());
        assert!(recs.iter().all(|r| r.recommended_by_ai));
        assert!(recs.iter().all(|r| r.compatibility_score.is_none()));
        // Ranker-named benefits survive enrichment, derived ones follow.
        assert!(recs[0].ai_benefits.contains(&"stub benefit".to_string()));
        assert!(recs[0].ai_benefits.contains(&"Skill development".to_string()));
    }

    #[tokio::test]
    async fn test_empty_catalog_serves_fallback_set() {
        let engine = engine_with(Vec::new(), offline(), EngineConfig::default());
        let recs = engine.generate_recommendations(&profile(), false, None).await;

        assert_eq!(recs.len(), 5);
        for rec in &recs {
            assert!((65..85).contains(&rec.ai_match_score));
            assert!(!rec.recommended_by_ai);
            assert!(!rec.ai_reasoning.is_empty());
        }
    }

    #[tokio::test]
    async fn test_enrichment_fields() {
        let engine = engine_with(sample_records(), offline(), EngineConfig::default());
        let recs = engine.generate_recommendations(&profile(), false, None).await;

        for rec in &recs {
            assert!(rec.ai_benefits.contains(&"Professional experience".to_string()));
            assert!(rec.ai_benefits.contains(&"Skill development".to_string()));
            assert!(rec.openings_available >= 1);
            assert_eq!(rec.converted_format.id, rec.internship.id);
            assert_eq!(rec.application_deadline, rec.internship.apply_by);
            if rec.internship.is_paid {
                assert!(rec
                    .ai_benefits
                    .iter()
                    .any(|b| b.starts_with("Paid position")));
            }
        }
    }

    #[tokio::test]
    async fn test_prefilter_bounds_candidate_set() {
        let mut records = many_records(60);
        // One unpaid record that the >50 bound should push out.
        let mut unpaid = test_internship("UNPAID", "IT Intern", "Bangalore", "Karnataka");
        unpaid.stipend = "Unpaid".to_string();
        unpaid.is_paid = false;
        records.push(unpaid);

        let engine = engine_with(records, offline(), EngineConfig::default());
        let candidates = engine.prefiltered_candidates(&profile());
        assert_eq!(candidates.len(), 50);
        assert!(candidates.iter().all(|c| c.is_paid));
    }

    #[tokio::test]
    async fn test_status_reports_cache_and_ranker() {
        let engine = engine_with(sample_records(), offline(), EngineConfig::default());
        engine.ensure_initialized().await;

        let before = engine.status();
        assert!(before.initialized);
        assert!(!before.ranker_connected);
        assert!(!before.cache.has_cache);

        engine.generate_recommendations(&profile(), false, None).await;
        let after = engine.status();
        assert!(after.cache.has_cache);

        engine.clear_cache();
        assert!(!engine.status().cache.has_cache);
    }
}
