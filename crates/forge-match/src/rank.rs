//! Relevance ranking of candidates against a query embedding.

use tracing::debug;

use forge_core::{defaults, MatchCandidate, RankedMatch, Result};

use crate::cosine::cosine_similarity;

/// Boost and cutoff configuration for ranking.
#[derive(Debug, Clone, Copy)]
pub struct RankOptions {
    /// Additive bonus for exclusive-tier candidates, clamped so no score
    /// exceeds 1.0.
    pub boost: f32,
    /// Minimum score required to appear in results.
    pub cutoff: f32,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            boost: defaults::EXCLUSIVE_BOOST,
            cutoff: defaults::RELEVANCE_CUTOFF,
        }
    }
}

/// Rank candidates by cosine similarity to the query embedding.
///
/// Candidates without a stored embedding are skipped. Exclusive-tier
/// candidates receive the configured boost before clamping to 1.0. The
/// result is filtered to `score >= cutoff` and sorted strictly descending;
/// ties retain input relative order (stable sort).
pub fn rank(
    query: &[f32],
    candidates: &[MatchCandidate],
    options: RankOptions,
) -> Result<Vec<RankedMatch>> {
    let candidate_count = candidates.len();
    let mut matches = Vec::with_capacity(candidate_count);

    for candidate in candidates {
        let Some(embedding) = &candidate.embedding else {
            continue;
        };
        let mut score = cosine_similarity(query, embedding)?;
        if candidate.exclusive {
            score = (score + options.boost).min(1.0);
        }
        if score >= options.cutoff {
            matches.push(RankedMatch {
                id: candidate.id.clone(),
                score,
                metadata: candidate.metadata.clone(),
            });
        }
    }

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(
        candidate_count,
        result_count = matches.len(),
        cutoff = options.cutoff,
        "ranked candidates"
    );

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(id: &str, embedding: Option<Vec<f32>>, exclusive: bool) -> MatchCandidate {
        MatchCandidate {
            id: id.to_string(),
            embedding,
            exclusive,
            metadata: json!({}),
        }
    }

    /// Build a unit-length 2D vector at `cos` similarity to the x axis.
    fn at_similarity(cos: f32) -> Vec<f32> {
        vec![cos, (1.0 - cos * cos).sqrt()]
    }

    #[test]
    fn test_cutoff_and_descending_sort() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            candidate("a", Some(at_similarity(0.05)), false),
            candidate("b", Some(at_similarity(0.5)), false),
            candidate("c", Some(at_similarity(0.9)), false),
            candidate("d", Some(at_similarity(0.15)), false),
        ];

        let ranked = rank(&query, &candidates, RankOptions { boost: 0.0, cutoff: 0.1 }).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "d"]);
        assert!(ranked.iter().all(|m| m.score >= 0.1));
    }

    #[test]
    fn test_boost_clamps_to_one() {
        let query = vec![1.0, 0.0];
        let candidates = vec![candidate("a", Some(at_similarity(0.95)), true)];

        let ranked = rank(&query, &candidates, RankOptions { boost: 0.2, cutoff: 0.1 }).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 1.0);
    }

    #[test]
    fn test_boost_applies_only_to_exclusive() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            candidate("plain", Some(at_similarity(0.5)), false),
            candidate("boosted", Some(at_similarity(0.5)), true),
        ];

        let ranked = rank(&query, &candidates, RankOptions { boost: 0.2, cutoff: 0.1 }).unwrap();
        assert_eq!(ranked[0].id, "boosted");
        assert!((ranked[0].score - 0.7).abs() < 1e-5);
        assert!((ranked[1].score - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_null_embeddings_are_skipped() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            candidate("missing", None, false),
            candidate("present", Some(at_similarity(0.8)), false),
        ];

        let ranked = rank(&query, &candidates, RankOptions::default()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "present");
    }

    #[test]
    fn test_ties_retain_input_order() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            candidate("first", Some(at_similarity(0.5)), false),
            candidate("second", Some(at_similarity(0.5)), false),
        ];

        let ranked = rank(&query, &candidates, RankOptions::default()).unwrap();
        assert_eq!(ranked[0].id, "first");
        assert_eq!(ranked[1].id, "second");
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let query = vec![1.0, 0.0, 0.0];
        let candidates = vec![candidate("a", Some(vec![1.0, 0.0]), false)];
        assert!(rank(&query, &candidates, RankOptions::default()).is_err());
    }

    #[test]
    fn test_metadata_carried_through() {
        let query = vec![1.0, 0.0];
        let candidates = vec![MatchCandidate {
            id: "a".into(),
            embedding: Some(at_similarity(0.9)),
            exclusive: false,
            metadata: json!({"business_name": "Acme"}),
        }];

        let ranked = rank(&query, &candidates, RankOptions::default()).unwrap();
        assert_eq!(ranked[0].metadata["business_name"], "Acme");
    }

    #[test]
    fn test_default_options_use_design_constants() {
        let opts = RankOptions::default();
        assert_eq!(opts.cutoff, forge_core::defaults::RELEVANCE_CUTOFF);
        assert_eq!(opts.boost, forge_core::defaults::EXCLUSIVE_BOOST);
    }
}
