use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
};

use crate::hit::{Hit, ScoredHit};

/// Reciprocal rank fusion constant.
pub const DEFAULT_RRF_K: f64 = 60.0;

#[derive(Debug)]
struct FusedCandidate<'a> {
	hit: &'a ScoredHit,
	dense_rank: Option<u32>,
	dense_score: Option<f32>,
	sparse_rank: Option<u32>,
	fused_score: f64,
}

/// Fuses the dense leg with an optional sparse leg into at most `top_k` hits.
///
/// Every candidate scores `1/(rrf_k + rank)` per list it appears in. With no sparse list the
/// result is the dense order, and an empty dense list degrades to the sparse order.
pub fn fuse(dense: &[ScoredHit], sparse: Option<&[ScoredHit]>, top_k: u32, rrf_k: f64) -> Vec<Hit> {
	if top_k == 0 {
		return Vec::new();
	}

	let mut by_id: HashMap<&str, FusedCandidate<'_>> = HashMap::new();

	for (hit, rank) in ranked(dense) {
		let entry = by_id.entry(hit.id.as_str()).or_insert_with(|| FusedCandidate {
			hit,
			dense_rank: None,
			dense_score: None,
			sparse_rank: None,
			fused_score: 0.0,
		});

		entry.dense_rank = Some(rank);
		entry.dense_score = Some(hit.score);
		entry.fused_score += rrf_term(rrf_k, rank);
	}
	for (hit, rank) in ranked(sparse.unwrap_or_default()) {
		let entry = by_id.entry(hit.id.as_str()).or_insert_with(|| FusedCandidate {
			hit,
			dense_rank: None,
			dense_score: None,
			sparse_rank: None,
			fused_score: 0.0,
		});

		entry.sparse_rank = Some(rank);
		entry.fused_score += rrf_term(rrf_k, rank);
	}

	let mut candidates: Vec<FusedCandidate<'_>> = by_id.into_values().collect();

	candidates.sort_by(compare_candidates);
	candidates.truncate(top_k as usize);

	candidates
		.into_iter()
		.enumerate()
		.map(|(idx, candidate)| Hit {
			id: candidate.hit.id.clone(),
			collection_name: candidate.hit.collection_name.clone(),
			title: candidate.hit.title.clone(),
			snippet: candidate.hit.snippet.clone(),
			doc_type: candidate.hit.doc_type,
			objection_type: candidate.hit.objection_type.clone(),
			dense_rank: candidate.dense_rank,
			sparse_rank: candidate.sparse_rank,
			fused_rank: idx as u32 + 1,
			fused_score: candidate.fused_score,
			raw_score: candidate.hit.score,
			dense_score: candidate.dense_score,
		})
		.collect()
}

/// 1-based ranks, keeping only the first occurrence of each id.
fn ranked(hits: &[ScoredHit]) -> Vec<(&ScoredHit, u32)> {
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for hit in hits {
		if seen.insert(hit.id.as_str()) {
			out.push((hit, out.len() as u32 + 1));
		}
	}

	out
}

fn rrf_term(rrf_k: f64, rank: u32) -> f64 {
	1.0 / (rrf_k + f64::from(rank))
}

fn compare_candidates(a: &FusedCandidate<'_>, b: &FusedCandidate<'_>) -> Ordering {
	b.fused_score
		.total_cmp(&a.fused_score)
		.then_with(|| cmp_rank_asc(a.dense_rank, b.dense_rank))
		.then_with(|| a.hit.id.cmp(&b.hit.id))
}

fn cmp_rank_asc(a: Option<u32>, b: Option<u32>) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => a.cmp(&b),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hit::DocType;

	fn hit(id: &str, score: f32) -> ScoredHit {
		ScoredHit {
			id: id.to_string(),
			collection_name: "legal_memory".to_string(),
			title: format!("source {id}"),
			snippet: String::new(),
			doc_type: DocType::Evidence,
			objection_type: None,
			score,
		}
	}

	#[test]
	fn duplicate_ids_keep_their_best_position() {
		let dense = vec![hit("a", 0.9), hit("b", 0.8), hit("a", 0.7), hit("c", 0.6)];
		let fused = fuse(&dense, None, 5, DEFAULT_RRF_K);
		let ids: Vec<_> = fused.iter().map(|hit| hit.id.as_str()).collect();

		assert_eq!(ids, vec!["a", "b", "c"]);
		assert_eq!(fused[2].dense_rank, Some(3));
		assert_eq!(fused[0].raw_score, 0.9);
	}

	#[test]
	fn sparse_only_candidates_rank_after_dense_on_ties() {
		let dense = vec![hit("b", 0.9)];
		let sparse = vec![hit("a", 4.0)];
		let fused = fuse(&dense, Some(&sparse), 3, DEFAULT_RRF_K);

		assert_eq!(fused[0].id, "b");
		assert_eq!(fused[1].id, "a");
		assert_eq!(fused[1].dense_rank, None);
		assert_eq!(fused[1].sparse_rank, Some(1));
		assert_eq!(fused[0].dense_score, Some(0.9));
		assert_eq!(fused[1].dense_score, None);
	}

	#[test]
	fn zero_top_k_yields_nothing() {
		assert!(fuse(&[hit("a", 0.9)], None, 0, DEFAULT_RRF_K).is_empty());
	}
}
