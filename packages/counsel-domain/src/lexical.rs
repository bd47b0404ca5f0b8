//! Term-frequency sparse terms shared by every dense backend in hybrid mode.

use std::collections::BTreeMap;

use regex::Regex;

pub const SPARSE_MODEL: &str = "bm25-tf";

const MIN_TERM_CHARS: usize = 3;

/// Lowercases `text`, strips punctuation, and counts terms of at least three characters.
pub fn sparse_terms(text: &str) -> BTreeMap<String, f32> {
	let lowered = text.to_lowercase();
	let cleaned = Regex::new(r"[^\w\s]")
		.map(|re| re.replace_all(&lowered, "").into_owned())
		.unwrap_or_else(|_| lowered.clone());
	let mut terms = BTreeMap::new();

	for token in cleaned.split_whitespace() {
		if token.chars().count() < MIN_TERM_CHARS {
			continue;
		}

		*terms.entry(token.to_string()).or_insert(0.0) += 1.0;
	}

	terms
}

/// Stable sparse-vector index for `term`: the first four bytes of its blake3 digest, little endian.
pub fn sparse_index(term: &str) -> u32 {
	let digest = blake3::hash(term.as_bytes());
	let bytes = digest.as_bytes();

	u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Converts sparse terms into parallel index/value arrays ordered by index.
///
/// Colliding terms have their weights summed.
pub fn to_sparse_vector(terms: &BTreeMap<String, f32>) -> (Vec<u32>, Vec<f32>) {
	let mut by_index: BTreeMap<u32, f32> = BTreeMap::new();

	for (term, weight) in terms {
		*by_index.entry(sparse_index(term)).or_insert(0.0) += weight;
	}

	by_index.into_iter().unzip()
}
