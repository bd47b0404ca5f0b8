//! Brute-force index used by tests and offline replays.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, SearchHits, SearchRequest};
use counsel_domain::{
	hit::{DocType, ScoredHit},
	lexical,
	objection::ObjectionType,
};

/// Payload schema shared by the Qdrant collection and the in-memory index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusDocument {
	pub id: String,
	pub text: String,
	pub source: String,
	pub doc_type: String,
	pub case_id: String,
	#[serde(default)]
	pub objection_type: Option<String>,
	#[serde(default)]
	pub keywords: Option<String>,
}
impl CorpusDocument {
	pub fn field(&self, name: &str) -> Option<&str> {
		match name {
			"id" => Some(self.id.as_str()),
			"source" => Some(self.source.as_str()),
			"doc_type" => Some(self.doc_type.as_str()),
			"case_id" => Some(self.case_id.as_str()),
			"objection_type" => self.objection_type.as_deref(),
			_ => None,
		}
	}

	/// Text indexed by the lexical leg: body plus keywords.
	pub fn lexical_text(&self) -> String {
		match self.keywords.as_deref() {
			Some(keywords) if !keywords.trim().is_empty() => format!("{} {keywords}", self.text),
			_ => self.text.clone(),
		}
	}

	pub fn to_scored_hit(&self, collection: &str, score: f32) -> ScoredHit {
		ScoredHit {
			id: self.id.clone(),
			collection_name: collection.to_string(),
			title: self.source.clone(),
			snippet: self.text.clone(),
			doc_type: DocType::parse(&self.doc_type),
			objection_type: self
				.objection_type
				.as_deref()
				.filter(|label| !label.trim().is_empty())
				.map(ObjectionType::parse),
			score,
		}
	}
}

#[derive(Debug, Clone)]
struct IndexedDocument {
	doc: CorpusDocument,
	dense: Vec<f32>,
	sparse: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
	collections: BTreeMap<String, Vec<IndexedDocument>>,
}
impl InMemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn create_collection(&mut self, collection: &str) {
		self.collections.entry(collection.to_string()).or_default();
	}

	/// Adds `doc` to `collection`, creating the collection when needed.
	pub fn insert(&mut self, collection: &str, doc: CorpusDocument, dense: Vec<f32>) {
		let sparse = lexical::sparse_terms(&doc.lexical_text());

		self.collections
			.entry(collection.to_string())
			.or_default()
			.push(IndexedDocument { doc, dense, sparse });
	}

	pub fn len(&self, collection: &str) -> usize {
		self.collections.get(collection).map(Vec::len).unwrap_or(0)
	}

	pub fn search(&self, req: &SearchRequest) -> Result<SearchHits> {
		let Some(docs) = self.collections.get(&req.collection) else {
			return Err(Error::CollectionNotFound { collection: req.collection.clone() });
		};
		let candidates: Vec<&IndexedDocument> = docs
			.iter()
			.filter(|entry| {
				req.predicate.as_ref().map(|expr| expr.matches(|field| entry.doc.field(field))).unwrap_or(true)
			})
			.collect();
		let dense = rank(
			&req.collection,
			candidates
				.iter()
				.filter(|entry| entry.dense.len() == req.dense.len())
				.map(|entry| (*entry, cosine(&req.dense, &entry.dense))),
			req.limit,
		);
		let sparse = req.sparse.as_ref().map(|terms| {
			rank(
				&req.collection,
				candidates
					.iter()
					.map(|entry| (*entry, dot(terms, &entry.sparse)))
					.filter(|(_, score)| *score > 0.0),
				req.limit,
			)
		});

		Ok(SearchHits { dense, sparse })
	}
}

fn rank<'a>(
	collection: &str,
	scored: impl Iterator<Item = (&'a IndexedDocument, f32)>,
	limit: u32,
) -> Vec<ScoredHit> {
	let mut scored: Vec<_> = scored.collect();

	scored.sort_by(|(a_doc, a), (b_doc, b)| b.total_cmp(a).then_with(|| a_doc.doc.id.cmp(&b_doc.doc.id)));
	scored.truncate(limit as usize);

	scored.into_iter().map(|(entry, score)| entry.doc.to_scored_hit(collection, score)).collect()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a * norm_b)
}

fn dot(query: &BTreeMap<String, f32>, doc: &BTreeMap<String, f32>) -> f32 {
	query.iter().filter_map(|(term, weight)| doc.get(term).map(|doc_weight| weight * doc_weight)).sum()
}
