pub mod memory;
pub mod qdrant;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

use std::collections::BTreeMap;

use counsel_domain::{hit::ScoredHit, query::FilterExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
	pub collection: String,
	pub dense: Vec<f32>,
	/// Lexical terms for the sparse leg; `None` runs the dense leg only.
	pub sparse: Option<BTreeMap<String, f32>>,
	pub limit: u32,
	pub predicate: Option<FilterExpr>,
}

/// Per-leg results, each in descending native score order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
	pub dense: Vec<ScoredHit>,
	pub sparse: Option<Vec<ScoredHit>>,
}
