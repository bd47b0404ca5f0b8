use serde::{Deserialize, Serialize};

use crate::objection::ObjectionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocType {
	Rule,
	Evidence,
	Transcript,
	Motion,
	Brief,
	Deposition,
}
impl DocType {
	/// Unknown payload values read as transcripts.
	pub fn parse(label: &str) -> Self {
		match label.trim().to_ascii_uppercase().as_str() {
			"RULE" => Self::Rule,
			"EVIDENCE" => Self::Evidence,
			"MOTION" => Self::Motion,
			"BRIEF" => Self::Brief,
			"DEPOSITION" => Self::Deposition,
			_ => Self::Transcript,
		}
	}
}

/// A search result as returned by one retrieval leg, before fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHit {
	pub id: String,
	pub collection_name: String,
	pub title: String,
	pub snippet: String,
	pub doc_type: DocType,
	pub objection_type: Option<ObjectionType>,
	/// Native score of the leg that produced this hit; higher is better.
	pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
	pub id: String,
	pub collection_name: String,
	pub title: String,
	pub snippet: String,
	pub doc_type: DocType,
	pub objection_type: Option<ObjectionType>,
	pub dense_rank: Option<u32>,
	pub sparse_rank: Option<u32>,
	pub fused_rank: u32,
	pub fused_score: f64,
	/// Native score of the list the hit was first seen in: dense similarity, else the sparse score.
	pub raw_score: f32,
	/// Dense similarity, present only when the dense leg returned the hit.
	pub dense_score: Option<f32>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_doc_types_fall_back_to_transcript() {
		assert_eq!(DocType::parse("rule"), DocType::Rule);
		assert_eq!(DocType::parse("EXHIBIT"), DocType::Transcript);
		assert_eq!(DocType::parse(""), DocType::Transcript);
	}
}
