use serde::Serialize;

use crate::{
	cases::CaseContext,
	gate::Trigger,
	hit::{DocType, Hit},
	objection::ObjectionType,
	rules::{self, RuleBook},
};

pub const DEFAULT_THRESHOLD: u8 = 85;
pub const DEFAULT_EVIDENCE_MIN_SCORE: f32 = 0.65;
pub const MONITOR_SCORE_FLOOR: u8 = 10;
pub const MONITOR_SCORE_SPAN: u8 = 31;

const MONITOR_RECOMMENDATION: &str = "Monitoring. No objection recommended; testimony may proceed.";
const INSUFFICIENT_EVIDENCE_RECOMMENDATION: &str =
	"Insufficient evidence. No supporting authority was retrieved.";
const SKIPPED_RECOMMENDATION: &str = "Monitoring";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
	NoAction,
	Actionable,
}

/// Which scoring path produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictBasis {
	Skipped,
	InsufficientEvidence,
	HotPhrase,
	RetrievedEvidence,
	Monitor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
	pub decision: Decision,
	pub objection_type: Option<ObjectionType>,
	pub score: u8,
	pub recommendation: String,
	pub script: String,
	pub supporting_hit_ids: Vec<String>,
	pub basis: VerdictBasis,
}
impl Verdict {
	pub fn is_actionable(&self) -> bool {
		self.decision == Decision::Actionable
	}
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
	rules: RuleBook,
	threshold: u8,
	evidence_min_score: f32,
}
impl DecisionEngine {
	pub fn new(rules: RuleBook, threshold: u8, evidence_min_score: f32) -> Self {
		Self { rules, threshold, evidence_min_score }
	}

	pub fn from_config(cfg: &counsel_config::Pipeline) -> Self {
		Self::new(
			RuleBook::builtin(cfg.default_case.as_str()),
			cfg.decision_threshold,
			cfg.evidence_min_score,
		)
	}

	pub fn rules(&self) -> &RuleBook {
		&self.rules
	}

	pub fn threshold(&self) -> u8 {
		self.threshold
	}

	pub fn decide(&self, trigger: &Trigger, text: &str, case: &CaseContext, hits: &[Hit]) -> Verdict {
		if trigger.is_ignored() {
			return no_action(0, SKIPPED_RECOMMENDATION, Vec::new(), VerdictBasis::Skipped);
		}
		if hits.is_empty() {
			return no_action(
				0,
				INSUFFICIENT_EVIDENCE_RECOMMENDATION,
				Vec::new(),
				VerdictBasis::InsufficientEvidence,
			);
		}

		let all_ids = || hits.iter().map(|hit| hit.id.clone()).collect::<Vec<_>>();

		if let Some(rule) = rules::first_match(&self.rules.for_case(&case.id).hot_phrases, text) {
			return self.score_objection(
				rule.outcome.objection_type.clone(),
				rule.outcome.score.min(100),
				all_ids(),
				VerdictBasis::HotPhrase,
			);
		}
		if let Some((hit, similarity)) = self.best_evidence(hits)
			&& let Some(objection_type) = hit.objection_type.clone()
		{
			let score = (similarity * 100.0).round().clamp(0.0, 100.0) as u8;

			return self.score_objection(
				objection_type,
				score,
				vec![hit.id.clone()],
				VerdictBasis::RetrievedEvidence,
			);
		}

		no_action(monitor_score(&case.id, text), MONITOR_RECOMMENDATION, all_ids(), VerdictBasis::Monitor)
	}

	fn score_objection(
		&self,
		objection_type: ObjectionType,
		score: u8,
		supporting_hit_ids: Vec<String>,
		basis: VerdictBasis,
	) -> Verdict {
		if score <= self.threshold {
			return no_action(score, MONITOR_RECOMMENDATION, supporting_hit_ids, basis);
		}

		let guidance = objection_type.guidance();

		Verdict {
			decision: Decision::Actionable,
			objection_type: Some(objection_type),
			score,
			recommendation: guidance.recommendation,
			script: guidance.script,
			supporting_hit_ids,
			basis,
		}
	}

	/// Strongest objection-bearing hit by dense similarity, RULE documents first, at or above the
	/// evidence floor. Hits only the sparse leg returned carry no similarity and never qualify.
	fn best_evidence<'a>(&self, hits: &'a [Hit]) -> Option<(&'a Hit, f32)> {
		let strongest = |rule_only: bool| {
			hits.iter()
				.filter(|hit| hit.objection_type.is_some())
				.filter(|hit| !rule_only || hit.doc_type == DocType::Rule)
				.filter_map(|hit| hit.dense_score.map(|similarity| (hit, similarity)))
				.fold(None::<(&Hit, f32)>, |best, candidate| match best {
					Some(best) if best.1 >= candidate.1 => Some(best),
					_ => Some(candidate),
				})
		};
		let best = strongest(true).or_else(|| strongest(false))?;

		(best.1 >= self.evidence_min_score).then_some(best)
	}
}

/// Deterministic low-confidence score in `10..=40` derived from the case and utterance.
pub fn monitor_score(case_id: &str, text: &str) -> u8 {
	let mut hasher = blake3::Hasher::new();

	hasher.update(case_id.as_bytes());
	hasher.update(&[0]);
	hasher.update(text.as_bytes());

	let digest = hasher.finalize();
	let bytes = digest.as_bytes();
	let mut head = [0_u8; 8];

	head.copy_from_slice(&bytes[..8]);

	MONITOR_SCORE_FLOOR + (u64::from_le_bytes(head) % u64::from(MONITOR_SCORE_SPAN)) as u8
}

fn no_action(
	score: u8,
	recommendation: &str,
	supporting_hit_ids: Vec<String>,
	basis: VerdictBasis,
) -> Verdict {
	Verdict {
		decision: Decision::NoAction,
		objection_type: None,
		score,
		recommendation: recommendation.to_string(),
		script: String::new(),
		supporting_hit_ids,
		basis,
	}
}
