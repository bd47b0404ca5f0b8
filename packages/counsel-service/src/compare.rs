use serde::{Deserialize, Serialize};

use crate::{PipelineService, Result, trace::Trace};

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
	pub utterance_text: String,
	#[serde(default)]
	pub case_id: String,
	/// Falls back to `compare.mode_a`.
	#[serde(default)]
	pub mode_a: Option<String>,
	/// Falls back to `compare.mode_b`.
	#[serde(default)]
	pub mode_b: Option<String>,
	#[serde(default)]
	pub hybrid: Option<bool>,
	/// Requests sharing a session id supersede each other.
	#[serde(default)]
	pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lane {
	A,
	B,
}

/// Two traces of the same utterance plus their latency deltas (`A - B`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
	pub trace_a: Trace,
	pub trace_b: Trace,
	pub delta_total_ms: f64,
	pub delta_embed_ms: f64,
	/// Lane with the smaller total; ties go to A.
	pub faster: Lane,
}
impl Comparison {
	pub fn new(trace_a: Trace, trace_b: Trace) -> Self {
		let delta_total_ms = trace_a.timings.total_ms - trace_b.timings.total_ms;
		let delta_embed_ms = trace_a.timings.embed_ms - trace_b.timings.embed_ms;
		let faster = if delta_total_ms <= 0.0 { Lane::A } else { Lane::B };

		Self { trace_a, trace_b, delta_total_ms, delta_embed_ms, faster }
	}

	pub fn verdicts_agree(&self) -> bool {
		self.trace_a.verdict.decision == self.trace_b.verdict.decision
			&& self.trace_a.verdict.objection_type == self.trace_b.verdict.objection_type
	}
}

impl PipelineService {
	/// Runs the same utterance through both lanes concurrently.
	///
	/// Both lanes resolve the same case and see the same input. A failure in one lane degrades
	/// that trace only; the comparison itself fails only for unknown modes.
	pub async fn compare(&self, req: &CompareRequest) -> Result<Comparison> {
		let mode_a = req.mode_a.as_deref().unwrap_or(&self.cfg.compare.mode_a);
		let mode_b = req.mode_b.as_deref().unwrap_or(&self.cfg.compare.mode_b);
		let lane_a = self.mode(mode_a)?;
		let lane_b = self.mode(mode_b)?;
		let case = self.resolve_case(&req.case_id);
		let hybrid = req.hybrid.unwrap_or(self.cfg.pipeline.hybrid);
		let (trace_a, trace_b) = tokio::join!(
			self.run_mode(lane_a, &req.utterance_text, &case, hybrid),
			self.run_mode(lane_b, &req.utterance_text, &case, hybrid),
		);
		let comparison = Comparison::new(trace_a, trace_b);

		tracing::info!(
			mode_a = %mode_a,
			mode_b = %mode_b,
			case_id = %case.id,
			delta_total_ms = comparison.delta_total_ms,
			faster = ?comparison.faster,
			"Comparison finished."
		);

		Ok(comparison)
	}
}
