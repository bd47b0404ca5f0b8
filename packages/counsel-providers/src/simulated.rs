//! Deterministic stand-in used when a backend cannot be reached.

use crate::embedding::DenseEmbedding;

#[derive(Debug, Clone)]
pub struct SimulatedEmbedder {
	model: String,
	dimensions: u32,
	latency_ms: u64,
}
impl SimulatedEmbedder {
	pub fn new(model: &str, dimensions: u32, latency_ms: u64) -> Self {
		Self { model: format!("simulated/{model}"), dimensions, latency_ms }
	}

	pub fn from_mode(cfg: &counsel_config::ModeConfig) -> Self {
		Self::new(&cfg.model, cfg.dimensions, cfg.fallback_latency_ms)
	}

	/// Reported latency for a simulated call. Nothing sleeps.
	pub fn latency_ms(&self) -> u64 {
		self.latency_ms
	}

	/// Unit-length vector expanded from the blake3 XOF of `text`.
	pub fn embed(&self, text: &str) -> DenseEmbedding {
		let mut reader = blake3::Hasher::new().update(text.as_bytes()).finalize_xof();
		let mut vector = Vec::with_capacity(self.dimensions as usize);
		let mut word = [0_u8; 4];

		for _ in 0..self.dimensions {
			reader.fill(&mut word);

			let unit = u32::from_le_bytes(word) as f64 / u32::MAX as f64;

			vector.push((unit * 2.0 - 1.0) as f32);
		}

		let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

		if norm > 0.0 {
			for value in &mut vector {
				*value /= norm;
			}
		}

		DenseEmbedding { vector, model: self.model.clone() }
	}
}
