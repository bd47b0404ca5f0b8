use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectionType {
	Hearsay,
	LackOfFoundation,
	Argumentative,
	Speculation,
	AssumesFacts,
	Mischaracterization,
	Vague,
	ImproperOpinion,
	Prejudicial,
	Leading,
	/// A label outside the fixed taxonomy, carried verbatim.
	Other(String),
}
impl ObjectionType {
	pub const TAXONOMY: [ObjectionType; 10] = [
		Self::Hearsay,
		Self::LackOfFoundation,
		Self::Argumentative,
		Self::Speculation,
		Self::AssumesFacts,
		Self::Mischaracterization,
		Self::Vague,
		Self::ImproperOpinion,
		Self::Prejudicial,
		Self::Leading,
	];

	pub fn parse(label: &str) -> Self {
		let normalized = label.trim().to_ascii_uppercase();

		Self::TAXONOMY
			.iter()
			.find(|known| known.label() == normalized)
			.cloned()
			.unwrap_or_else(|| Self::Other(label.to_string()))
	}

	pub fn label(&self) -> &str {
		match self {
			Self::Hearsay => "HEARSAY",
			Self::LackOfFoundation => "LACK OF FOUNDATION",
			Self::Argumentative => "ARGUMENTATIVE",
			Self::Speculation => "SPECULATION",
			Self::AssumesFacts => "ASSUMES FACTS",
			Self::Mischaracterization => "MISCHARACTERIZATION",
			Self::Vague => "VAGUE",
			Self::ImproperOpinion => "IMPROPER OPINION",
			Self::Prejudicial => "PREJUDICIAL",
			Self::Leading => "LEADING",
			Self::Other(label) => label,
		}
	}

	pub fn is_known(&self) -> bool {
		!matches!(self, Self::Other(_))
	}

	/// Recommendation and courtroom script for this objection.
	pub fn guidance(&self) -> Guidance {
		let (recommendation, script) = match self {
			Self::Hearsay => (
				"Recommend objection. Statement is out-of-court hearsay.",
				"Objection, Your Honor. Hearsay. The witness has no personal knowledge of this statement.",
			),
			Self::LackOfFoundation => (
				"Recommend objection. Lacks sufficient foundation.",
				"Objection. Lack of foundation. Counsel has not established the witness has personal knowledge.",
			),
			Self::Argumentative => (
				"Recommend objection. Question is argumentative.",
				"Objection, argumentative. Counsel is badgering the witness.",
			),
			Self::Speculation => (
				"Recommend objection. Calls for speculation.",
				"Objection. Calls for speculation. The witness cannot testify to matters outside personal knowledge.",
			),
			Self::AssumesFacts => (
				"Recommend objection. Assumes facts not in evidence.",
				"Objection. Assumes facts not in evidence.",
			),
			Self::Mischaracterization => (
				"Recommend objection. Misstates prior testimony.",
				"Objection, Your Honor. Counsel is mischaracterizing the prior testimony.",
			),
			Self::Vague => (
				"Recommend objection. Question is vague and ambiguous.",
				"Objection. Vague and ambiguous. Could counsel please clarify the question?",
			),
			Self::ImproperOpinion => (
				"Recommend objection. Calls for improper opinion.",
				"Objection. Calls for an expert opinion from a lay witness.",
			),
			Self::Prejudicial => (
				"Recommend objection. Prejudicial value outweighs probative.",
				"Objection, Your Honor. The prejudicial effect substantially outweighs any probative value.",
			),
			Self::Leading => (
				"Recommend objection. Leading question on direct.",
				"Objection. Leading. Counsel is suggesting the answer to the witness.",
			),
			Self::Other(label) =>
				return Guidance {
					recommendation: format!("Recommend objection: {label}"),
					script: format!("Objection, Your Honor. {label}."),
				},
		};

		Guidance { recommendation: recommendation.to_string(), script: script.to_string() }
	}
}
impl fmt::Display for ObjectionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}
impl Serialize for ObjectionType {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.label())
	}
}
impl<'de> Deserialize<'de> for ObjectionType {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let label = String::deserialize(deserializer)?;

		Ok(Self::parse(&label))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guidance {
	pub recommendation: String,
	pub script: String,
}
