use serde::Serialize;

/// Utterances shorter than this many characters are treated as housekeeping.
pub const MIN_TRIGGER_CHARS: usize = 10;

const OBJECTION_MARKER: &str = "objection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerAction {
	Proceed,
	Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
	Housekeeping,
	ObjectionRaised,
	CrossQuestion,
	Testimony,
}
impl TriggerKind {
	pub fn label(self) -> &'static str {
		match self {
			Self::Housekeeping => "Too short (housekeeping)",
			Self::ObjectionRaised => "Objection raised on the record",
			Self::CrossQuestion => "Cross-exam question",
			Self::Testimony => "New testimony",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trigger {
	pub is_question: bool,
	pub action: TriggerAction,
	pub kind: TriggerKind,
	pub label: &'static str,
}
impl Trigger {
	pub fn is_ignored(&self) -> bool {
		self.action == TriggerAction::Ignore
	}
}

pub fn evaluate(text: &str) -> Trigger {
	let is_question = text.trim().ends_with('?');
	let mentions_objection = text.to_lowercase().contains(OBJECTION_MARKER);
	let too_short = text.chars().count() < MIN_TRIGGER_CHARS;
	let (action, kind) = if too_short && !mentions_objection {
		(TriggerAction::Ignore, TriggerKind::Housekeeping)
	} else if mentions_objection {
		(TriggerAction::Proceed, TriggerKind::ObjectionRaised)
	} else if is_question {
		(TriggerAction::Proceed, TriggerKind::CrossQuestion)
	} else {
		(TriggerAction::Proceed, TriggerKind::Testimony)
	};

	Trigger { is_question, action, kind, label: kind.label() }
}
