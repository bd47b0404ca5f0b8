use serde::Serialize;

use crate::{cases::CaseContext, gate::Trigger, rules::{self, RuleBook}};

pub const PHASE_CROSS: &str = "cross";
pub const ROLE_COUNSEL: &str = "counsel";
pub const ROLE_WITNESS: &str = "witness";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryFilter {
	pub case_id: String,
	pub phase: &'static str,
	pub speaker_role: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
	pub text: String,
	pub rewritten: bool,
	pub filter: QueryFilter,
}
impl Query {
	/// Payload predicate for the search stage: the active case plus the shared partition.
	pub fn predicate(&self, universal_case: &str) -> FilterExpr {
		FilterExpr::any_of("case_id", [self.filter.case_id.as_str(), universal_case])
	}
}

/// Conjunction of payload field clauses, each an OR over allowed string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterExpr {
	pub clauses: Vec<FieldMatch>,
}
impl FilterExpr {
	pub fn eq(field: &str, value: &str) -> Self {
		Self::any_of(field, [value])
	}

	pub fn any_of<'a>(field: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
		let mut allowed: Vec<String> = Vec::new();

		for value in values {
			if !allowed.iter().any(|existing| existing == value) {
				allowed.push(value.to_string());
			}
		}

		Self { clauses: vec![FieldMatch { field: field.to_string(), any_of: allowed }] }
	}

	pub fn and(mut self, other: FilterExpr) -> Self {
		self.clauses.extend(other.clauses);

		self
	}

	/// Evaluates the predicate against a payload field lookup.
	pub fn matches<'a>(&self, lookup: impl Fn(&str) -> Option<&'a str>) -> bool {
		self.clauses.iter().all(|clause| {
			lookup(&clause.field)
				.map(|value| clause.any_of.iter().any(|allowed| allowed == value))
				.unwrap_or(false)
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
	pub field: String,
	pub any_of: Vec<String>,
}

pub fn build(text: &str, trigger: &Trigger, case: &CaseContext, rules: &RuleBook) -> Query {
	let table = &rules.for_case(&case.id).rewrites;
	let (text, rewritten) = match rules::first_match(table, text) {
		Some(rule) => (rule.outcome.clone(), true),
		None => (text.to_string(), false),
	};
	let speaker_role = if trigger.is_question { ROLE_COUNSEL } else { ROLE_WITNESS };

	Query {
		text,
		rewritten,
		filter: QueryFilter { case_id: case.id.clone(), phase: PHASE_CROSS, speaker_role },
	}
}
