//! Declarative per-case knowledge: query rewrites and hot phrases.
//!
//! Both tables are ordered lists of lowercase trigger substrings evaluated by [`first_match`].
//! Cases without their own tables borrow the default case's.

use std::collections::BTreeMap;

use crate::objection::ObjectionType;

#[derive(Debug, Clone, PartialEq)]
pub struct PhraseRule<T> {
	/// Lowercase substring searched for in the lowercased utterance.
	pub trigger: String,
	pub outcome: T,
}
impl<T> PhraseRule<T> {
	pub fn new(trigger: &str, outcome: T) -> Self {
		Self { trigger: trigger.to_lowercase(), outcome }
	}
}

/// A recognized fact pattern with a fixed confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct HotPhrase {
	pub objection_type: ObjectionType,
	pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseRules {
	pub rewrites: Vec<PhraseRule<String>>,
	pub hot_phrases: Vec<PhraseRule<HotPhrase>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleBook {
	default_case: String,
	cases: BTreeMap<String, CaseRules>,
}
impl RuleBook {
	pub fn new(default_case: impl Into<String>, cases: BTreeMap<String, CaseRules>) -> Self {
		Self { default_case: default_case.into(), cases }
	}

	/// Tables for the demo trials.
	pub fn builtin(default_case: impl Into<String>) -> Self {
		let mut cases = BTreeMap::new();

		cases.insert("msft".to_string(), msft_rules());
		cases.insert("enron".to_string(), enron_rules());
		cases.insert("kitzmiller".to_string(), kitzmiller_rules());

		Self::new(default_case, cases)
	}

	pub fn default_case(&self) -> &str {
		&self.default_case
	}

	pub fn for_case(&self, case_id: &str) -> &CaseRules {
		static EMPTY: CaseRules = CaseRules { rewrites: Vec::new(), hot_phrases: Vec::new() };

		self.cases.get(case_id).or_else(|| self.cases.get(&self.default_case)).unwrap_or(&EMPTY)
	}
}

/// First rule, in table order, whose trigger occurs in `text` (case-insensitive).
pub fn first_match<'a, T>(rules: &'a [PhraseRule<T>], text: &str) -> Option<&'a PhraseRule<T>> {
	let lowered = text.to_lowercase();

	rules.iter().find(|rule| !rule.trigger.is_empty() && lowered.contains(rule.trigger.as_str()))
}

fn rewrite(trigger: &str, query: &str) -> PhraseRule<String> {
	PhraseRule::new(trigger, query.to_string())
}

fn hot(trigger: &str, objection_type: ObjectionType, score: u8) -> PhraseRule<HotPhrase> {
	PhraseRule::new(trigger, HotPhrase { objection_type, score })
}

fn msft_rules() -> CaseRules {
	CaseRules {
		rewrites: vec![
			rewrite(
				"kill netscape",
				"strategy to kill Netscape eliminate browser competition monopoly intent",
			),
			rewrite(
				"air supply",
				"cut off Netscape air supply Maritz email browser give away free predatory",
			),
			rewrite(
				"godfather",
				"June 1995 Netscape meeting visit from the Godfather divide browser market",
			),
			rewrite(
				"control the browser",
				"Exhibit 347 control the browser control the platform VP memo",
			),
			rewrite(
				"mac office",
				"Apple Mac Office license cancellation threat Internet Explorer default",
			),
			rewrite("java", "Sun Java compatibility Windows incompatible implementation"),
			rewrite("exhibit", "trial exhibit email authentication personal knowledge"),
		],
		hot_phrases: vec![
			hot("kill netscape", ObjectionType::AssumesFacts, 92),
			hot("godfather", ObjectionType::Hearsay, 94),
			hot("air supply", ObjectionType::LackOfFoundation, 89),
			hot("control the browser", ObjectionType::Hearsay, 88),
			hot("cancel mac office", ObjectionType::AssumesFacts, 90),
			hot("deliberately broke java", ObjectionType::Hearsay, 90),
		],
	}
}

fn enron_rules() -> CaseRules {
	CaseRules {
		rewrites: vec![
			rewrite(
				"mark-to-market",
				"mark-to-market accounting future profits booked immediately GAAP",
			),
			rewrite(
				"raptor",
				"Raptor special purpose vehicles hide debt hedging Enron stock capitalization",
			),
			rewrite(
				"arthur andersen",
				"Arthur Andersen obstruction conviction overturned Supreme Court prejudice",
			),
			rewrite(
				"california",
				"California energy market manipulation trading strategies Death Star",
			),
			rewrite("death star", "Death Star Fat Boy Get Shorty trading strategies names"),
			rewrite("lying", "Fastow testimony hidden losses credibility cooperation deal"),
			rewrite("sell", "insider stock sales employees told to buy diversification"),
		],
		hot_phrases: vec![
			hot("arthur andersen", ObjectionType::Prejudicial, 95),
			hot("hide debt", ObjectionType::AssumesFacts, 91),
			hot("manipulate the california", ObjectionType::AssumesFacts, 88),
			hot("death star", ObjectionType::Argumentative, 87),
			hot("is he lying", ObjectionType::Argumentative, 93),
			hot("book future profits", ObjectionType::Mischaracterization, 86),
		],
	}
}

fn kitzmiller_rules() -> CaseRules {
	CaseRules {
		rewrites: vec![
			rewrite(
				"peer-reviewed",
				"intelligent design peer-reviewed scientific journals publication record",
			),
			rewrite(
				"flagellum",
				"bacterial flagellum irreducible complexity Type III secretion system",
			),
			rewrite("astrology", "definition of science astrology qualifies Behe testimony"),
			rewrite(
				"pandas",
				"Of Pandas and People textbook authorship page 99 intelligent agency",
			),
			rewrite(
				"cdesign",
				"cdesign proponentsists creationism drafts find-and-replace",
			),
			rewrite(
				"testable",
				"intelligent design testable predictions falsifiable experiment",
			),
		],
		hot_phrases: vec![
			hot("padian testified", ObjectionType::Mischaracterization, 96),
			hot("page 99", ObjectionType::LackOfFoundation, 90),
			hot("astrology", ObjectionType::Argumentative, 87),
			hot("set the bar so high", ObjectionType::Argumentative, 92),
			hot("cdesign proponentsists", ObjectionType::Prejudicial, 88),
		],
	}
}
