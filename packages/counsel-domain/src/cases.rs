//! Static trial scripts replayed by the demo pipeline.

use serde::Serialize;

pub const UNKNOWN_CASE_TITLE: &str = "Unknown Case";

struct CaseScript {
	id: &'static str,
	title: &'static str,
	lines: &'static [(&'static str, &'static str)],
}

const CATALOG: &[CaseScript] = &[
	CaseScript { id: "msft", title: "US v. Microsoft", lines: MSFT_LINES },
	CaseScript { id: "enron", title: "US v. Skilling (Enron)", lines: ENRON_LINES },
	CaseScript { id: "kitzmiller", title: "Kitzmiller v. Dover", lines: KITZMILLER_LINES },
];

const MSFT_LINES: &[(&str, &str)] = &[
	("JUDGE JACKSON", "Mr. Boies, you may continue your cross-examination."),
	("MR. BOIES (GOV)", "Mr. Gates, you claim Microsoft welcomes competition."),
	("BILL GATES", "That is correct. We innovate for customers."),
	(
		"MR. BOIES (GOV)",
		"Did you ever have a strategy to eliminate competitors in the browser market?",
	),
	("BILL GATES", "I... I don't recall using that specific language in any meeting."),
	("MR. BOIES (GOV)", "Let me show you Exhibit 334. Do you recognize this email?"),
	("BILL GATES", "I write thousands of emails. I cannot recall each one."),
	(
		"MR. BOIES (GOV)",
		"It says 'We need to cut off Netscape's air supply.' Did you write this?",
	),
	("BILL GATES", "I would need to see the full context of that communication."),
	(
		"MR. BOIES (GOV)",
		"Did you refer to the June 1995 meeting with Netscape as a 'visit from the Godfather'?",
	),
	("BILL GATES", "I did not attend that meeting personally."),
	("MR. BOIES (GOV)", "But you were briefed on its purpose, were you not?"),
	("BILL GATES", "I receive many briefings. That was years ago."),
	("MR. BOIES (GOV)", "Did Microsoft offer to divide the browser market with Netscape?"),
	("BILL GATES", "That would be illegal, so no."),
	(
		"MR. BOIES (GOV)",
		"Exhibit 347. Your VP of platforms wrote you must control the browser to control the platform. Agree?",
	),
	("BILL GATES", "The browser is part of the operating system. Integration benefits users."),
	("MR. BOIES (GOV)", "Why did Microsoft threaten to cancel Apple's Mac Office license?"),
	("BILL GATES", "I am not aware of any such threat being made."),
	("MR. BOIES (GOV)", "Let me show you Exhibit 358. An email to Steve Jobs dated August 1997."),
	("BILL GATES", "We had many business discussions with Apple about licensing."),
	(
		"MR. BOIES (GOV)",
		"It says: 'Make IE default or we cancel Mac Office.' How do you explain this?",
	),
	("BILL GATES", "I would characterize that as a negotiating position, not a threat."),
	("MR. BOIES (GOV)", "Did Apple make Internet Explorer the default browser shortly after?"),
	("BILL GATES", "Apple made its own business decisions."),
	("JUDGE JACKSON", "Mr. Gates, please answer the question directly."),
	("BILL GATES", "Yes, I believe they did change the default browser."),
	("MR. BOIES (GOV)", "Did you instruct employees to make Windows incompatible with Java?"),
	("BILL GATES", "We developed our own implementation of Java that worked better on Windows."),
	("MR. BOIES (GOV)", "Sun Microsystems says you deliberately broke Java compatibility. True?"),
	("BILL GATES", "Sun is a competitor. They have their own agenda."),
	("MR. BOIES (GOV)", "No further questions at this time, Your Honor."),
	("JUDGE JACKSON", "We'll take a fifteen minute recess."),
];

const ENRON_LINES: &[(&str, &str)] = &[
	("THE COURT", "Mr. Berkowitz, you may proceed with the cross-examination."),
	("MR. BERKOWITZ", "Mr. Skilling, let's discuss Enron's accounting practices."),
	("JEFF SKILLING", "Our accounting was aggressive but fully compliant with GAAP."),
	(
		"MR. BERKOWITZ",
		"Did you use mark-to-market accounting to book future profits immediately?",
	),
	("JEFF SKILLING", "It is the industry standard for energy trading companies."),
	(
		"MR. BERKOWITZ",
		"You booked ten years of projected profits on the first day of a contract?",
	),
	("JEFF SKILLING", "When you have a long-term contract, that is how mark-to-market works."),
	("MR. BERKOWITZ", "And if those profits never materialized, what happened?"),
	("JEFF SKILLING", "Adjustments would be made in subsequent quarters."),
	(
		"MR. BERKOWITZ",
		"Tell us about the Raptor vehicles. Were they designed to hide debt from shareholders?",
	),
	("JEFF SKILLING", "They were legitimate hedging instruments approved by our auditors."),
	(
		"MR. BERKOWITZ",
		"Arthur Andersen approved them, and they were later convicted of obstruction.",
	),
	("MR. PETROCELLI (DEF)", "Objection. That conviction was overturned by the Supreme Court."),
	(
		"THE COURT",
		"Sustained. The jury will disregard the reference to Arthur Andersen's conviction.",
	),
	("MR. BERKOWITZ", "Mr. Skilling, the Raptors were capitalized entirely with Enron stock, correct?"),
	("JEFF SKILLING", "That was one component of the structure."),
	("MR. BERKOWITZ", "So when Enron stock fell, the hedges became worthless?"),
	("JEFF SKILLING", "In hindsight, the structures had weaknesses."),
	("MR. BERKOWITZ", "Did Enron traders manipulate the California energy market?"),
	("JEFF SKILLING", "The market was flawed. We simply traded within its rules."),
	(
		"MR. BERKOWITZ",
		"Trading strategies called Death Star, Fat Boy, Get Shorty - those sound legitimate?",
	),
	(
		"JEFF SKILLING",
		"Traders give colorful names. I was not involved in day-to-day trading.",
	),
	("MR. BERKOWITZ", "Did you sell $60 million in Enron stock while telling employees to buy?"),
	(
		"JEFF SKILLING",
		"I sold stock for personal diversification, as is common for executives.",
	),
	("MR. BERKOWITZ", "In the months before bankruptcy, while the stock was collapsing?"),
	("JEFF SKILLING", "I had no knowledge of any impending problems at that time."),
	("MR. BERKOWITZ", "You resigned suddenly in August 2001. Why?"),
	("JEFF SKILLING", "Personal reasons. Family matters required my attention."),
	("MR. BERKOWITZ", "Three months before the largest bankruptcy in American history?"),
	("JEFF SKILLING", "I could not have predicted what would happen."),
	(
		"MR. BERKOWITZ",
		"Mr. Fastow testified you knew about the hidden losses. Is he lying?",
	),
	(
		"JEFF SKILLING",
		"Andrew has every incentive to implicate others to reduce his sentence.",
	),
	("MR. BERKOWITZ", "He received ten years in prison. You call that an incentive?"),
	("JEFF SKILLING", "It could have been much worse without his cooperation deal."),
	("MR. BERKOWITZ", "No further questions."),
];

const KITZMILLER_LINES: &[(&str, &str)] = &[
	("THE COURT", "Mr. Rothschild, you may begin your cross-examination."),
	(
		"MR. ROTHSCHILD",
		"Dr. Behe, you testified that intelligent design is a scientific theory.",
	),
	("MICHAEL BEHE", "Yes, it makes claims that can be tested."),
	(
		"MR. ROTHSCHILD",
		"Has intelligent design been published in peer-reviewed scientific journals?",
	),
	("MICHAEL BEHE", "The scientific establishment is hostile to new ideas."),
	(
		"MR. ROTHSCHILD",
		"Please answer the question. Has it been published in peer-reviewed journals?",
	),
	("MICHAEL BEHE", "Not in the traditional sense, no."),
	("MR. ROTHSCHILD", "You claim the bacterial flagellum is irreducibly complex."),
	("MICHAEL BEHE", "Yes. All forty parts must be present for it to function."),
	("MR. ROTHSCHILD", "Are you aware of the Type III secretion system?"),
	("MICHAEL BEHE", "I am aware of it."),
	("MR. ROTHSCHILD", "It uses ten proteins from the flagellum and has a different function."),
	("MICHAEL BEHE", "That does not explain how the flagellum itself evolved."),
	(
		"MR. ROTHSCHILD",
		"Let's look at your book 'Darwin's Black Box.' You define science broadly.",
	),
	("MICHAEL BEHE", "Science should follow the evidence wherever it leads."),
	("MR. ROTHSCHILD", "Under your definition, would astrology qualify as science?"),
	("MICHAEL BEHE", "I think it would, yes."),
	("MR. ROTHSCHILD", "Let's turn to 'Of Pandas and People.' Look at page 99."),
	("MR. MUISE (DEF)", "Objection, Dr. Behe didn't write that book."),
	("THE COURT", "He testified as an expert supporting its use. Overruled."),
	(
		"MR. ROTHSCHILD",
		"It says: 'Intelligent design means life began abruptly through an intelligent agency.'",
	),
	("MICHAEL BEHE", "That is one formulation of the concept."),
	(
		"MR. ROTHSCHILD",
		"In earlier drafts, the word 'creationism' was used instead of 'intelligent design.'",
	),
	("MICHAEL BEHE", "I was not involved in writing those drafts."),
	(
		"MR. ROTHSCHILD",
		"They even misspelled it as 'cdesign proponentsists' when doing find-and-replace.",
	),
	("THE COURT", "I note that for the record."),
	("MR. ROTHSCHILD", "Dr. Behe, can intelligent design make any testable predictions?"),
	(
		"MICHAEL BEHE",
		"It predicts we will find complex systems that cannot be explained by Darwinism.",
	),
	(
		"MR. ROTHSCHILD",
		"How would you test that? What experiment could disprove intelligent design?",
	),
	("MICHAEL BEHE", "If we found a detailed, testable pathway for complex systems."),
	("MR. ROTHSCHILD", "In ten years since your book, has no such pathway been found?"),
	("MICHAEL BEHE", "None that I find convincing."),
	(
		"MR. ROTHSCHILD",
		"You've set the bar so high that nothing would convince you, haven't you?",
	),
	("MICHAEL BEHE", "I'm simply asking for rigorous scientific evidence."),
	("MR. ROTHSCHILD", "No further questions, Your Honor."),
	("THE COURT", "Thank you. We'll adjourn until tomorrow morning at nine."),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utterance {
	pub speaker: String,
	pub text: String,
	/// Zero-based position within the case script.
	pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseContext {
	pub id: String,
	pub title: String,
	pub script: Vec<Utterance>,
}
impl CaseContext {
	pub fn is_known(&self) -> bool {
		CATALOG.iter().any(|case| case.id == self.id)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseSummary {
	pub id: &'static str,
	pub title: &'static str,
	pub utterances: usize,
}

pub fn case_ids() -> impl Iterator<Item = &'static str> {
	CATALOG.iter().map(|case| case.id)
}

pub fn summaries() -> Vec<CaseSummary> {
	CATALOG
		.iter()
		.map(|case| CaseSummary { id: case.id, title: case.title, utterances: case.lines.len() })
		.collect()
}

/// Resolves `case_id` against the catalog.
///
/// Unknown ids produce an ad-hoc context that keeps the requested id, so search filters and
/// verdict hashing still see what the caller asked for.
pub fn get(case_id: &str) -> CaseContext {
	let Some(case) = CATALOG.iter().find(|case| case.id == case_id) else {
		return CaseContext {
			id: case_id.to_string(),
			title: UNKNOWN_CASE_TITLE.to_string(),
			script: Vec::new(),
		};
	};
	let script = case
		.lines
		.iter()
		.enumerate()
		.map(|(position, (speaker, text))| Utterance {
			speaker: speaker.to_string(),
			text: text.to_string(),
			position,
		})
		.collect();

	CaseContext { id: case.id.to_string(), title: case.title.to_string(), script }
}
