//! Drafted rulings and their review.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::citation::{self, Citation, CitationIssue};
use crate::clause::ClauseId;

/// The exact text of a "no violation" ruling.
pub const NO_VIOLATION: &str = "위반 없음";

/// Marker that opens the concluding sentence of a violation ruling.
const CONCLUSION_MARKER: &str = "따라서";

/// Phrases that conclude a violation ruling.
const VIOLATION_CONCLUSIONS: &[&str] = &["위반했다", "위반하였다", "위반한 것으로"];

/// Whether `text` states that no violation was found.
pub fn is_no_violation(text: &str) -> bool {
    text.contains(NO_VIOLATION) || text.contains("위반없음")
}

/// Whether `text` concludes that a clause was violated.
fn concludes_violation(text: &str) -> bool {
    VIOLATION_CONCLUSIONS.iter().any(|p| text.contains(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Violation,
    NoViolation,
}

/// A drafted or reviewed ethics ruling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    /// Always a subset of the 16 clauses; see [`ClauseId`].
    pub cited_clauses: BTreeSet<ClauseId>,
    pub citations: Vec<Citation>,
    /// Reasoning that precedes the concluding sentence.
    pub rationale_text: String,
    pub final_text: String,
}

impl Verdict {
    pub fn no_violation() -> Self {
        Self {
            outcome: Outcome::NoViolation,
            cited_clauses: BTreeSet::new(),
            citations: Vec::new(),
            rationale_text: String::new(),
            final_text: NO_VIOLATION.to_string(),
        }
    }

    /// Build a verdict from raw model output.
    ///
    /// Citations are canonicalised against the clause table; anything that
    /// does not resolve is returned as an issue and kept out of
    /// `cited_clauses`.
    pub fn from_model_text(text: &str) -> (Self, Vec<CitationIssue>) {
        let text = text.trim();
        let scan = citation::scan(text);

        // A clause mentioned while ruling it out does not make a violation.
        if is_no_violation(text) && !concludes_violation(text) {
            return (Self::no_violation(), scan.issues);
        }

        let cited_clauses = scan.citations.iter().map(|c| c.clause).collect();
        let rationale_text = split_rationale(&scan.text).to_string();
        let verdict = Self {
            outcome: Outcome::Violation,
            cited_clauses,
            citations: scan.citations,
            rationale_text,
            final_text: scan.text,
        };
        (verdict, scan.issues)
    }

    pub fn is_violation(&self) -> bool {
        self.outcome == Outcome::Violation
    }

    pub fn cites(&self, id: ClauseId) -> bool {
        self.cited_clauses.contains(&id)
    }
}

/// Text before the last concluding sentence, or the whole text if there is none.
fn split_rationale(text: &str) -> &str {
    match text.rfind(CONCLUSION_MARKER) {
        Some(idx) if idx > 0 => text[..idx].trim_end(),
        _ => text,
    }
}

/// Outcome of the review stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// True when no citation or format issue was found.
    pub passed: bool,
    pub issues: Vec<String>,
    pub verdict: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULING: &str = "위 기사는 강도 사건 피의자를 보도하면서 실명과 얼굴 사진을 게재했다. \
        그러나 이 보도는 유죄가 확정되지 않은 피의자의 신원을 그대로 드러냈다. \
        따라서 위 보도는 신문윤리실천요강 제7조「범죄보도」②항을 위반했다고 인정하여 주문과 같이 결정한다.";

    #[test]
    fn no_violation_text() {
        let (v, issues) = Verdict::from_model_text("  위반 없음\n");
        assert_eq!(v, Verdict::no_violation());
        assert!(issues.is_empty());
        assert!(!v.is_violation());
    }

    #[test]
    fn no_violation_without_space() {
        let (v, _) = Verdict::from_model_text("위반없음");
        assert_eq!(v.outcome, Outcome::NoViolation);
        assert_eq!(v.final_text, NO_VIOLATION);
    }

    #[test]
    fn violation_ruling_is_canonicalised() {
        let (v, issues) = Verdict::from_model_text(RULING);
        assert!(issues.is_empty());
        assert_eq!(v.outcome, Outcome::Violation);
        assert!(v.cites(ClauseId::new(7).unwrap()));
        assert_eq!(v.cited_clauses.len(), 1);
        assert!(
            v.final_text
                .contains("제7조「범죄보도와 인권존중」②(피의자·피고인·참고인 등 촬영 신중)")
        );
        assert!(v.rationale_text.ends_with("드러냈다."));
        assert!(!v.rationale_text.contains("따라서"));
    }

    #[test]
    fn unknown_clause_never_enters_cited_set() {
        let (v, issues) = Verdict::from_model_text(
            "따라서 위 보도는 제12조①과 제19조③을 위반했다고 인정한다.",
        );
        assert_eq!(issues, vec![CitationIssue::UnknownClause(19)]);
        assert_eq!(
            v.cited_clauses.iter().map(|c| c.get()).collect::<Vec<_>>(),
            vec![12]
        );
    }

    #[test]
    fn violation_mentioning_no_violation_phrase_stays_violation() {
        let (v, _) = Verdict::from_model_text(
            "유사 사례는 위반 없음으로 결정되었으나, 따라서 위 보도는 제3조⑥을 위반했다.",
        );
        assert_eq!(v.outcome, Outcome::Violation);
    }

    #[test]
    fn no_violation_mentioning_a_clause_stays_no_violation() {
        let (v, _) = Verdict::from_model_text(
            "위반 없음. 제7조「범죄보도」에 해당하는 내용은 확인되지 않는다.",
        );
        assert_eq!(v.outcome, Outcome::NoViolation);
        assert!(v.cited_clauses.is_empty());
        assert_eq!(v.final_text, NO_VIOLATION);
    }

    #[test]
    fn rationale_without_conclusion_is_whole_text() {
        assert_eq!(split_rationale("제3조 위반."), "제3조 위반.");
        assert_eq!(split_rationale("따라서 위반."), "따라서 위반.");
    }
}
