//! Outcome statistics over retrieved precedents.
//!
//! The drafter uses the tally to nudge the model toward "위반 없음" when the
//! nearest prior rulings mostly found no violation, and the CLI prints it
//! next to the verdict.

use std::collections::BTreeMap;

use pressethics_core::{ClauseId, PriorVerdict, SimilarCase};
use serde::Serialize;

/// Minimum number of "no violation" precedents that triggers the drafting hint.
pub const NO_VIOLATION_HINT_THRESHOLD: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrecedentTally {
    pub violations: usize,
    pub no_violations: usize,
    /// Matched clause → number of precedents citing it.
    pub clause_counts: BTreeMap<ClauseId, usize>,
}

impl PrecedentTally {
    pub fn from_cases(cases: &[SimilarCase]) -> Self {
        let mut tally = Self::default();
        for case in cases {
            match case.prior_verdict {
                PriorVerdict::Violation => tally.violations += 1,
                PriorVerdict::NoViolation => tally.no_violations += 1,
            }
            if let Some(clause) = case.matched_clause_id {
                *tally.clause_counts.entry(clause).or_default() += 1;
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.violations + self.no_violations
    }

    /// True when enough precedents found no violation to warrant the hint.
    pub fn leans_no_violation(&self) -> bool {
        self.no_violations >= NO_VIOLATION_HINT_THRESHOLD
    }

    /// Clauses by descending frequency, ties broken by clause number.
    pub fn top_clauses(&self, n: usize) -> Vec<(ClauseId, usize)> {
        let mut ranked: Vec<(ClauseId, usize)> =
            self.clause_counts.iter().map(|(&c, &k)| (c, k)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Korean one-liner, e.g. `위반 3/5, 위반 없음 2/5`.
    pub fn summary(&self) -> String {
        let total = self.total();
        format!(
            "위반 {}/{total}, 위반 없음 {}/{total}",
            self.violations, self.no_violations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, verdict: PriorVerdict, clause: Option<u8>) -> SimilarCase {
        SimilarCase {
            case_id: id.into(),
            case_text: format!("사례 {id}"),
            matched_clause_id: clause.and_then(ClauseId::new),
            prior_verdict: verdict,
            similarity_score: 0.8,
        }
    }

    #[test]
    fn counts_outcomes_and_clauses() {
        let tally = PrecedentTally::from_cases(&[
            case("a", PriorVerdict::Violation, Some(7)),
            case("b", PriorVerdict::Violation, Some(12)),
            case("c", PriorVerdict::Violation, Some(7)),
            case("d", PriorVerdict::NoViolation, None),
            case("e", PriorVerdict::NoViolation, None),
        ]);
        assert_eq!(tally.violations, 3);
        assert_eq!(tally.no_violations, 2);
        assert_eq!(tally.total(), 5);
        assert!(!tally.leans_no_violation());
        assert_eq!(
            tally.top_clauses(5),
            vec![
                (ClauseId::new(7).unwrap(), 2),
                (ClauseId::new(12).unwrap(), 1)
            ]
        );
        assert_eq!(tally.summary(), "위반 3/5, 위반 없음 2/5");
    }

    #[test]
    fn four_no_violation_precedents_trigger_hint() {
        let cases: Vec<_> = (0..4)
            .map(|i| case(&i.to_string(), PriorVerdict::NoViolation, None))
            .chain([case("v", PriorVerdict::Violation, Some(3))])
            .collect();
        assert!(PrecedentTally::from_cases(&cases).leans_no_violation());
    }

    #[test]
    fn ties_ordered_by_clause_number() {
        let tally = PrecedentTally::from_cases(&[
            case("a", PriorVerdict::Violation, Some(12)),
            case("b", PriorVerdict::Violation, Some(3)),
        ]);
        let top = tally.top_clauses(1);
        assert_eq!(top, vec![(ClauseId::new(3).unwrap(), 1)]);
    }

    #[test]
    fn empty_tally() {
        let tally = PrecedentTally::from_cases(&[]);
        assert_eq!(tally.total(), 0);
        assert!(tally.top_clauses(3).is_empty());
    }
}
