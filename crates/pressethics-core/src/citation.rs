//! Clause citation parsing and canonicalisation.
//!
//! Rulings cite the code as `제7조「범죄보도와 인권존중」②(피의자·피고인·참고인 등 촬영 신중)`.
//! Model output drifts from that form: wrong titles, a trailing `항`/`호`,
//! missing item text, or clause numbers that do not exist. [`scan`] finds
//! every citation, rewrites the valid ones into canonical form from the
//! clause table, and reports the rest as [`CitationIssue`]s.
//!
//! # Recognised shapes
//!
//! - `제N조` (bare clause)
//! - `제N조「title」` (title may be wrong or empty)
//! - `제N조「title」②`, `제N조②항`, `제N조「title」②호(anything)`
//!
//! # Algorithm
//!
//! 1. Match `제 N 조`, then an optional `「…」` title, then an optional circled
//!    item with optional `항`/`호` suffix and any parenthesised trailers.
//! 2. Unknown clause number → leave the text untouched, record `UnknownClause`.
//! 3. Known clause → replace the title with the table's title.
//! 4. Known item → append `(item text)`; unknown item → keep the bare mark,
//!    record `UnknownItem`, and cite the clause without an item.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clause::{self, ClauseId};

const CIRCLED_BASE: u32 = 0x2460; // ①

static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"제\s*(\d{1,3})\s*조(?:\s*「([^」]*)」)?(?:\s*([①-⑩])(?:\s*[항호])?(?:\s*\([^)]*\))*)?",
    )
    .expect("citation pattern compiles")
});

/// Circled numeral for 1..=10 (`①`..`⑩`).
pub fn circled(n: u8) -> Option<char> {
    if !(1..=10).contains(&n) {
        return None;
    }
    char::from_u32(CIRCLED_BASE + u32::from(n) - 1)
}

/// Inverse of [`circled`].
pub fn parse_circled(c: char) -> Option<u8> {
    let v = c as u32;
    (CIRCLED_BASE..CIRCLED_BASE + 10)
        .contains(&v)
        .then(|| (v - CIRCLED_BASE + 1) as u8)
}

/// A reference to a clause and optionally one of its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub clause: ClauseId,
    pub item: Option<u8>,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clause = self.clause.clause();
        write!(f, "제{}조「{}」", clause.id, clause.title)?;
        if let Some(n) = self.item
            && let (Some(mark), Some(text)) = (circled(n), clause.item(n))
        {
            write!(f, "{mark}({text})")?;
        }
        Ok(())
    }
}

/// A citation that could not be resolved against the clause table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CitationIssue {
    #[error("제{0}조 does not exist (the code has 제1조 to 제16조)")]
    UnknownClause(u32),

    #[error("{clause} has no item {item}")]
    UnknownItem { clause: ClauseId, item: u8 },
}

/// Result of [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationScan {
    /// Input text with valid citations rewritten to canonical form.
    pub text: String,
    /// Valid citations, deduplicated, in order of first appearance.
    pub citations: Vec<Citation>,
    pub issues: Vec<CitationIssue>,
}

/// Find, validate, and canonicalise every clause citation in `text`.
pub fn scan(text: &str) -> CitationScan {
    let mut citations: Vec<Citation> = Vec::new();
    let mut issues = Vec::new();

    let rewritten = CITATION_RE.replace_all(text, |caps: &Captures| {
        let number: u32 = caps[1].parse().unwrap_or(0);
        let Some(entry) = u8::try_from(number).ok().and_then(clause::clause) else {
            issues.push(CitationIssue::UnknownClause(number));
            return caps[0].to_string();
        };
        let id = entry.clause_id();

        let item = caps
            .get(3)
            .and_then(|m| m.as_str().chars().next())
            .and_then(parse_circled);

        let (citation, rendered) = match item {
            Some(n) if entry.item(n).is_some() => {
                let c = Citation {
                    clause: id,
                    item: Some(n),
                };
                (c, c.to_string())
            }
            Some(n) => {
                issues.push(CitationIssue::UnknownItem { clause: id, item: n });
                let c = Citation {
                    clause: id,
                    item: None,
                };
                let mark = circled(n).map(String::from).unwrap_or_default();
                (c, format!("{c}{mark}"))
            }
            None => {
                let c = Citation {
                    clause: id,
                    item: None,
                };
                (c, c.to_string())
            }
        };

        if !citations.contains(&citation) {
            citations.push(citation);
        }
        rendered
    });

    CitationScan {
        text: rewritten.into_owned(),
        citations,
        issues,
    }
}
