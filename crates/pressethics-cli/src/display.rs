//! Terminal rendering: verdict card, precedent list, clause table, stage progress.
//!
//! Cards go to stdout; progress lines go to stderr so `--json` output stays clean.

use std::fmt::Write as _;

use pressethics_ai::PrecedentTally;
use pressethics_core::{CODE, ClauseId, EthicsClause, Outcome, SimilarCase};
use pressethics_pipeline::{ProgressSink, RunReport, Stage, StageEvent, StageStatus};

const PREVIEW_CHARS: usize = 160;

// ── Verdict ──

pub fn verdict_card(report: &RunReport) -> String {
    let verdict = report.verdict();
    let mut out = String::new();

    let _ = writeln!(out, "=== 심의 결과 ===");
    let _ = writeln!(out, "{}", report.article.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "  {:<10} {}", "URL", report.article.url);
    let outcome = match verdict.outcome {
        Outcome::Violation => "위반",
        Outcome::NoViolation => "위반 없음",
    };
    let _ = writeln!(out, "  {:<10} {outcome}", "결정");
    for citation in &verdict.citations {
        let _ = writeln!(out, "  {:<10} {citation}", "인용 조항");
    }
    let _ = writeln!(
        out,
        "  {:<10} {}{}",
        "유사 사례",
        report.tally.summary(),
        top_clauses(&report.tally)
    );
    if !report.annotations.is_empty() {
        let _ = writeln!(out, "  {:<10} {}개", "이미지 분석", report.annotations.len());
    }
    if report.review.passed {
        let _ = writeln!(out, "  {:<10} 통과", "검토");
    } else {
        let _ = writeln!(out, "  {:<10} 의견 {}건", "검토", report.review.issues.len());
        for issue in &report.review.issues {
            let _ = writeln!(out, "    - {issue}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "최종 심의문");
    for line in verdict.final_text.lines().filter(|l| !l.trim().is_empty()) {
        let _ = writeln!(out, "  {}", line.trim());
    }
    out
}

fn top_clauses(tally: &PrecedentTally) -> String {
    let top = tally.top_clauses(3);
    if top.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = top.iter().map(|(id, n)| format!("{id} ×{n}")).collect();
    format!(" (주요 조항: {})", parts.join(", "))
}

pub fn print_verdict_card(report: &RunReport) {
    print!("{}", verdict_card(report));
}

// ── Precedents ──

pub fn case_list(cases: &[SimilarCase]) -> String {
    let mut out = String::new();
    for (i, case) in cases.iter().enumerate() {
        let clause = case
            .matched_clause_id
            .map(|id| format!(" {id}「{}」", id.clause().title))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>2}. [{:.3}] {} · {}{clause}",
            i + 1,
            case.similarity_score,
            case.case_id,
            case.prior_verdict.as_str()
        );
        let _ = writeln!(out, "    {}", preview(&case.case_text));
    }
    out
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated = pressethics_core::types::truncate_chars(&flat, PREVIEW_CHARS);
    if truncated.len() < flat.len() {
        format!("{truncated}…")
    } else {
        flat
    }
}

pub fn print_cases(cases: &[SimilarCase]) {
    print!("{}", case_list(cases));
    let tally = PrecedentTally::from_cases(cases);
    println!();
    println!("{}{}", tally.summary(), top_clauses(&tally));
}

// ── Clauses ──

pub fn clause_block(clause: &EthicsClause) -> String {
    let mut out = format!("{}「{}」\n", clause.clause_id(), clause.title);
    for (i, item) in clause.items.iter().enumerate() {
        let mark = pressethics_core::citation::circled(i as u8 + 1).unwrap_or(' ');
        let _ = writeln!(out, "  {mark} {item}");
    }
    out
}

/// One clause, or the whole code when `only` is `None`.
pub fn print_clauses(only: Option<ClauseId>) {
    match only {
        Some(id) => print!("{}", clause_block(id.clause())),
        None => {
            for clause in CODE.iter() {
                println!("{}", clause_block(clause));
            }
        }
    }
}

// ── Progress ──

/// Writes one line per finished stage to stderr, e.g. `[3/5] 유사 사례 검색 … 완료`.
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn on_event(&self, event: &StageEvent) {
        if event.status != StageStatus::Started {
            eprintln!("{}", progress_line(event));
        }
    }
}

pub fn progress_line(event: &StageEvent) -> String {
    let status = match event.status {
        StageStatus::Started => "시작",
        StageStatus::Completed => "완료",
        StageStatus::Skipped => "건너뜀",
        StageStatus::Failed => "실패",
    };
    let mut line = format!(
        "[{}/{}] {} … {status}",
        event.stage.position(),
        Stage::ALL.len(),
        event.stage.label()
    );
    if let Some(detail) = &event.detail {
        let _ = write!(line, " ({detail})");
    }
    line
}

/// `AIza…(39 chars)`: enough to tell keys apart, never the whole secret.
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}…({} chars)", key.chars().count())
}
