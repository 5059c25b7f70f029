//! Korean prompt text for the three model calls.
//!
//! Every prompt that asks for a ruling carries the full 16-clause code so
//! the model can only cite what exists.

use pressethics_ai::PrecedentTally;
use pressethics_core::clause::render_code;
use pressethics_core::types::truncate_chars;
use pressethics_core::{Article, ImageAnnotation, SimilarCase, NO_VIOLATION};

/// Longest precedent text quoted in the drafting prompt.
pub const CASE_TEXT_MAX_CHARS: usize = 1200;

/// Article context given alongside each image.
pub const IMAGE_CONTEXT_MAX_CHARS: usize = 500;

const DRAFT_ROLE: &str = "당신은 한국신문윤리위원회의 심의위원입니다. 아래 신문윤리실천요강에 따라 기사를 심의하고 심의문을 작성하세요.";

const DRAFT_INSTRUCTIONS: &str = "#심의 지침:
1. 신문윤리실천요강을 조항별로 검토하되 보수적으로 판단한다.
2. 명백하고 심각한 위반만 지적한다. 의심스럽거나 경미하거나 불분명한 사안은 \"위반 없음\"으로 판단한다.
3. 유사 사례는 참고만 하고, 해당 기사의 구체적 내용과 맥락을 기준으로 독립적으로 판단한다.
4. 특정 단체나 기업을 지나치게 칭찬하고 홍보하는 기사는 제1조②(사회·경제 세력으로부터의 독립) 또는 제10조⑦(기사와 광고의 구분) 적용을 검토한다. 단순한 활동 소개는 위반이 아니다.

#작성 형식:
[위반 없음] \"위반 없음\" 네 글자만 출력한다. 설명이나 이유를 덧붙이지 않는다.
[위반] 아래 네 부분을 소제목이나 번호 없이 자연스러운 문장으로 이어서 쓴다.
- 기사 요약 2~3문장. \"위 기사는 ○○○에 대해 보도하면서\"로 시작한다.
- 문제점 1~2문장. \"그러나 이 보도는\" 등으로 문제를 지적한다.
- 규정 근거 1~2문장. 신문윤리실천요강에 비추어 위반의 근거를 제시한다.
- 결론 한 문장. 반드시 \"따라서 위 보도는 신문윤리실천요강 제○조「조항명」○(세부내용)을 위반했다고 인정하여 주문과 같이 결정한다.\" 형식을 따른다.
전체 6문장 이상으로 쓰고, \"1)\" \"2)\" 같은 번호나 소제목은 쓰지 않는다.";

const REVIEW_ROLE: &str = "당신은 신문윤리위원회 검토 담당자입니다. 생성된 심의문을 검토하고 수정하세요.";

const REVIEW_INSTRUCTIONS: &str = "#검토 임무:
1. 조항 정확성: 인용된 조항 번호와 조항명, 세부 항목이 신문윤리실천요강에 실제로 있는지 대조하고 틀린 부분을 고친다.
2. 기사 관련성: 심의문이 기사 내용과 일치하는지 확인하고 기사에 없는 내용은 삭제한다.
3. 형식: \"1)\" \"2)\" 같은 번호와 소제목을 삭제하고 기사 요약, 문제점, 근거, 결론(\"따라서 위 보도는...\") 순서의 문장체로 고친다.
4. 검토 의견 제거: \"검토 결과\", \"심의문에서 언급된\", \"확인되지 않습니다\" 같은 검토자의 코멘트를 포함하지 않는다.

수정된 최종 심의문만 출력하시오.";

/// Phrases that only appear when a reviewer comments on the ruling instead of rewriting it.
pub const REVIEWER_META_PHRASES: &[&str] = &[
    "검토 결과",
    "검토 의견",
    "심의문에서 언급된",
    "확인되지 않습니다",
    "수정된 심의문",
];

pub fn image_prompt(article: &Article) -> String {
    let mut prompt = String::from("이 이미지를 한국어로 상세히 설명해주세요.");
    if !article.title.is_empty() || !article.body_text.is_empty() {
        prompt.push_str(" 이미지에 나온 인물, 얼굴 노출 여부, 장소, 글자를 빠짐없이 적고, 아래 기사와 어떤 관련이 있는지도 설명하세요.\n\n#기사:\n");
        prompt.push_str(&article.excerpt(IMAGE_CONTEXT_MAX_CHARS));
    }
    prompt
}

/// Numbered precedent list, e.g. `1. [위반 · 제7조] ...`.
pub fn similar_cases_section(cases: &[SimilarCase]) -> String {
    cases
        .iter()
        .enumerate()
        .map(|(i, case)| {
            let label = match case.matched_clause_id {
                Some(clause) => format!("{} · {clause}", case.prior_verdict.as_str()),
                None => case.prior_verdict.as_str().to_string(),
            };
            format!(
                "{}. [{label}] {}",
                i + 1,
                truncate_chars(case.case_text.trim(), CASE_TEXT_MAX_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn no_violation_hint(tally: &PrecedentTally) -> Option<String> {
    tally.leans_no_violation().then(|| {
        format!(
            "**중요**: 유사 사례 {}개 중 {}개가 '{NO_VIOLATION}'입니다. 이 기사도 '{NO_VIOLATION}'을 강력하게 고려하십시오.",
            tally.total(),
            tally.no_violations
        )
    })
}

pub fn draft_prompt(
    article: &Article,
    annotations: &[ImageAnnotation],
    cases: &[SimilarCase],
    tally: &PrecedentTally,
    max_article_chars: usize,
) -> String {
    let mut prompt = format!(
        "{DRAFT_ROLE}\n\n{}\n\n{DRAFT_INSTRUCTIONS}\n\n#기사:\n{}",
        render_code(),
        article.excerpt(max_article_chars)
    );
    if !annotations.is_empty() {
        prompt.push_str("\n\n#이미지:");
        for (i, annotation) in annotations.iter().enumerate() {
            prompt.push_str(&format!("\n[{}] {}", i + 1, annotation.description.trim()));
        }
    }
    if !cases.is_empty() {
        prompt.push_str("\n\n#유사사례:\n");
        prompt.push_str(&similar_cases_section(cases));
        if let Some(hint) = no_violation_hint(tally) {
            prompt.push_str("\n\n");
            prompt.push_str(&hint);
        }
    }
    prompt
}

pub fn review_prompt(article: &Article, draft_text: &str, max_article_chars: usize) -> String {
    format!(
        "{REVIEW_ROLE}\n\n#분석 대상 기사:\n제목: {}\n본문: {}\n\n#생성된 심의문:\n{}\n\n{}\n\n{REVIEW_INSTRUCTIONS}",
        article.title,
        article.body_excerpt(max_article_chars),
        draft_text.trim(),
        render_code()
    )
}
