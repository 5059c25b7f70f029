//! The Korean press ethics code (신문윤리실천요강): 16 fixed clauses.
//!
//! Each clause (조) has a title and a list of numbered items (①, ②, …).
//! The table is static and is the only source of valid clause ids: a
//! [`ClauseId`] cannot be constructed outside `1..=16`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::citation::circled;

/// Number of clauses in the code.
pub const CLAUSE_COUNT: u8 = 16;

/// Identifier of one of the 16 clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ClauseId(u8);

impl ClauseId {
    /// Returns `None` unless `id` is within `1..=16`.
    pub fn new(id: u8) -> Option<Self> {
        (1..=CLAUSE_COUNT).contains(&id).then_some(Self(id))
    }

    /// Widening constructor for ids parsed from text or Arrow columns.
    pub fn from_i64(id: i64) -> Option<Self> {
        u8::try_from(id).ok().and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The clause this id refers to.
    pub fn clause(self) -> &'static EthicsClause {
        &CODE[usize::from(self.0) - 1]
    }

    /// All 16 ids in order.
    pub fn all() -> impl Iterator<Item = ClauseId> {
        (1..=CLAUSE_COUNT).map(ClauseId)
    }
}

impl TryFrom<u8> for ClauseId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("clause id {value} outside 1..={CLAUSE_COUNT}"))
    }
}

impl From<ClauseId> for u8 {
    fn from(id: ClauseId) -> u8 {
        id.0
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "제{}조", self.0)
    }
}

/// One clause of the code.
#[derive(Debug)]
pub struct EthicsClause {
    pub id: u8,
    pub title: &'static str,
    pub items: &'static [&'static str],
}

impl EthicsClause {
    pub fn clause_id(&self) -> ClauseId {
        ClauseId(self.id)
    }

    /// Item text by 1-based item number.
    pub fn item(&self, number: u8) -> Option<&'static str> {
        let idx = usize::from(number).checked_sub(1)?;
        self.items.get(idx).copied()
    }

    /// Items joined into a single description line.
    pub fn description(&self) -> String {
        self.items.join(", ")
    }

    /// Canonical single-line form: `제N조「title」①item ②item …`.
    pub fn render(&self) -> String {
        let mut line = format!("제{}조「{}」", self.id, self.title);
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            // Items never exceed ⑩.
            if let Some(mark) = circled(i as u8 + 1) {
                line.push(mark);
            }
            line.push_str(item);
        }
        line
    }
}

/// Look up a clause by its number.
pub fn clause(id: u8) -> Option<&'static EthicsClause> {
    ClauseId::new(id).map(ClauseId::clause)
}

/// Render the whole code, one clause per line.
pub fn render_code() -> String {
    let mut out = String::from("#신문윤리실천요강:\n");
    let lines: Vec<String> = CODE.iter().map(EthicsClause::render).collect();
    out.push_str(&lines.join("\n"));
    out
}

pub static CODE: [EthicsClause; CLAUSE_COUNT as usize] = [
    EthicsClause {
        id: 1,
        title: "언론의 자유, 책임, 독립",
        items: &[
            "정치권력으로부터의 자유",
            "사회·경제 세력으로부터의 독립",
            "사회적 책임",
            "차별과 편견 금지",
            "사회적 약자 보호",
        ],
    },
    EthicsClause {
        id: 2,
        title: "취재 준칙",
        items: &[
            "신분 사칭·위장 금지",
            "자료 무단 이용 금지",
            "재난 및 사고 취재",
            "전화 및 디지털 기기 활용 취재",
            "도청 및 비밀촬영 금지",
            "부당한 금전 제공 금지",
        ],
    },
    EthicsClause {
        id: 3,
        title: "보도 준칙",
        items: &[
            "보도기사의 사실과 의견 구분",
            "공정 보도",
            "반론의 기회",
            "미확인 보도 명시 원칙",
            "보도자료 검증",
            "선정 보도 금지",
            "재난 보도의 신중",
            "자살 보도의 주의",
            "피의사실 보도",
            "표준어 사용",
        ],
    },
    EthicsClause {
        id: 4,
        title: "사법 보도 준칙",
        items: &["재판 부당 영향 금지", "판결문 등의 사전보도 금지"],
    },
    EthicsClause {
        id: 5,
        title: "취재원의 명시와 보호",
        items: &[
            "취재원 보호",
            "취재원 명시와 익명 조건",
            "제3자 비방과 익명보도 금지",
            "취재원과의 비보도 약속",
        ],
    },
    EthicsClause {
        id: 6,
        title: "보도유예 시한",
        items: &["보도유예 시한 연장 금지", "보도유예 시한의 효력 상실"],
    },
    EthicsClause {
        id: 7,
        title: "범죄보도와 인권존중",
        items: &[
            "피의자 및 피고인의 명예 존중",
            "피의자·피고인·참고인 등 촬영 신중",
            "범죄와 무관한 가족 보호",
            "성범죄 등의 2차 피해 방지",
            "미성년 피의자 신원 보호",
        ],
    },
    EthicsClause {
        id: 8,
        title: "저작물의 전재와 인용",
        items: &[
            "통신기사의 출처 명시",
            "타 언론사 보도 등의 표절 금지",
            "출판물 등의 표절 금지",
            "사진, 영상 등의 저작권 보호",
        ],
    },
    EthicsClause {
        id: 9,
        title: "평론의 원칙",
        items: &["사설의 정론성", "평론의 자유"],
    },
    EthicsClause {
        id: 10,
        title: "편집 지침",
        items: &[
            "제목의 원칙",
            "편집 변경 금지",
            "기고문 변경 금지",
            "기사 정정",
            "관련사진 게재",
            "사진 및 영상 조작 금지",
            "기사와 광고의 구분",
            "이용자의 권리 보호",
            "부당한 재전송 금지",
        ],
    },
    EthicsClause {
        id: 11,
        title: "명예와 신용존중",
        items: &["명예·신용 훼손 금지", "사자의 명예 존중"],
    },
    EthicsClause {
        id: 12,
        title: "사생활 보호",
        items: &[
            "사생활 침해 금지",
            "개인정보 무단 검색 등 금지",
            "사생활 등의 촬영 및 보도 금지",
            "공인의 사생활 보도",
        ],
    },
    EthicsClause {
        id: 13,
        title: "청소년과 어린이 보호",
        items: &[
            "청소년과 어린이 취재 보도",
            "범죄 보도와 청소년, 어린이 보호",
            "유해환경으로부터의 보호",
            "유괴·납치 보도제한 협조",
        ],
    },
    EthicsClause {
        id: 14,
        title: "정보의 부당이용금지",
        items: &[
            "소유 주식 등에 관한 보도 제한",
            "주식·부동산 등의 부당 거래 금지",
        ],
    },
    EthicsClause {
        id: 15,
        title: "언론인의 품위",
        items: &[
            "금품수수 및 향응, 청탁 금지",
            "부당한 집단 영향력 행사 금지",
            "광고·판매 등 영업행위 금지",
        ],
    },
    EthicsClause {
        id: 16,
        title: "공익의 정의",
        items: &["국가 안전 등", "공중 안녕", "범죄의 폭로", "공중의 오도 방지"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_sixteen_sequential_clauses() {
        assert_eq!(CODE.len(), 16);
        for (i, clause) in CODE.iter().enumerate() {
            assert_eq!(usize::from(clause.id), i + 1);
            assert!(!clause.items.is_empty(), "clause {} has no items", clause.id);
            assert!(clause.items.len() <= 10, "clause {} exceeds ⑩", clause.id);
        }
    }

    #[test]
    fn clause_id_bounds() {
        assert!(ClauseId::new(0).is_none());
        assert!(ClauseId::new(17).is_none());
        assert_eq!(ClauseId::new(1).unwrap().get(), 1);
        assert_eq!(ClauseId::new(16).unwrap().get(), 16);
        assert!(ClauseId::from_i64(-3).is_none());
        assert!(ClauseId::from_i64(300).is_none());
        assert_eq!(ClauseId::all().count(), 16);
    }

    #[test]
    fn crime_and_privacy_titles() {
        assert_eq!(clause(7).unwrap().title, "범죄보도와 인권존중");
        assert_eq!(clause(12).unwrap().title, "사생활 보호");
    }

    #[test]
    fn item_lookup_is_one_based() {
        let c = clause(7).unwrap();
        assert_eq!(c.item(2), Some("피의자·피고인·참고인 등 촬영 신중"));
        assert_eq!(c.item(0), None);
        assert_eq!(c.item(6), None);
    }

    #[test]
    fn render_uses_circled_items() {
        let line = clause(4).unwrap().render();
        assert_eq!(
            line,
            "제4조「사법 보도 준칙」①재판 부당 영향 금지 ②판결문 등의 사전보도 금지"
        );
    }

    #[test]
    fn render_code_lists_every_clause() {
        let code = render_code();
        assert!(code.starts_with("#신문윤리실천요강:"));
        assert_eq!(code.lines().count(), 17);
        assert!(code.contains("제3조「보도 준칙」①보도기사의 사실과 의견 구분"));
        assert!(code.contains("⑩표준어 사용"));
    }

    #[test]
    fn clause_id_serde_rejects_out_of_range() {
        let id: ClauseId = serde_json::from_str("7").unwrap();
        assert_eq!(id.get(), 7);
        assert!(serde_json::from_str::<ClauseId>("17").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }
}
