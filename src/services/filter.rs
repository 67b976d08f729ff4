//! # 검색 / 필터 유틸리티
//!
//! 메모리에 올라온 작은 목록(노트, 트래커 할 일)을 검색어로 거르는 함수입니다.
//! 검색어를 공백으로 나눈 모든 토큰이 필드 중 하나에 (대소문자 무시) 포함돼야 합니다.

/// 검색 대상이 될 수 있는 타입 — 검색할 텍스트 필드들을 돌려줍니다.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// `query`의 모든 토큰이 `fields` 중 하나에 들어 있으면 true
///
/// 빈 검색어는 모든 항목과 일치합니다.
pub fn matches_query(query: &str, fields: &[&str]) -> bool {
    let lowered: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|token| lowered.iter().any(|field| field.contains(&token)))
}

/// 검색어로 목록을 거릅니다. 원래 순서는 유지됩니다.
pub fn filter_by_query<T: Searchable>(items: Vec<T>, query: Option<&str>) -> Vec<T> {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => items
            .into_iter()
            .filter(|item| matches_query(q, &item.search_fields()))
            .collect(),
        None => items,
    }
}
