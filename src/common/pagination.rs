// src/common/pagination.rs

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Parâmetros de listagem: `?pageIndex=0&pageSize=10&search=abc`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_index: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
}

impl PageQuery {
    pub fn page_index(&self) -> i64 {
        self.page_index.unwrap_or(0).max(0)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.page_index() * self.page_size()
    }

    /// Padrão ILIKE já escapado, ou None quando a busca está vazia.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern)
    }
}

/// `abc` -> `%abc%`, escapando os curingas do LIKE (o escape padrão do Postgres é `\`).
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub row_count: i64,
    pub page_index: i64,
    pub page_size: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, row_count: i64, query: &PageQuery) -> Self {
        Self {
            data,
            row_count,
            page_index: query.page_index(),
            page_size: query.page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_offset() {
        let q = PageQuery::default();
        assert_eq!(q.page_index(), 0);
        assert_eq!(q.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(), 0);

        let q = PageQuery { page_index: Some(3), page_size: Some(25), search: None };
        assert_eq!(q.offset(), 75);
    }

    #[test]
    fn page_size_is_clamped() {
        let q = PageQuery { page_index: Some(-2), page_size: Some(10_000), search: None };
        assert_eq!(q.page_index(), 0);
        assert_eq!(q.page_size(), MAX_PAGE_SIZE);

        let q = PageQuery { page_index: None, page_size: Some(0), search: None };
        assert_eq!(q.page_size(), 1);
    }

    #[test]
    fn blank_search_means_no_filter() {
        let q = PageQuery { search: Some("   ".into()), ..Default::default() };
        assert_eq!(q.search_pattern(), None);

        let q = PageQuery { search: Some(" abc ".into()), ..Default::default() };
        assert_eq!(q.search_pattern().as_deref(), Some("%abc%"));
    }

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn query_string_uses_camel_case() {
        let q: PageQuery = serde_json::from_str(r#"{"pageIndex":2,"pageSize":5,"search":"x"}"#).unwrap();
        assert_eq!(q.offset(), 10);
        assert_eq!(q.search.as_deref(), Some("x"));
    }
}
