//! OData query options for Graph requests.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Largest `$top` Graph accepts on directory collections.
pub const MAX_PAGE_SIZE: usize = 999;

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>');

/// Query options for a Graph request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataQuery {
    pub filter: Option<String>,
    pub search: Option<String>,
    pub select: Vec<String>,
    pub orderby: Vec<String>,
    pub top: Option<usize>,
    pub count: bool,
    /// Send `ConsistencyLevel: eventual`, required for `$search` and advanced filters.
    pub eventual_consistency: bool,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn orderby(mut self, clause: impl Into<String>) -> Self {
        self.orderby.push(clause.into());
        self
    }

    pub fn top(mut self, top: usize) -> Self {
        self.top = Some(top.min(MAX_PAGE_SIZE));
        self
    }

    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn eventual_consistency(mut self) -> Self {
        self.eventual_consistency = true;
        self
    }

    /// Query parameters in the order Graph documents them.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(ref filter) = self.filter {
            params.push(("$filter", filter.clone()));
        }
        if let Some(ref search) = self.search {
            params.push(("$search", search.clone()));
        }
        if !self.select.is_empty() {
            params.push(("$select", self.select.join(",")));
        }
        if !self.orderby.is_empty() {
            params.push(("$orderby", self.orderby.join(",")));
        }
        if let Some(top) = self.top {
            params.push(("$top", top.to_string()));
        }
        if self.count {
            params.push(("$count", "true".to_string()));
        }

        params
    }
}

/// Escape a value for use inside a single-quoted OData string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Encode a caller-supplied identifier for use as one URL path segment.
pub fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_empty() {
        let query = ODataQuery::new();
        assert!(query.to_pairs().is_empty());
    }

    #[test]
    fn test_query_full() {
        let query = ODataQuery::new()
            .filter("startswith(displayName,'Eng')")
            .select(&["id", "displayName"])
            .orderby("displayName")
            .top(50)
            .count();

        let pairs = query.to_pairs();
        assert_eq!(pairs[0], ("$filter", "startswith(displayName,'Eng')".to_string()));
        assert_eq!(pairs[1], ("$select", "id,displayName".to_string()));
        assert_eq!(pairs[2], ("$orderby", "displayName".to_string()));
        assert_eq!(pairs[3], ("$top", "50".to_string()));
        assert_eq!(pairs[4], ("$count", "true".to_string()));
    }

    #[test]
    fn test_top_is_capped() {
        assert_eq!(ODataQuery::new().top(5000).top, Some(MAX_PAGE_SIZE));
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("alice@contoso.com"), "alice@contoso.com");
        assert_eq!(segment("a/b?c"), "a%2Fb%3Fc");
        assert_eq!(segment("50%"), "50%25");
    }

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote("O'Brien"), "'O''Brien'");
        assert_eq!(quote("plain"), "'plain'");
    }
}
