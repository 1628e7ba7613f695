//! Per-session search response cache keyed by the exact query text.

use std::collections::{HashMap, VecDeque};

use crate::messages::SearchResponse;

/// Maps query strings to the last response received for them.
///
/// Keys are compared verbatim: `"rust"`, `"Rust"` and `"rust "` are three
/// different entries. Unbounded unless built with [`ResponseCache::with_capacity_limit`].
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: HashMap<String, SearchResponse>,
    insertion_order: VecDeque<String>,
    limit: Option<usize>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` entries, evicting the oldest inserted key first.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    pub fn get(&self, query: &str) -> Option<&SearchResponse> {
        self.entries.get(query)
    }

    /// Store `response` for `query`, replacing any previous entry.
    pub fn put(&mut self, query: impl Into<String>, response: SearchResponse) {
        let query = query.into();
        if self.entries.insert(query.clone(), response).is_some() {
            return;
        }
        self.insertion_order.push_back(query);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                match self.insertion_order.pop_front() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries.contains_key(query)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::SearchResult;

    fn response(answer: &str) -> SearchResponse {
        SearchResponse {
            answer: answer.into(),
            search_results: vec![SearchResult {
                href: "https://example.com".into(),
                title: "Example".into(),
                body: "snippet".into(),
            }],
            deep_analysis: false,
        }
    }

    #[test]
    fn lookup_is_exact_match() {
        let mut cache = ResponseCache::new();
        cache.put("rust", response("a"));
        assert_eq!(cache.get("rust").map(|r| r.answer.as_str()), Some("a"));
        assert!(cache.get("Rust").is_none());
        assert!(cache.get("rust ").is_none());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let mut cache = ResponseCache::new();
        cache.put("q", response("old"));
        cache.put("q", response("new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("q").unwrap().answer, "new");
    }

    #[test]
    fn unbounded_by_default() {
        let mut cache = ResponseCache::new();
        for i in 0..500 {
            cache.put(format!("q{i}"), response("a"));
        }
        assert_eq!(cache.len(), 500);
        assert!(cache.contains("q0"));
    }

    #[test]
    fn capacity_limit_evicts_oldest_insert() {
        let mut cache = ResponseCache::with_capacity_limit(2);
        cache.put("a", response("1"));
        cache.put("b", response("2"));
        cache.put("a", response("1b"));
        cache.put("c", response("3"));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }
}
