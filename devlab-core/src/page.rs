//! Cursor pagination primitives shared by every list endpoint.
//!
//! The API pages with `limit` + `starting_after` (the id of the last item
//! on the previous page) and answers with a resource-keyed array plus
//! `has_more` / `total_count`. Services normalize that envelope into
//! [`Page`].

/// Query parameters accepted by list endpoints.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    limit: Option<u32>,
    starting_after: Option<String>,
    filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn starting_after(mut self, cursor: impl Into<String>) -> Self {
        self.starting_after = Some(cursor.into());
        self
    }

    /// Add a resource-specific filter (e.g. `status=running`, `name=web`).
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Flatten into query parameters, omitting unset fields.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 2);
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(cursor) = &self.starting_after {
            params.push(("starting_after".to_string(), cursor.clone()));
        }
        params.extend(self.filters.iter().cloned());
        params
    }
}

/// Anything with a server-assigned id, usable as a pagination cursor.
pub trait Identified {
    fn id(&self) -> &str;
}

/// One page of a listed resource.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            total_count: None,
        }
    }
}

impl<T: Identified> Page<T> {
    /// Cursor for the next page: the id of the last item, when the server
    /// says there is more.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_more {
            self.items.last().map(|item| item.id())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(String);

    impl Identified for Row {
        fn id(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn params_omit_unset_fields() {
        assert!(ListQuery::new().to_params().is_empty());

        let params = ListQuery::new()
            .limit(25)
            .starting_after("dbx_9")
            .filter("status", "running")
            .to_params();
        assert_eq!(
            params,
            vec![
                ("limit".to_string(), "25".to_string()),
                ("starting_after".to_string(), "dbx_9".to_string()),
                ("status".to_string(), "running".to_string()),
            ]
        );
    }

    #[test]
    fn next_cursor_requires_has_more() {
        let page = Page {
            items: vec![Row("a".into()), Row("b".into())],
            has_more: true,
            total_count: Some(10),
        };
        assert_eq!(page.next_cursor(), Some("b"));

        let page = Page {
            items: vec![Row("a".into())],
            has_more: false,
            total_count: None,
        };
        assert_eq!(page.next_cursor(), None);
    }

    #[test]
    fn empty_page_has_no_cursor() {
        let page: Page<Row> = Page::empty();
        assert_eq!(page.next_cursor(), None);
    }

    proptest::proptest! {
        /// Flattened params keep a fixed order: limit, cursor, then filters.
        #[test]
        fn params_keep_field_order(
            limit in 1u32..500,
            cursor in "[a-z0-9_]{1,12}",
            nfilters in 0usize..4,
        ) {
            let mut query = ListQuery::new().limit(limit).starting_after(cursor.clone());
            for i in 0..nfilters {
                query = query.filter(format!("k{i}"), "v");
            }
            let params = query.to_params();
            proptest::prop_assert_eq!(params.len(), 2 + nfilters);
            proptest::prop_assert_eq!(params[0].0.as_str(), "limit");
            proptest::prop_assert_eq!(params[0].1.as_str(), limit.to_string());
            proptest::prop_assert_eq!(params[1].1.as_str(), cursor.as_str());
        }

        /// next_cursor is exactly the last id, and only when has_more.
        #[test]
        fn cursor_tracks_last_item(ids in proptest::collection::vec("[a-z]{1,6}", 1..10), has_more: bool) {
            let last = ids.last().unwrap().clone();
            let page = Page {
                items: ids.into_iter().map(Row).collect(),
                has_more,
                total_count: None,
            };
            proptest::prop_assert_eq!(page.next_cursor(), has_more.then_some(last.as_str()));
        }
    }
}
