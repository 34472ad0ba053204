//! Cursor-pagination bookkeeping for list panels.
//!
//! The API pages forward-only (`starting_after` = last id of the previous
//! page), so going back means remembering the cursor each visited page was
//! fetched with. The pager keeps that stack; it never touches the network.

/// One page fetch the worker should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub starting_after: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Pager {
    limit: u32,
    /// Cursor each visited page was fetched with; `stack[0]` is `None`
    /// (page one has no cursor). Never empty.
    stack: Vec<Option<String>>,
    has_more: bool,
    next_cursor: Option<String>,
}

impl Pager {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            stack: vec![None],
            has_more: false,
            next_cursor: None,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.max(1);
    }

    /// 1-based page number of the current page.
    pub fn page_number(&self) -> usize {
        self.stack.len()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Record what the server said about the page we just received.
    pub fn record(&mut self, has_more: bool, next_cursor: Option<String>) {
        self.has_more = has_more && next_cursor.is_some();
        self.next_cursor = next_cursor;
    }

    /// Request for re-fetching the current page (refresh / after actions).
    pub fn refresh(&self) -> PageRequest {
        PageRequest {
            limit: self.limit,
            starting_after: self.stack.last().cloned().flatten(),
        }
    }

    /// Move to the next page, if the server reported one.
    pub fn advance(&mut self) -> Option<PageRequest> {
        if !self.has_more {
            return None;
        }
        let cursor = self.next_cursor.clone()?;
        self.stack.push(Some(cursor.clone()));
        // Stale until the next record().
        self.has_more = false;
        self.next_cursor = None;
        Some(PageRequest {
            limit: self.limit,
            starting_after: Some(cursor),
        })
    }

    /// Move back one page. `None` on page one.
    pub fn retreat(&mut self) -> Option<PageRequest> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.stack.pop();
        self.has_more = false;
        self.next_cursor = None;
        Some(self.refresh())
    }

    /// Back to page one, e.g. when a filter changes.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(None);
        self.has_more = false;
        self.next_cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pager_with_page(limit: u32, next: &str) -> Pager {
        let mut p = Pager::new(limit);
        p.record(true, Some(next.to_string()));
        p
    }

    #[test]
    fn page_one_has_no_cursor() {
        let p = Pager::new(20);
        assert_eq!(p.page_number(), 1);
        assert_eq!(
            p.refresh(),
            PageRequest {
                limit: 20,
                starting_after: None
            }
        );
    }

    #[test]
    fn advance_uses_recorded_cursor() {
        let mut p = pager_with_page(20, "dbx_20");
        let req = p.advance().unwrap();
        assert_eq!(req.starting_after.as_deref(), Some("dbx_20"));
        assert_eq!(p.page_number(), 2);
        // Until the new page is recorded there is nothing further to advance to.
        assert!(p.advance().is_none());
    }

    #[test]
    fn advance_requires_has_more() {
        let mut p = Pager::new(20);
        p.record(false, Some("dbx_20".to_string()));
        assert!(p.advance().is_none());

        // has_more without a cursor is treated as end-of-list.
        let mut p = Pager::new(20);
        p.record(true, None);
        assert!(p.advance().is_none());
    }

    #[test]
    fn retreat_returns_to_previous_cursor() {
        let mut p = pager_with_page(10, "a");
        p.advance().unwrap();
        p.record(true, Some("b".to_string()));
        p.advance().unwrap();
        assert_eq!(p.page_number(), 3);

        let req = p.retreat().unwrap();
        assert_eq!(req.starting_after.as_deref(), Some("a"));
        assert_eq!(p.page_number(), 2);

        let req = p.retreat().unwrap();
        assert_eq!(req.starting_after, None);
        assert_eq!(p.page_number(), 1);
        assert!(p.retreat().is_none());
    }

    #[test]
    fn reset_clears_stack_and_cursor() {
        let mut p = pager_with_page(10, "a");
        p.advance().unwrap();
        p.reset();
        assert_eq!(p.page_number(), 1);
        assert_eq!(p.refresh().starting_after, None);
        assert!(p.advance().is_none());
    }

    proptest! {
        /// Any sequence of operations keeps the stack valid: page number is
        /// always >= 1 and refresh never panics.
        #[test]
        fn stack_never_underflows(ops in proptest::collection::vec(0u8..4, 0..64)) {
            let mut p = Pager::new(20);
            let mut page = 0u32;
            for op in ops {
                match op {
                    0 => {
                        page += 1;
                        p.record(true, Some(format!("cur_{page}")));
                    }
                    1 => { let _ = p.advance(); }
                    2 => { let _ = p.retreat(); }
                    _ => p.reset(),
                }
                prop_assert!(p.page_number() >= 1);
                let _ = p.refresh();
            }
        }

        /// advance then retreat always lands back on the same request.
        #[test]
        fn advance_retreat_roundtrip(cursor in "[a-z]{1,8}") {
            let mut p = pager_with_page(20, &cursor);
            let before = p.refresh();
            p.advance().unwrap();
            let back = p.retreat().unwrap();
            prop_assert_eq!(before, back);
        }
    }
}
