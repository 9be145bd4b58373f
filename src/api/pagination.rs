use serde::{Deserialize, Serialize};

use crate::config;

/// `?page=&per_page=` query parameters shared by every list endpoint
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Resolved, clamped page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub per_page: u32,
}

impl PageParams {
    pub fn window(&self) -> PageWindow {
        let api = &config::config().api;
        self.window_with(api.default_page_size, api.max_page_size)
    }

    pub fn window_with(&self, default_size: u32, max_size: u32) -> PageWindow {
        let max_size = max_size.max(1);
        PageWindow {
            page: self.page.unwrap_or(1).max(1),
            per_page: self.per_page.unwrap_or(default_size).clamp(1, max_size),
        }
    }
}

impl PageWindow {
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: i64) -> Self {
        Self {
            items,
            page: window.page,
            per_page: window.per_page,
            total,
        }
    }

    /// Convert every item, keeping the paging metadata; stops at the first error
    pub fn try_map<U: Serialize, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, E>>()?,
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        let window = PageParams::default().window_with(25, 100);
        assert_eq!(window, PageWindow { page: 1, per_page: 25 });
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn per_page_is_clamped() {
        let params = PageParams { page: Some(3), per_page: Some(5000) };
        let window = params.window_with(25, 100);
        assert_eq!(window.per_page, 100);
        assert_eq!(window.offset(), 200);

        let zero = PageParams { page: Some(0), per_page: Some(0) }.window_with(25, 100);
        assert_eq!(zero, PageWindow { page: 1, per_page: 1 });
    }

    #[test]
    fn try_map_keeps_paging_metadata() {
        let page = Page::new(vec![1, 2, 3], PageWindow { page: 2, per_page: 3 }, 9);
        let mapped = page.try_map(|n| Ok::<_, String>(n * 10)).unwrap();
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.total, 9);
    }

    #[test]
    fn try_map_surfaces_the_first_error() {
        let page = Page::new(vec![1, 2, 3], PageWindow { page: 1, per_page: 3 }, 3);
        let err = page
            .try_map(|n| if n == 2 { Err(format!("bad {n}")) } else { Ok(n) })
            .unwrap_err();
        assert_eq!(err, "bad 2");
    }
}
