use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Resolved page/limit pair.
///
/// Raw query values are accepted as strings so a non-numeric `page=abc`
/// falls back to the default instead of failing query deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    /// `page` < 1 or non-numeric defaults to 1; `limit` is clamped to
    /// [1, 100] and defaults to 10.
    pub fn resolve(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .and_then(|l| l.parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn envelope(&self, total: i64) -> PageInfo {
        PageInfo {
            page: self.page,
            limit: self.limit,
            total,
            pages: if total == 0 {
                0
            } else {
                (total + self.limit - 1) / self.limit
            },
        }
    }
}

/// The `pagination` object returned alongside list data.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_absent() {
        let p = Page::resolve(None, None);
        assert_eq!(p, Page { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn limit_clamped_to_100() {
        let p = Page::resolve(Some("2"), Some("500"));
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset(), 100);
    }

    #[test]
    fn non_numeric_and_negative_fall_back() {
        assert_eq!(Page::resolve(Some("abc"), Some("-3")).page, 1);
        assert_eq!(Page::resolve(Some("abc"), Some("-3")).limit, 1);
        assert_eq!(Page::resolve(Some("0"), Some("abc")), Page { page: 1, limit: 10 });
    }

    #[test]
    fn page_count_rounds_up() {
        let p = Page::resolve(Some("1"), Some("10"));
        assert_eq!(p.envelope(0).pages, 0);
        assert_eq!(p.envelope(25).pages, 3);
        assert_eq!(p.envelope(30).pages, 3);
    }
}
