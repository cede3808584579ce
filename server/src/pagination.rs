//! Page-number pagination shared by the list endpoints and the stores.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not pick one (and the fixed size of
/// the community and member listings).
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for caller-chosen page sizes.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A normalized, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Build a request, clamping `page` to at least 1 and `limit` to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Number of records to skip.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Raw `?page=&limit=` query parameters.
///
/// Values are kept as strings so that garbage (`?page=abc`, `?page=-3`) falls
/// back to the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// Page request honouring the caller's `limit`.
    #[must_use]
    pub fn to_request(&self) -> PageRequest {
        let limit = parse_positive(self.limit.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE);
        PageRequest::new(self.page_number(), limit)
    }

    /// Page request with a fixed page size; any `limit` is ignored.
    #[must_use]
    pub fn with_fixed_size(&self, size: u32) -> PageRequest {
        PageRequest::new(self.page_number(), size)
    }

    fn page_number(&self) -> u32 {
        parse_positive(self.page.as_deref()).unwrap_or(1)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    let value: i64 = raw?.trim().parse().ok()?;
    if value < 1 {
        return None;
    }
    Some(u32::try_from(value).unwrap_or(u32::MAX))
}

/// One page of records plus the total count across all pages.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }

    /// Slice an in-order collection the way a store would with OFFSET/LIMIT.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.limit as usize)
            .collect();
        Self { items, total }
    }
}

/// `meta` block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub pages: i64,
    pub page: u32,
}

impl PageMeta {
    #[must_use]
    pub const fn new(total: i64, request: PageRequest) -> Self {
        let limit = if request.limit == 0 { 1 } else { request.limit as i64 };
        Self {
            total,
            pages: (total + limit - 1) / limit,
            page: request.page,
        }
    }
}
