//! Pagination shared by the list operations.

use serde::{Deserialize, Serialize};

use wholesale_core::{DomainError, DomainResult};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `page` is 1-based; `limit` is 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn first_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> DomainResult<Self> {
        let req = Self { page, limit };
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.page == 0 {
            return Err(DomainError::validation("page", "page starts at 1"));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(DomainError::validation(
                "limit",
                format!("limit must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(())
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            pages: self.pages,
        }
    }
}

/// Cut an already filtered and sorted result set down to the requested page.
pub fn paginate<T>(items: Vec<T>, req: PageRequest) -> DomainResult<Page<T>> {
    req.validate()?;
    let total = items.len();
    let pages = total.div_ceil(req.limit as usize) as u32;
    let items = items.into_iter().skip(req.offset()).take(req.limit as usize).collect();
    Ok(Page {
        items,
        total,
        page: req.page,
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_and_counts_pages() {
        let page = paginate((1..=25).collect(), PageRequest::new(3, 10).unwrap()).unwrap();
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = paginate(vec![1, 2], PageRequest::new(5, 10).unwrap()).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn bounds_are_validated() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, 101).is_err());
        assert!(PageRequest::new(1, 100).is_ok());
    }

    #[test]
    fn defaults_from_empty_query() {
        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, PageRequest::default());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                .. ProptestConfig::default()
            })]

            #[test]
            fn pages_partition_the_result_set(len in 0usize..300, limit in 1u32..=100) {
                let items: Vec<usize> = (0..len).collect();
                let first = paginate(items.clone(), PageRequest::new(1, limit).unwrap()).unwrap();

                let mut seen = Vec::new();
                for page in 1..=first.pages.max(1) {
                    let p = paginate(items.clone(), PageRequest::new(page, limit).unwrap()).unwrap();
                    prop_assert!(p.items.len() <= limit as usize);
                    prop_assert_eq!(p.total, len);
                    seen.extend(p.items);
                }
                prop_assert_eq!(seen, items);
            }
        }
    }
}
