use crate::form_data::FormData;

/// Guard against unbounded page sizes from user-supplied parameters.
const MAX_PAGE_SIZE: u64 = 100;

/// Pagination parameters parsed from a request query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub page_size: u64,
}

impl PageParams {
    pub fn from_query_str(query: &str, default_page_size: u64) -> Self {
        let data = FormData::from_query_str(query);
        let page = data
            .get("page")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        let page_size = data
            .get("page_size")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|size| *size >= 1)
            .unwrap_or(default_page_size)
            .min(MAX_PAGE_SIZE);
        Self { page, page_size }
    }
}

/// Pagination state of one rendered list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub count: u64,
}

impl Pagination {
    pub fn max_page(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.page_size)
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.max_page()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
