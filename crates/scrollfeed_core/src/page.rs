use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub has_next: bool,
}

/// One page as returned by a content provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub success: bool,
    pub data: Vec<Value>,
    pub pagination: Option<Pagination>,
    pub from_cache: bool,
    pub error: Option<String>,
}

impl FetchResult {
    /// Successful page with authoritative pagination metadata.
    pub fn page(data: Vec<Value>, has_next: bool) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(Pagination { has_next }),
            from_cache: false,
            error: None,
        }
    }

    /// Successful page without pagination metadata.
    pub fn unpaginated(data: Vec<Value>) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
            from_cache: false,
            error: None,
        }
    }

    /// Backend-reported failure (`success: false`).
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            pagination: None,
            from_cache: false,
            error: Some(message.into()),
        }
    }

    /// Whether another page should be requested after this one.
    ///
    /// Pagination metadata wins when present. Otherwise a full page is taken
    /// to mean more data; when the true last page is exactly full this costs
    /// one extra, empty fetch.
    pub fn has_more(&self, requested_page_size: usize) -> bool {
        match self.pagination {
            Some(pagination) => pagination.has_next,
            None => self.data.len() == requested_page_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Last page applied to the store; 0 before the first page lands.
    pub page_number: u32,
    pub has_more: bool,
}

impl PageCursor {
    pub fn next_page(&self) -> u32 {
        self.page_number + 1
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page_number: 0,
            has_more: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    More,
}

/// Identifies one dispatched page request. Responses carry their ticket back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub epoch: u64,
    pub page: u32,
    pub page_size: usize,
    pub kind: LoadKind,
}
