use serde::Serialize;

use crate::error::{Error, Result};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;

/// Selection parameters for a client listing: free-text term, exact
/// status filter, and an offset/limit page window. Composed into one
/// deterministic filter so the count and the fetch see the same rows.
///
/// `status` is matched by exact equality against the stored value, so
/// listing never fails on an unknown status; it just matches nothing.
#[derive(Debug, Clone)]
pub struct ClientQuery {
    pub term: Option<String>,
    pub status: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl Default for ClientQuery {
    fn default() -> Self {
        Self {
            term: None,
            status: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ClientQuery {
    /// Rejects page windows the offset math cannot express. `page` and
    /// `limit` are otherwise echoed back verbatim in the envelope.
    pub fn validate(&self) -> Result<()> {
        if self.page < 1 {
            return Err(Error::Validation(format!(
                "page must be at least 1, got {}",
                self.page
            )));
        }
        if self.limit < 1 {
            return Err(Error::Validation(format!(
                "limit must be at least 1, got {}",
                self.limit
            )));
        }
        if (self.page - 1).checked_mul(self.limit).is_none() {
            return Err(Error::Validation(format!(
                "page {} with limit {} is out of range",
                self.page, self.limit
            )));
        }
        Ok(())
    }

    /// The search term, with an empty or whitespace-only string
    /// treated the same as no term at all.
    #[must_use]
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// The status filter, with an empty string treated as absent.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.is_empty())
    }

    /// Row offset of the requested window. Only meaningful once
    /// [`ClientQuery::validate`] has passed; a window too large for
    /// the offset math saturates instead of wrapping.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// One page of a listing, echoing the requested window alongside the
/// total match count so callers can compute `ceil(total / limit)`.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T: Serialize> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, query: &ClientQuery) -> Self {
        Self {
            items,
            total,
            page: query.page,
            limit: query.limit,
        }
    }
}
