//! Record-list query parameters shared by every `GET` collection endpoint.
//!
//! Module-specific filters (status, kind, account...) live in their own
//! query structs; handlers extract both from the same query string.

use serde::Deserialize;
use time::Date;

use crate::validate::{FieldErrors, ValidationError};

pub const DEFAULT_LIMIT: i64 = 50;

/// Raw `?q=&from=&to=&limit=&offset=` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Normalized list parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub search: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub limit: i64,
    pub offset: i64,
}

impl ListQuery {
    /// Trim the search text, clamp paging, and reject inverted date ranges.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `from` is after `to`.
    pub fn into_params(self, max_limit: i64) -> Result<ListParams, ValidationError> {
        let mut errors = FieldErrors::new();
        if let (Some(from), Some(to)) = (self.from, self.to) {
            errors.date_range("from", from, to);
        }
        errors.into_result()?;

        let search = self
            .q
            .map(|q| q.trim().to_owned())
            .filter(|q| !q.is_empty());
        let max_limit = max_limit.max(1);
        Ok(ListParams {
            search,
            from: self.from,
            to: self.to,
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, max_limit),
            offset: self.offset.unwrap_or(0).max(0),
        })
    }
}

impl ListParams {
    /// `ILIKE` pattern for the search text, if any.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(like_pattern)
    }
}

/// Substring `ILIKE` pattern with `\`, `%` and `_` escaped.
#[must_use]
pub fn like_pattern(search: &str) -> String {
    let mut out = String::with_capacity(search.len() + 2);
    out.push('%');
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
