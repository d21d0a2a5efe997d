use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{parse_date, Transaction, TransactionKind, YearMonth};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid transaction type '{0}', expected income or expense")]
    InvalidKind(String),
    #[error("Invalid granularity '{0}', expected month or year")]
    InvalidGranularity(String),
}

/// Optional constraints on a transaction list. Every supplied field must
/// match; a missing field matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub month: Option<YearMonth>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_month(mut self, month: YearMonth) -> Self {
        self.month = Some(month);
        self
    }

    #[must_use]
    pub fn with_date_from(mut self, from: NaiveDate) -> Self {
        self.date_from = Some(from);
        self
    }

    #[must_use]
    pub fn with_date_to(mut self, to: NaiveDate) -> Self {
        self.date_to = Some(to);
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        if self.month.is_some_and(|m| t.year_month() != m) {
            return false;
        }
        if self.date_from.is_some_and(|from| t.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| t.date > to) {
            return false;
        }
        if self.kind.is_some_and(|k| t.kind != k) {
            return false;
        }
        if let Some(category) = &self.category {
            if &t.category != category {
                return false;
            }
        }
        true
    }
}

/// Filter parameters as they arrive in a query string. Empty values mean
/// "no constraint".
#[derive(Debug, Default, Deserialize)]
pub struct RawFilterQuery {
    pub month: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RawFilterQuery> for FilterCriteria {
    type Error = FilterError;

    fn try_from(raw: RawFilterQuery) -> Result<Self, Self::Error> {
        Ok(FilterCriteria {
            month: non_empty(raw.month).map(|m| m.parse::<YearMonth>()).transpose()?,
            date_from: non_empty(raw.from_date).map(|d| parse_date(&d)).transpose()?,
            date_to: non_empty(raw.to_date).map(|d| parse_date(&d)).transpose()?,
            kind: non_empty(raw.kind).map(|k| k.parse::<TransactionKind>()).transpose()?,
            category: non_empty(raw.category),
        })
    }
}
