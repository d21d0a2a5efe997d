use serde::Serialize;

use crate::aggregate::{Granularity, PeriodBucket};
use crate::models::Amount;

/// Column-oriented series for a bar chart with a balance line and a
/// reference line at the current overall balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub granularity: Granularity,
    pub labels: Vec<String>,
    pub income: Vec<Amount>,
    pub expense: Vec<Amount>,
    pub balance: Vec<Amount>,
    pub current_balance: Amount,
}

impl ChartSeries {
    /// Buckets are expected oldest first.
    pub fn from_buckets(
        granularity: Granularity,
        buckets: &[PeriodBucket],
        current_balance: Amount,
    ) -> Self {
        Self {
            granularity,
            labels: buckets.iter().map(|b| b.period.short_label()).collect(),
            income: buckets.iter().map(|b| b.summary.income).collect(),
            expense: buckets.iter().map(|b| b.summary.expense).collect(),
            balance: buckets.iter().map(|b| b.summary.balance).collect(),
            current_balance,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}
