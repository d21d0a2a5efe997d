use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Datelike;

use crate::filter::{FilterCriteria, FilterError};
use crate::models::{Summary, Transaction, YearMonth};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Month,
    Year,
}

impl FromStr for Granularity {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" | "monthly" => Ok(Granularity::Month),
            "year" | "yearly" => Ok(Granularity::Year),
            other => Err(FilterError::InvalidGranularity(other.to_string())),
        }
    }
}

/// Key of a bucket. Ordering is chronological within one granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Month(YearMonth),
    Year(i32),
}

impl Period {
    pub fn of(transaction: &Transaction, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Month => Period::Month(transaction.year_month()),
            Granularity::Year => Period::Year(transaction.date.year()),
        }
    }

    /// Compact label for chart axes, e.g. "Jan 24" or "2024".
    pub fn short_label(&self) -> String {
        match self {
            Period::Month(ym) => ym.first_day().format("%b %y").to_string(),
            Period::Year(year) => year.to_string(),
        }
    }

    /// Label for tables, e.g. "January 2024".
    pub fn long_label(&self) -> String {
        match self {
            Period::Month(ym) => ym.first_day().format("%B %Y").to_string(),
            Period::Year(year) => year.to_string(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month(ym) => fmt::Display::fmt(ym, f),
            Period::Year(year) => write!(f, "{:04}", year),
        }
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodBucket {
    pub period: Period,
    #[serde(flatten)]
    pub summary: Summary,
    #[serde(skip)]
    pub count: usize,
}

pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    criteria: &FilterCriteria,
) -> Vec<&'a Transaction> {
    let mut selected: Vec<&Transaction> =
        transactions.iter().filter(|t| criteria.matches(t)).collect();
    // Latest first; stable so same-day rows keep their incoming order.
    selected.sort_by(|a, b| b.date.cmp(&a.date));
    selected
}

pub fn compute_summary(transactions: &[Transaction], criteria: &FilterCriteria) -> Summary {
    Summary::from_transactions(transactions.iter().filter(|t| criteria.matches(t)))
}

/// Totals across every known transaction. Always derived, never cached.
pub fn current_balance(transactions: &[Transaction]) -> Summary {
    compute_summary(transactions, &FilterCriteria::default())
}

/// Groups transactions by period. Buckets come back oldest first; use
/// [`latest_first`] for tables.
pub fn bucket_by_period(transactions: &[Transaction], granularity: Granularity) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<Period, (Summary, usize)> = BTreeMap::new();

    for t in transactions {
        let entry = buckets
            .entry(Period::of(t, granularity))
            .or_insert((Summary::default(), 0));
        entry.0.record(t);
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(period, (summary, count))| PeriodBucket { period, summary, count })
        .collect()
}

pub fn latest_first(mut buckets: Vec<PeriodBucket>) -> Vec<PeriodBucket> {
    buckets.sort_by(|a, b| b.period.cmp(&a.period));
    buckets
}

/// The `window` most recent buckets, oldest first.
pub fn recent_window(mut buckets: Vec<PeriodBucket>, window: usize) -> Vec<PeriodBucket> {
    buckets.sort_by(|a, b| a.period.cmp(&b.period));
    let skip = buckets.len().saturating_sub(window);
    buckets.split_off(skip)
}

pub fn available_months(transactions: &[Transaction]) -> Vec<YearMonth> {
    let mut months: Vec<YearMonth> = transactions.iter().map(Transaction::year_month).collect();
    months.sort();
    months.dedup();
    months
}

pub fn available_categories(transactions: &[Transaction]) -> Vec<String> {
    let mut categories: Vec<String> = transactions.iter().map(|t| t.category.clone()).collect();
    categories.sort();
    categories.dedup();
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_date, Amount, TransactionKind};

    fn tx(id: i64, date: &str, kind: TransactionKind, amount: i64) -> Transaction {
        Transaction {
            id,
            date: parse_date(date).unwrap(),
            kind,
            category: if kind == TransactionKind::Income { "Salary".into() } else { "Food".into() },
            description: None,
            amount: Amount::from_minor(amount),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx(1, "2024-01-05", TransactionKind::Income, 1000),
            tx(2, "2024-01-20", TransactionKind::Expense, 400),
            tx(3, "2024-02-01", TransactionKind::Income, 200),
        ]
    }

    fn summary(income: i64, expense: i64, balance: i64) -> Summary {
        Summary {
            income: Amount::from_minor(income),
            expense: Amount::from_minor(expense),
            balance: Amount::from_minor(balance),
        }
    }

    #[test]
    fn test_summary_for_single_month() {
        let criteria = FilterCriteria::new().with_month("2024-01".parse().unwrap());
        assert_eq!(compute_summary(&sample(), &criteria), summary(1000, 400, 600));
    }

    #[test]
    fn test_empty_list_yields_zero_summary() {
        assert_eq!(compute_summary(&[], &FilterCriteria::default()), Summary::default());
        assert_eq!(current_balance(&[]), summary(0, 0, 0));
    }

    #[test]
    fn test_balance_is_income_minus_expense() {
        let all = sample();
        let s = compute_summary(&all, &FilterCriteria::default());
        assert_eq!(s.balance, s.income - s.expense);
        assert_eq!(s, summary(1200, 400, 800));
    }

    #[test]
    fn test_summary_is_repeatable() {
        let all = sample();
        let criteria = FilterCriteria::new().with_kind(TransactionKind::Expense);
        assert_eq!(compute_summary(&all, &criteria), compute_summary(&all, &criteria));
    }

    #[test]
    fn test_income_filter_has_no_expense() {
        let criteria = FilterCriteria::new().with_kind(TransactionKind::Income);
        let s = compute_summary(&sample(), &criteria);
        assert_eq!(s.expense, Amount::ZERO);
        assert_eq!(s.income, Amount::from_minor(1200));
    }

    #[test]
    fn test_current_balance_matches_unfiltered_summary() {
        let all = sample();
        assert_eq!(current_balance(&all), compute_summary(&all, &FilterCriteria::new()));
    }

    #[test]
    fn test_monthly_buckets() {
        let buckets = bucket_by_period(&sample(), Granularity::Month);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].period.to_string(), "2024-01");
        assert_eq!(buckets[0].summary, summary(1000, 400, 600));
        assert_eq!(buckets[1].period.to_string(), "2024-02");
        assert_eq!(buckets[1].summary, summary(200, 0, 200));
    }

    #[test]
    fn test_buckets_account_for_every_transaction() {
        let mut all = sample();
        all.push(tx(4, "2023-12-31", TransactionKind::Expense, 50));
        all.push(tx(5, "2024-02-29", TransactionKind::Expense, 75));

        for granularity in [Granularity::Month, Granularity::Year] {
            let buckets = bucket_by_period(&all, granularity);
            let count: usize = buckets.iter().map(|b| b.count).sum();
            assert_eq!(count, all.len());

            let income: Amount = buckets.iter().map(|b| b.summary.income).sum();
            let expense: Amount = buckets.iter().map(|b| b.summary.expense).sum();
            let total = current_balance(&all);
            assert_eq!(income, total.income);
            assert_eq!(expense, total.expense);
        }
    }

    #[test]
    fn test_yearly_buckets_are_chronological() {
        let mut all = sample();
        all.push(tx(4, "2023-06-01", TransactionKind::Income, 10));
        let buckets = bucket_by_period(&all, Granularity::Year);
        let keys: Vec<String> = buckets.iter().map(|b| b.period.to_string()).collect();
        assert_eq!(keys, vec!["2023", "2024"]);
    }

    #[test]
    fn test_latest_first_reverses_order() {
        let buckets = latest_first(bucket_by_period(&sample(), Granularity::Month));
        assert_eq!(buckets[0].period.to_string(), "2024-02");
    }

    #[test]
    fn test_recent_window_keeps_latest_six() {
        let all: Vec<Transaction> = (1..=9)
            .map(|m| tx(m, &format!("2024-{:02}-15", m), TransactionKind::Expense, m * 10))
            .collect();
        let window = recent_window(bucket_by_period(&all, Granularity::Month), 6);
        let keys: Vec<String> = window.iter().map(|b| b.period.to_string()).collect();
        assert_eq!(keys, vec!["2024-04", "2024-05", "2024-06", "2024-07", "2024-08", "2024-09"]);

        let short = recent_window(bucket_by_period(&sample(), Granularity::Month), 6);
        assert_eq!(short.len(), 2);
    }

    #[test]
    fn test_bucket_serializes_with_flat_summary() {
        let buckets = bucket_by_period(&sample(), Granularity::Month);
        let json = serde_json::to_value(&buckets[1]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "period": "2024-02", "income": 2.0, "expense": 0.0, "balance": 2.0 })
        );
    }

    #[test]
    fn test_filter_transactions_orders_latest_first() {
        let all = sample();
        let selected = filter_transactions(&all, &FilterCriteria::default());
        let ids: Vec<i64> = selected.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_available_months_and_categories() {
        let all = sample();
        let months: Vec<String> = available_months(&all).iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02"]);
        assert_eq!(available_categories(&all), vec!["Food", "Salary"]);
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("monthly".parse::<Granularity>().unwrap(), Granularity::Month);
        assert_eq!("year".parse::<Granularity>().unwrap(), Granularity::Year);
        assert!("week".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_period_labels() {
        let period = Period::Month("2024-01".parse().unwrap());
        assert_eq!(period.short_label(), "Jan 24");
        assert_eq!(period.long_label(), "January 2024");
        assert_eq!(Period::Year(2024).short_label(), "2024");
    }
}
