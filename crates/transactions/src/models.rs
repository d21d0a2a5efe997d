use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use summary::{parse_date, Amount, Period, PeriodBucket, Summary, Transaction, TransactionKind};
use validator::Validate;

/// A transaction that passed validation and is ready to be stored.
#[derive(Debug, Serialize)]
pub struct CreateTransactionRequest {
    date: NaiveDate,
    kind: TransactionKind,
    category: String,
    amount: Amount,
    description: Option<String>,
}

/// Form input for a new transaction, before domain validation.
#[derive(Debug, Deserialize, Validate)]
pub struct RawCreateTransactionRequest {
    #[validate(length(equal = 10, message = "Date must be YYYY-MM-DD"))]
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,
    #[validate(range(min = 0.0, max = 1e12, message = "Amount must be between 0 and 1000000000000"))]
    pub amount: f64,
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,
}

impl CreateTransactionRequest {
    pub fn new(
        date: &str,
        kind: &str,
        category: String,
        amount: f64,
        description: Option<String>,
    ) -> Result<Self, String> {
        let date = parse_date(date).map_err(|e| e.to_string())?;
        let kind: TransactionKind = kind.parse().map_err(|e: summary::FilterError| e.to_string())?;

        let category = category.trim().to_string();
        if category.is_empty() {
            return Err("Category cannot be empty".to_string());
        }

        let amount = Amount::from_major(amount).ok_or_else(|| "Invalid amount".to_string())?;
        if amount.is_negative() {
            return Err("Amount cannot be negative".to_string());
        }
        if amount > Amount::MAX_ENTRY {
            return Err(format!("Amount cannot exceed {}", Amount::MAX_ENTRY));
        }

        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            date,
            kind,
            category,
            amount,
            description,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Debug, Serialize)]
pub struct FilteredTransactions {
    pub transactions: Vec<Transaction>,
    pub summary: Summary,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BalanceResponse {
    pub total_income: Amount,
    pub total_expense: Amount,
    pub balance: Amount,
}

impl From<Summary> for BalanceResponse {
    fn from(summary: Summary) -> Self {
        Self {
            total_income: summary.income,
            total_expense: summary.expense,
            balance: summary.balance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonthlySummaryRow {
    pub month: Period,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
pub struct YearlySummaryRow {
    pub year: Period,
    #[serde(flatten)]
    pub summary: Summary,
}

impl From<PeriodBucket> for MonthlySummaryRow {
    fn from(bucket: PeriodBucket) -> Self {
        Self { month: bucket.period, summary: bucket.summary }
    }
}

impl From<PeriodBucket> for YearlySummaryRow {
    fn from(bucket: PeriodBucket) -> Self {
        Self { year: bucket.period, summary: bucket.summary }
    }
}
