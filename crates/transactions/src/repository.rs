use crate::models::CreateTransactionRequest;
use database::{self, RepositoryError};
use sqlx::FromRow;
use summary::{parse_date, Amount, Transaction, TransactionKind};

#[derive(FromRow)]
struct TransactionRecord {
    id: i64,
    transaction_date: String,
    kind: String,
    category: String,
    amount: i64,
    description: Option<String>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = RepositoryError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let date = parse_date(&record.transaction_date)
            .map_err(|e| RepositoryError::InvalidData(format!("transaction {}: {}", record.id, e)))?;
        let kind = record
            .kind
            .parse::<TransactionKind>()
            .map_err(|e| RepositoryError::InvalidData(format!("transaction {}: {}", record.id, e)))?;

        Ok(Transaction {
            id: record.id,
            date,
            kind,
            category: record.category,
            description: record.description,
            amount: Amount::from_minor(record.amount),
        })
    }
}

fn into_transactions(records: Vec<TransactionRecord>) -> Result<Vec<Transaction>, RepositoryError> {
    records.into_iter().map(Transaction::try_from).collect()
}

pub(crate) struct TransactionRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateTransactionRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO transactions (transaction_date, kind, category, amount, description) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(req.date().format("%Y-%m-%d").to_string())
        .bind(req.kind().as_str())
        .bind(req.category())
        .bind(req.amount().minor())
        .bind(req.description())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Transaction>, RepositoryError> {
        let record = sqlx::query_as::<_, TransactionRecord>(
            "SELECT id, transaction_date, kind, category, amount, description FROM transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Transaction::try_from).transpose()
    }

    /// Latest first; same-day rows newest id first.
    pub async fn list_all(&mut self) -> Result<Vec<Transaction>, RepositoryError> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            "SELECT id, transaction_date, kind, category, amount, description FROM transactions ORDER BY transaction_date DESC, id DESC",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        into_transactions(records)
    }

    pub async fn list_months(&mut self) -> Result<Vec<String>, RepositoryError> {
        let months: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT strftime('%Y-%m', transaction_date) AS month FROM transactions ORDER BY month",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(months)
    }

    pub async fn list_categories(&mut self) -> Result<Vec<String>, RepositoryError> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM transactions ORDER BY category",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(categories)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
