use crate::models::CreateTransactionRequest;
use crate::repository::TransactionRepository;
use database::{Database, RepositoryError};
use summary::{
    bucket_by_period, compute_summary, current_balance, filter_transactions, recent_window,
    ChartSeries, Dashboard, FilterCriteria, FilterError, FilterOutcome, Granularity, PeriodBucket,
    Summary, Transaction,
};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Transaction not found")]
    NotFound,
}

impl From<RepositoryError> for TransactionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => TransactionError::NotFound,
            RepositoryError::CheckViolation(msg) => TransactionError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => TransactionError::Infrastructure(e.to_string()),
            _ => TransactionError::Infrastructure(err.to_string()),
        }
    }
}

impl From<FilterError> for TransactionError {
    fn from(err: FilterError) -> Self {
        TransactionError::InvalidInput(err.to_string())
    }
}

pub struct TransactionService;

impl TransactionService {
    #[instrument(skip(db))]
    pub async fn create_transaction(
        db: &Database,
        date: String,
        kind: String,
        category: String,
        amount: f64,
        description: Option<String>,
    ) -> Result<i64, TransactionError> {
        let req = CreateTransactionRequest::new(&date, &kind, category, amount, description)
            .map_err(TransactionError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        let id = repo.create(&req).await?;

        uow.commit().await?;

        Ok(id)
    }

    /// Every transaction, latest first.
    #[instrument(skip(db))]
    pub async fn list_transactions(db: &Database) -> Result<Vec<Transaction>, TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        Ok(repo.list_all().await?)
    }

    #[instrument(skip(db))]
    pub async fn filter_transactions(
        db: &Database,
        criteria: &FilterCriteria,
    ) -> Result<(Vec<Transaction>, Summary), TransactionError> {
        let all = Self::list_transactions(db).await?;

        let summary = compute_summary(&all, criteria);
        let selected = filter_transactions(&all, criteria)
            .into_iter()
            .cloned()
            .collect();

        Ok((selected, summary))
    }

    #[instrument(skip(db))]
    pub async fn delete_transaction(db: &Database, id: i64) -> Result<(), TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        repo.delete(id).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_months(db: &Database) -> Result<Vec<String>, TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        Ok(repo.list_months().await?)
    }

    #[instrument(skip(db))]
    pub async fn list_categories(db: &Database) -> Result<Vec<String>, TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        Ok(repo.list_categories().await?)
    }

    #[instrument(skip(db))]
    pub async fn current_balance(db: &Database) -> Result<Summary, TransactionError> {
        let all = Self::list_transactions(db).await?;
        Ok(current_balance(&all))
    }

    /// Buckets oldest first.
    #[instrument(skip(db))]
    pub async fn period_summary(
        db: &Database,
        granularity: Granularity,
    ) -> Result<Vec<PeriodBucket>, TransactionError> {
        let all = Self::list_transactions(db).await?;
        Ok(bucket_by_period(&all, granularity))
    }

    /// Monthly series are cut to the latest `window` months; yearly series
    /// are never windowed.
    #[instrument(skip(db))]
    pub async fn chart_series(
        db: &Database,
        granularity: Granularity,
        window: usize,
    ) -> Result<ChartSeries, TransactionError> {
        let all = Self::list_transactions(db).await?;
        let balance = current_balance(&all);

        let buckets = bucket_by_period(&all, granularity);
        let buckets = match granularity {
            Granularity::Month => recent_window(buckets, window),
            Granularity::Year => buckets,
        };

        Ok(ChartSeries::from_buckets(granularity, &buckets, balance.balance))
    }

    #[instrument(skip(db))]
    pub async fn dashboard(
        db: &Database,
        window: usize,
        criteria: FilterCriteria,
    ) -> Result<Dashboard, TransactionError> {
        let all = Self::list_transactions(db).await?;

        let mut dashboard = Dashboard::new(window);
        dashboard.refresh(&all);

        if !criteria.is_empty() {
            let ticket = dashboard.begin_filter(criteria);
            let rows = filter_transactions(&all, ticket.criteria())
                .into_iter()
                .cloned()
                .collect();
            let summary = compute_summary(&all, ticket.criteria());
            if dashboard.apply_filter(ticket, rows, summary) == FilterOutcome::Stale {
                tracing::warn!("Filter result was superseded before it could be shown");
            }
        }

        Ok(dashboard)
    }
}
