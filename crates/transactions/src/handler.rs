use crate::models::{
    BalanceResponse, FilteredTransactions, MonthlySummaryRow, RawCreateTransactionRequest,
    YearlySummaryRow,
};
use crate::service::{TransactionError, TransactionService};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use common::AppState;
use serde_json::json;
use std::sync::Arc;
use summary::{
    ChartSeries, Dashboard, FilterCriteria, Granularity, PeriodBucket, RawFilterQuery, Summary,
    Transaction, TransactionKind,
};
use validator::Validate;

impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            TransactionError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            TransactionError::NotFound => (StatusCode::NOT_FOUND, "Transaction not found".to_string()),
            TransactionError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub today: String,
    pub balance: SummaryView,
    pub filtered: SummaryView,
    pub filter: FilterView,
    pub transactions: Vec<TransactionView>,
    pub monthly_rows: Vec<PeriodRowView>,
    pub yearly_rows: Vec<PeriodRowView>,
    pub months: Vec<OptionView>,
    pub categories: Vec<OptionView>,
    pub monthly_chart_json: String,
    pub yearly_chart_json: String,
}

pub struct SummaryView {
    pub income: String,
    pub expense: String,
    pub balance: String,
    pub balance_is_positive: bool,
}

impl From<Summary> for SummaryView {
    fn from(summary: Summary) -> Self {
        Self {
            income: summary.income.to_string(),
            expense: summary.expense.to_string(),
            balance: summary.balance.to_string(),
            balance_is_positive: !summary.balance.is_negative(),
        }
    }
}

#[derive(Default)]
pub struct FilterView {
    pub from_date: String,
    pub to_date: String,
    pub kind: String,
}

pub struct TransactionView {
    pub id: i64,
    pub date: String,
    pub category: String,
    pub description: String,
    pub is_income: bool,
    pub kind_label: String,
    pub amount: String,
}

impl From<&Transaction> for TransactionView {
    fn from(t: &Transaction) -> Self {
        let is_income = t.kind == TransactionKind::Income;
        Self {
            id: t.id,
            date: t.date.format("%Y-%m-%d").to_string(),
            category: t.category.clone(),
            description: t.description.clone().unwrap_or_else(|| "-".to_string()),
            is_income,
            kind_label: if is_income { "Income" } else { "Expense" }.to_string(),
            amount: t.amount.to_string(),
        }
    }
}

pub struct PeriodRowView {
    pub label: String,
    pub income: String,
    pub expense: String,
    pub balance: String,
    pub balance_is_positive: bool,
}

impl From<&PeriodBucket> for PeriodRowView {
    fn from(bucket: &PeriodBucket) -> Self {
        Self {
            label: bucket.period.long_label(),
            income: bucket.summary.income.to_string(),
            expense: bucket.summary.expense.to_string(),
            balance: bucket.summary.balance.to_string(),
            balance_is_positive: !bucket.summary.balance.is_negative(),
        }
    }
}

pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(serde::Deserialize)]
pub struct GranularityParam {
    pub granularity: String,
}

pub fn transactions_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_dashboard_view))
        .route("/add_transaction", post(create_transaction))
        .route("/get_transactions", get(list_transactions))
        .route("/get_monthly_summary", get(get_monthly_summary))
        .route("/get_yearly_summary", get(get_yearly_summary))
        .route("/get_chart/{granularity}", get(get_chart_series))
        .route("/delete_transaction/{id}", post(delete_transaction).delete(delete_transaction))
        .route("/filter_transactions", get(filter_transactions))
        .route("/get_months", get(list_months))
        .route("/get_categories", get(list_categories))
        .route("/get_current_balance", get(get_current_balance))
        .with_state(state)
}

fn chart_json(series: Option<&ChartSeries>) -> Result<String, TransactionError> {
    series
        .map(serde_json::to_string)
        .transpose()
        .map(|json| json.unwrap_or_else(|| "null".to_string()))
        .map_err(|e| TransactionError::Infrastructure(e.to_string()))
}

fn render_dashboard(
    dashboard: &Dashboard,
    months: Vec<String>,
    categories: Vec<String>,
) -> Result<DashboardTemplate, TransactionError> {
    let criteria = dashboard.criteria();
    let selected_month = criteria.month.map(|m| m.to_string());

    let months = months
        .into_iter()
        .map(|m| {
            let label = m
                .parse::<summary::YearMonth>()
                .map(|ym| summary::Period::Month(ym).long_label())
                .unwrap_or_else(|_| m.clone());
            OptionView { selected: selected_month.as_deref() == Some(m.as_str()), value: m, label }
        })
        .collect();

    let categories = categories
        .into_iter()
        .map(|c| OptionView {
            selected: criteria.category.as_deref() == Some(c.as_str()),
            label: c.clone(),
            value: c,
        })
        .collect();

    let filter = FilterView {
        from_date: criteria.date_from.map(|d| d.to_string()).unwrap_or_default(),
        to_date: criteria.date_to.map(|d| d.to_string()).unwrap_or_default(),
        kind: criteria.kind.map(|k| k.to_string()).unwrap_or_default(),
    };

    Ok(DashboardTemplate {
        today: chrono::Local::now().format("%Y-%m-%d").to_string(),
        balance: dashboard.balance().into(),
        filtered: dashboard.filtered().into(),
        filter,
        transactions: dashboard.visible().iter().map(TransactionView::from).collect(),
        monthly_rows: dashboard.monthly_table().iter().map(PeriodRowView::from).collect(),
        yearly_rows: dashboard.yearly_table().iter().map(PeriodRowView::from).collect(),
        months,
        categories,
        monthly_chart_json: chart_json(dashboard.monthly_chart().series())?,
        yearly_chart_json: chart_json(dashboard.yearly_chart().series())?,
    })
}

async fn get_dashboard_view(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RawFilterQuery>,
) -> Result<impl IntoResponse, TransactionError> {
    let criteria = FilterCriteria::try_from(raw)?;
    tracing::info!("Rendering dashboard (filtered: {})", !criteria.is_empty());

    let dashboard = TransactionService::dashboard(&state.db, state.config.chart_window(), criteria)
        .await
        .map_err(|e| {
            tracing::error!("dashboard error: {:?}", e);
            e
        })?;
    let months = TransactionService::list_months(&state.db).await?;
    let categories = TransactionService::list_categories(&state.db).await?;

    let template = render_dashboard(&dashboard, months, categories)?;
    Ok(Html(template.render().map_err(|e| TransactionError::Infrastructure(e.to_string()))?))
}

async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<RawCreateTransactionRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    payload
        .validate()
        .map_err(|e| TransactionError::InvalidInput(e.to_string()))?;

    let id = TransactionService::create_transaction(
        &state.db,
        payload.date,
        payload.kind,
        payload.category,
        payload.amount,
        payload.description,
    ).await.map_err(|e| {
        tracing::error!("create_transaction error: {:?}", e);
        e
    })?;
    tracing::info!("Created transaction {}", id);

    Ok(Redirect::to("/"))
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Transaction>>, TransactionError> {
    let transactions = TransactionService::list_transactions(&state.db).await?;
    Ok(Json(transactions))
}

async fn get_monthly_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MonthlySummaryRow>>, TransactionError> {
    let buckets = TransactionService::period_summary(&state.db, Granularity::Month).await?;
    Ok(Json(buckets.into_iter().map(MonthlySummaryRow::from).collect()))
}

async fn get_yearly_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<YearlySummaryRow>>, TransactionError> {
    let buckets = TransactionService::period_summary(&state.db, Granularity::Year).await?;
    Ok(Json(buckets.into_iter().map(YearlySummaryRow::from).collect()))
}

async fn get_chart_series(
    State(state): State<Arc<AppState>>,
    Path(params): Path<GranularityParam>,
) -> Result<Json<ChartSeries>, TransactionError> {
    let granularity: Granularity = params.granularity.parse()?;
    let series =
        TransactionService::chart_series(&state.db, granularity, state.config.chart_window()).await?;
    Ok(Json(series))
}

async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, TransactionError> {
    TransactionService::delete_transaction(&state.db, id).await?;
    tracing::info!("Deleted transaction {}", id);
    Ok(Json(json!({ "success": true })))
}

async fn filter_transactions(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RawFilterQuery>,
) -> Result<Json<FilteredTransactions>, TransactionError> {
    let criteria = FilterCriteria::try_from(raw).map_err(|e| {
        tracing::warn!("Rejected filter: {}", e);
        TransactionError::from(e)
    })?;

    let (transactions, summary) = TransactionService::filter_transactions(&state.db, &criteria).await?;
    Ok(Json(FilteredTransactions { transactions, summary }))
}

async fn list_months(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, TransactionError> {
    Ok(Json(TransactionService::list_months(&state.db).await?))
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, TransactionError> {
    Ok(Json(TransactionService::list_categories(&state.db).await?))
}

async fn get_current_balance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BalanceResponse>, TransactionError> {
    let summary = TransactionService::current_balance(&state.db).await?;
    Ok(Json(summary.into()))
}
