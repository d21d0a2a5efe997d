pub mod aggregate;
pub mod chart;
pub mod filter;
pub mod models;
pub mod view;

pub use aggregate::{
    available_categories, available_months, bucket_by_period, compute_summary, current_balance,
    filter_transactions, latest_first, recent_window, Granularity, Period, PeriodBucket,
};
pub use chart::ChartSeries;
pub use filter::{FilterCriteria, FilterError, RawFilterQuery};
pub use models::{parse_date, Amount, Summary, Transaction, TransactionKind, YearMonth};
pub use view::{ChartHandle, Dashboard, FilterOutcome, FilterTicket};
