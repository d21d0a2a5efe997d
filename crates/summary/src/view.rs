//! Caller-owned dashboard state. Every panel is re-derived from one
//! transaction list, so they always agree.

use crate::aggregate::{
    bucket_by_period, current_balance, filter_transactions, latest_first, recent_window,
    Granularity, PeriodBucket,
};
use crate::chart::ChartSeries;
use crate::filter::FilterCriteria;
use crate::models::{Summary, Transaction};

pub const DEFAULT_CHART_WINDOW: usize = 6;

/// Holds whatever series is currently drawn. Redrawing drops the old one.
#[derive(Debug, Default)]
pub struct ChartHandle {
    series: Option<ChartSeries>,
    redraws: u64,
}

impl ChartHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redraw(&mut self, series: ChartSeries) {
        self.series = Some(series);
        self.redraws += 1;
    }

    pub fn series(&self) -> Option<&ChartSeries> {
        self.series.as_ref()
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }
}

/// Issued when a filter request goes out. Only the newest response may land.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTicket {
    seq: u64,
    criteria: FilterCriteria,
}

impl FilterTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Applied,
    Stale,
}

#[derive(Debug)]
pub struct Dashboard {
    chart_window: usize,
    monthly_chart: ChartHandle,
    yearly_chart: ChartHandle,
    monthly_table: Vec<PeriodBucket>,
    yearly_table: Vec<PeriodBucket>,
    balance: Summary,
    criteria: FilterCriteria,
    visible: Vec<Transaction>,
    filtered: Summary,
    issued: u64,
    applied: u64,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_WINDOW)
    }
}

impl Dashboard {
    pub fn new(chart_window: usize) -> Self {
        Self {
            chart_window,
            monthly_chart: ChartHandle::new(),
            yearly_chart: ChartHandle::new(),
            monthly_table: Vec::new(),
            yearly_table: Vec::new(),
            balance: Summary::default(),
            criteria: FilterCriteria::default(),
            visible: Vec::new(),
            filtered: Summary::default(),
            issued: 0,
            applied: 0,
        }
    }

    /// Re-derives every panel from the latest list. The active filter is
    /// re-applied to the visible rows.
    pub fn refresh(&mut self, transactions: &[Transaction]) {
        self.balance = current_balance(transactions);

        let monthly = bucket_by_period(transactions, Granularity::Month);
        let yearly = bucket_by_period(transactions, Granularity::Year);

        let window = recent_window(monthly.clone(), self.chart_window);
        self.monthly_chart.redraw(ChartSeries::from_buckets(
            Granularity::Month,
            &window,
            self.balance.balance,
        ));
        self.yearly_chart.redraw(ChartSeries::from_buckets(
            Granularity::Year,
            &yearly,
            self.balance.balance,
        ));

        self.monthly_table = latest_first(monthly);
        self.yearly_table = latest_first(yearly);

        self.show(transactions);
    }

    pub fn begin_filter(&mut self, criteria: FilterCriteria) -> FilterTicket {
        self.issued += 1;
        FilterTicket { seq: self.issued, criteria }
    }

    /// Applies a filtered response unless a newer one has already landed.
    pub fn apply_filter(
        &mut self,
        ticket: FilterTicket,
        transactions: Vec<Transaction>,
        summary: Summary,
    ) -> FilterOutcome {
        if ticket.seq <= self.applied {
            tracing::debug!(seq = ticket.seq, applied = self.applied, "dropping stale filter response");
            return FilterOutcome::Stale;
        }
        self.applied = ticket.seq;
        self.criteria = ticket.criteria;
        self.visible = transactions;
        self.filtered = summary;
        FilterOutcome::Applied
    }

    /// Clears the filter and shows the whole list. Responses still in flight
    /// for earlier tickets become stale.
    pub fn reset_filter(&mut self, transactions: &[Transaction]) {
        self.issued += 1;
        self.applied = self.issued;
        self.criteria = FilterCriteria::default();
        self.show(transactions);
    }

    fn show(&mut self, transactions: &[Transaction]) {
        let selected = filter_transactions(transactions, &self.criteria);
        self.filtered = Summary::from_transactions(selected.iter().copied());
        self.visible = selected.into_iter().cloned().collect();
    }

    pub fn monthly_chart(&self) -> &ChartHandle {
        &self.monthly_chart
    }

    pub fn yearly_chart(&self) -> &ChartHandle {
        &self.yearly_chart
    }

    pub fn monthly_table(&self) -> &[PeriodBucket] {
        &self.monthly_table
    }

    pub fn yearly_table(&self) -> &[PeriodBucket] {
        &self.yearly_table
    }

    pub fn balance(&self) -> Summary {
        self.balance
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn visible(&self) -> &[Transaction] {
        &self.visible
    }

    pub fn filtered(&self) -> Summary {
        self.filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::compute_summary;
    use crate::models::{parse_date, Amount, TransactionKind};

    fn tx(id: i64, date: &str, kind: TransactionKind, amount: i64) -> Transaction {
        Transaction {
            id,
            date: parse_date(date).unwrap(),
            kind,
            category: "General".into(),
            description: None,
            amount: Amount::from_minor(amount),
        }
    }

    fn ledger() -> Vec<Transaction> {
        vec![
            tx(1, "2024-01-05", TransactionKind::Income, 1000),
            tx(2, "2024-01-20", TransactionKind::Expense, 400),
            tx(3, "2024-02-01", TransactionKind::Income, 200),
        ]
    }

    #[test]
    fn test_refresh_derives_every_panel() {
        let mut dashboard = Dashboard::default();
        dashboard.refresh(&ledger());

        assert_eq!(dashboard.balance().balance, Amount::from_minor(800));
        assert_eq!(dashboard.filtered(), dashboard.balance());
        assert_eq!(dashboard.monthly_table()[0].period.to_string(), "2024-02");
        assert_eq!(dashboard.yearly_table().len(), 1);

        let monthly = dashboard.monthly_chart().series().unwrap();
        assert_eq!(monthly.labels, vec!["Jan 24", "Feb 24"]);
        assert_eq!(monthly.current_balance, Amount::from_minor(800));
        assert_eq!(dashboard.visible()[0].id, 3);
    }

    #[test]
    fn test_refresh_after_delete_redraws_charts() {
        let mut dashboard = Dashboard::new(6);
        let mut all = ledger();
        dashboard.refresh(&all);

        all.retain(|t| t.id != 3);
        dashboard.refresh(&all);

        assert_eq!(dashboard.monthly_chart().redraws(), 2);
        assert_eq!(dashboard.monthly_chart().series().unwrap().len(), 1);
        assert_eq!(dashboard.balance().balance, Amount::from_minor(600));
    }

    #[test]
    fn test_refresh_keeps_active_filter() {
        let mut dashboard = Dashboard::default();
        let all = ledger();
        dashboard.refresh(&all);

        let criteria = FilterCriteria::new().with_kind(TransactionKind::Income);
        let ticket = dashboard.begin_filter(criteria.clone());
        let rows: Vec<Transaction> = filter_transactions(&all, &criteria).into_iter().cloned().collect();
        let summary = compute_summary(&all, &criteria);
        assert_eq!(dashboard.apply_filter(ticket, rows, summary), FilterOutcome::Applied);

        dashboard.refresh(&all);
        assert_eq!(dashboard.visible().len(), 2);
        assert_eq!(dashboard.filtered().expense, Amount::ZERO);
    }

    #[test]
    fn test_stale_filter_response_is_dropped() {
        let mut dashboard = Dashboard::default();
        let all = ledger();
        dashboard.refresh(&all);

        let older = dashboard.begin_filter(FilterCriteria::new().with_kind(TransactionKind::Expense));
        let newer = dashboard.begin_filter(FilterCriteria::new().with_kind(TransactionKind::Income));
        assert!(newer.seq() > older.seq());

        let income = newer.criteria().clone();
        let income_rows: Vec<Transaction> =
            filter_transactions(&all, &income).into_iter().cloned().collect();
        let outcome = dashboard.apply_filter(newer, income_rows, compute_summary(&all, &income));
        assert_eq!(outcome, FilterOutcome::Applied);

        let outcome = dashboard.apply_filter(older, Vec::new(), Summary::default());
        assert_eq!(outcome, FilterOutcome::Stale);
        assert_eq!(dashboard.criteria().kind, Some(TransactionKind::Income));
        assert_eq!(dashboard.filtered().income, Amount::from_minor(1200));
    }

    #[test]
    fn test_reset_filter_invalidates_in_flight_requests() {
        let mut dashboard = Dashboard::default();
        let all = ledger();
        dashboard.refresh(&all);

        let pending = dashboard.begin_filter(FilterCriteria::new().with_category("Nope"));
        dashboard.reset_filter(&all);

        assert_eq!(dashboard.apply_filter(pending, Vec::new(), Summary::default()), FilterOutcome::Stale);
        assert!(dashboard.criteria().is_empty());
        assert_eq!(dashboard.visible().len(), 3);
    }

    #[test]
    fn test_chart_handle_replaces_series() {
        let mut handle = ChartHandle::new();
        assert!(handle.series().is_none());

        handle.redraw(ChartSeries::from_buckets(Granularity::Year, &[], Amount::ZERO));
        handle.redraw(ChartSeries::from_buckets(Granularity::Year, &[], Amount::from_minor(500)));

        assert_eq!(handle.redraws(), 2);
        assert_eq!(handle.series().unwrap().current_balance, Amount::from_minor(500));
    }
}
