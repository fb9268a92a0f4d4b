//! Dashboard state machine.
//!
//! The controller owns the filter selection and the two derived datasets.
//! It never performs I/O: every operation that needs data returns a
//! [`FetchTicket`], the caller executes it against a
//! [`MetricsSource`](crate::metrics::MetricsSource), and hands the outcome
//! back to [`DashboardController::complete`].
//!
//! Each dataset slot has its own generation counter. Issuing a ticket bumps
//! the counter; completing a ticket whose generation is no longer current is
//! a no-op. A slow response can therefore never overwrite the result of a
//! request issued after it, and nothing lands after [`unmount`].
//!
//! [`unmount`]: DashboardController::unmount

use anyhow::Result;

use crate::filters::store::FilterEdit;
use crate::filters::{FilterSelection, share};
use crate::metrics::{AggregateDatum, MetricsSource, TimeSeriesDatum};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Lifecycle of the dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Ready,
}

/// Which dataset a fetch writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Aggregate,
    TimeSeries,
}

/// How the user picked a bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarSelection {
    /// Position in the displayed (sorted) label list.
    Index(usize),
    /// Feature carried by the clicked segment.
    Feature(String),
}

/// A fetch the controller wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    slot: Slot,
    generation: u64,
    feature: Option<String>,
    selection: FilterSelection,
}

impl FetchTicket {
    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Feature being drilled into (time-series tickets only).
    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    /// Snapshot of the selection at the time the ticket was issued.
    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// Run the request this ticket describes.
    pub fn execute<S: MetricsSource + ?Sized>(&self, source: &S) -> Result<FetchOutcome> {
        match (self.slot, self.feature.as_deref()) {
            (Slot::Aggregate, _) => source.fetch_aggregate(&self.selection).map(FetchOutcome::Aggregate),
            (Slot::TimeSeries, Some(feature)) => source
                .fetch_time_series(feature, &self.selection)
                .map(FetchOutcome::TimeSeries),
            (Slot::TimeSeries, None) => anyhow::bail!("time-series ticket without a feature"),
        }
    }
}

/// Data returned by a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Aggregate(Vec<AggregateDatum>),
    TimeSeries(Vec<TimeSeriesDatum>),
}

/// What [`DashboardController::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The dataset was replaced.
    Applied,
    /// A newer ticket exists for the slot (or the view was unmounted); ignored.
    Stale,
    /// The fetch failed; the dataset is unchanged.
    Failed,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Filter selection plus derived chart datasets.
#[derive(Debug, Clone)]
pub struct DashboardController {
    state: ControllerState,
    filters: FilterSelection,
    aggregate: Vec<AggregateDatum>,
    time_series: Vec<TimeSeriesDatum>,
    selected_feature: Option<String>,
    aggregate_generation: u64,
    time_series_generation: u64,
}

impl Default for DashboardController {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardController {
    pub fn new() -> Self {
        Self {
            state: ControllerState::Uninitialized,
            filters: FilterSelection::default(),
            aggregate: Vec::new(),
            time_series: Vec::new(),
            selected_feature: None,
            aggregate_generation: 0,
            time_series_generation: 0,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    /// Aggregate dataset, sorted by feature.
    pub fn aggregate(&self) -> &[AggregateDatum] {
        &self.aggregate
    }

    pub fn time_series(&self) -> &[TimeSeriesDatum] {
        &self.time_series
    }

    /// Feature whose time series is currently displayed.
    pub fn selected_feature(&self) -> Option<&str> {
        self.selected_feature.as_deref()
    }

    /// Displayed bar labels, in display order.
    pub fn labels(&self) -> Vec<&str> {
        self.aggregate.iter().map(|d| d.feature.as_str()).collect()
    }

    // -- events -------------------------------------------------------------

    /// Enter `Ready` with the resolved initial selection and request the
    /// aggregate dataset.
    ///
    /// The controller is `Ready` afterwards even when the selection is
    /// rejected, so the user can correct the filters.
    pub fn mount(&mut self, initial: FilterSelection) -> Result<FetchTicket> {
        if self.state == ControllerState::Ready {
            anyhow::bail!("dashboard is already mounted");
        }
        self.state = ControllerState::Ready;
        self.filters = initial;
        self.issue(Slot::Aggregate, None)
    }

    /// Apply one field edit. Does not refetch.
    pub fn edit_filter(&mut self, edit: FilterEdit) -> Result<&FilterSelection> {
        self.ensure_ready()?;
        edit.apply(&mut self.filters);
        Ok(&self.filters)
    }

    /// Request the aggregate dataset for the current selection.
    pub fn apply_filters(&mut self) -> Result<FetchTicket> {
        self.ensure_ready()?;
        self.issue(Slot::Aggregate, None)
    }

    /// Resolve a bar selection to the feature it displays.
    pub fn resolve_bar(&self, selection: &BarSelection) -> Result<String> {
        match selection {
            BarSelection::Index(index) => self
                .aggregate
                .get(*index)
                .map(|d| d.feature.clone())
                .ok_or_else(|| anyhow::anyhow!("no bar at index {index}")),
            BarSelection::Feature(feature) => {
                if self.aggregate.iter().any(|d| &d.feature == feature) {
                    Ok(feature.clone())
                } else {
                    anyhow::bail!("feature '{feature}' is not displayed")
                }
            }
        }
    }

    /// Request the time series for the selected bar.
    pub fn select_bar(&mut self, selection: &BarSelection) -> Result<FetchTicket> {
        self.ensure_ready()?;
        let feature = self.resolve_bar(selection)?;
        self.issue(Slot::TimeSeries, Some(feature))
    }

    /// Shareable URL for the current selection. No state change.
    pub fn share_url(&self, base_url: &str) -> Result<String> {
        share::to_shareable_url(&self.filters, base_url)
    }

    /// Clear both datasets and discard any in-flight results.
    pub fn unmount(&mut self) {
        self.aggregate.clear();
        self.time_series.clear();
        self.selected_feature = None;
        self.aggregate_generation += 1;
        self.time_series_generation += 1;
        self.state = ControllerState::Uninitialized;
    }

    /// Apply the outcome of a ticket.
    pub fn complete(&mut self, ticket: FetchTicket, outcome: Result<FetchOutcome>) -> Completion {
        if self.state != ControllerState::Ready || ticket.generation != self.generation(ticket.slot) {
            return Completion::Stale;
        }

        match (ticket.slot, outcome) {
            (Slot::Aggregate, Ok(FetchOutcome::Aggregate(mut data))) => {
                sort_by_feature(&mut data);
                self.aggregate = data;
                Completion::Applied
            }
            (Slot::TimeSeries, Ok(FetchOutcome::TimeSeries(data))) => {
                self.time_series = data;
                self.selected_feature = ticket.feature;
                Completion::Applied
            }
            _ => Completion::Failed,
        }
    }

    // -- internals ----------------------------------------------------------

    fn ensure_ready(&self) -> Result<()> {
        if self.state != ControllerState::Ready {
            anyhow::bail!("dashboard is not mounted");
        }
        Ok(())
    }

    fn generation(&self, slot: Slot) -> u64 {
        match slot {
            Slot::Aggregate => self.aggregate_generation,
            Slot::TimeSeries => self.time_series_generation,
        }
    }

    fn issue(&mut self, slot: Slot, feature: Option<String>) -> Result<FetchTicket> {
        self.filters.validate()?;

        let generation = match slot {
            Slot::Aggregate => {
                self.aggregate_generation += 1;
                self.aggregate_generation
            }
            Slot::TimeSeries => {
                self.time_series_generation += 1;
                self.time_series_generation
            }
        };

        Ok(FetchTicket {
            slot,
            generation,
            feature,
            selection: self.filters.clone(),
        })
    }
}

/// Sort ascending by feature name (byte-wise lexicographic). Bar index
/// resolution depends on this order matching the displayed labels.
pub fn sort_by_feature(data: &mut [AggregateDatum]) {
    data.sort_by(|a, b| a.feature.cmp(&b.feature));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn datum(feature: &str, total: f64) -> AggregateDatum {
        AggregateDatum {
            feature: feature.to_string(),
            total_time_spent: total,
        }
    }

    fn day(d: u32, total: f64) -> TimeSeriesDatum {
        TimeSeriesDatum {
            date: NaiveDate::from_ymd_opt(2022, 10, d).unwrap(),
            total_time_spent: total,
            count: 1,
        }
    }

    fn mounted_with(data: Vec<AggregateDatum>) -> DashboardController {
        let mut controller = DashboardController::new();
        let ticket = controller.mount(FilterSelection::default()).unwrap();
        assert_eq!(
            controller.complete(ticket, Ok(FetchOutcome::Aggregate(data))),
            Completion::Applied
        );
        controller
    }

    #[test]
    fn starts_uninitialized_and_mount_issues_aggregate() {
        let mut controller = DashboardController::new();
        assert_eq!(controller.state(), ControllerState::Uninitialized);

        let ticket = controller.mount(FilterSelection::default()).unwrap();
        assert_eq!(controller.state(), ControllerState::Ready);
        assert_eq!(ticket.slot(), Slot::Aggregate);
        assert_eq!(ticket.selection(), &FilterSelection::default());
    }

    #[test]
    fn events_before_mount_are_rejected() {
        let mut controller = DashboardController::new();
        assert!(controller.apply_filters().is_err());
        assert!(controller.select_bar(&BarSelection::Index(0)).is_err());
    }

    #[test]
    fn double_mount_is_rejected() {
        let mut controller = DashboardController::new();
        controller.mount(FilterSelection::default()).unwrap();
        assert!(controller.mount(FilterSelection::default()).is_err());
    }

    #[test]
    fn aggregate_is_sorted_on_apply() {
        let controller = mounted_with(vec![datum("b", 2.0), datum("c", 3.0), datum("a", 1.0)]);
        assert_eq!(controller.labels(), vec!["a", "b", "c"]);
        assert_eq!(controller.aggregate()[0].total_time_spent, 1.0);
    }

    #[test]
    fn index_resolves_against_sorted_order() {
        let mut controller = mounted_with(vec![datum("b", 2.0), datum("a", 1.0)]);
        let ticket = controller.select_bar(&BarSelection::Index(0)).unwrap();
        assert_eq!(ticket.feature(), Some("a"));
    }

    #[test]
    fn feature_selection_must_be_displayed() {
        let mut controller = mounted_with(vec![datum("a", 1.0)]);
        assert!(controller.select_bar(&BarSelection::Feature("z".to_string())).is_err());
        assert!(controller.select_bar(&BarSelection::Index(5)).is_err());

        let ticket = controller.select_bar(&BarSelection::Feature("a".to_string())).unwrap();
        assert_eq!(ticket.slot(), Slot::TimeSeries);
    }

    #[test]
    fn edit_does_not_issue_fetch() {
        let mut controller = mounted_with(vec![datum("a", 1.0)]);
        let before = controller.aggregate_generation;
        controller
            .edit_filter(FilterEdit::parse("gender", "Female").unwrap())
            .unwrap();
        assert_eq!(controller.aggregate_generation, before);
        assert_eq!(controller.filters().gender.as_str(), "Female");
    }

    #[test]
    fn apply_snapshot_reflects_edits() {
        let mut controller = mounted_with(vec![]);
        controller
            .edit_filter(FilterEdit::parse("age", ">25").unwrap())
            .unwrap();
        let ticket = controller.apply_filters().unwrap();
        assert_eq!(ticket.selection().age.as_str(), ">25");
    }

    #[test]
    fn failure_keeps_previous_dataset() {
        let mut controller = mounted_with(vec![datum("a", 1.0)]);
        let ticket = controller.apply_filters().unwrap();
        let result = controller.complete(ticket, Err(anyhow::anyhow!("boom")));

        assert_eq!(result, Completion::Failed);
        assert_eq!(controller.labels(), vec!["a"]);
    }

    #[test]
    fn series_failure_keeps_previous_series_and_feature() {
        let mut controller = mounted_with(vec![datum("a", 1.0), datum("b", 2.0)]);
        let ticket = controller.select_bar(&BarSelection::Index(0)).unwrap();
        controller.complete(ticket, Ok(FetchOutcome::TimeSeries(vec![day(1, 5.0)])));

        let ticket = controller.select_bar(&BarSelection::Index(1)).unwrap();
        assert_eq!(ticket.feature(), Some("b"));
        let result = controller.complete(ticket, Err(anyhow::anyhow!("HTTP 500")));

        assert_eq!(result, Completion::Failed);
        assert_eq!(controller.time_series(), &[day(1, 5.0)]);
        assert_eq!(controller.selected_feature(), Some("a"));
    }

    #[test]
    fn apply_keeps_time_series() {
        let mut controller = mounted_with(vec![datum("a", 1.0)]);
        let ticket = controller.select_bar(&BarSelection::Index(0)).unwrap();
        controller.complete(ticket, Ok(FetchOutcome::TimeSeries(vec![day(1, 5.0)])));

        let ticket = controller.apply_filters().unwrap();
        controller.complete(ticket, Ok(FetchOutcome::Aggregate(vec![datum("z", 9.0)])));

        assert_eq!(controller.time_series().len(), 1);
        assert_eq!(controller.selected_feature(), Some("a"));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut controller = mounted_with(vec![]);
        let older = controller.apply_filters().unwrap();
        let newer = controller.apply_filters().unwrap();
        assert!(newer.generation() > older.generation());

        assert_eq!(
            controller.complete(newer, Ok(FetchOutcome::Aggregate(vec![datum("new", 1.0)]))),
            Completion::Applied
        );
        assert_eq!(
            controller.complete(older, Ok(FetchOutcome::Aggregate(vec![datum("old", 1.0)]))),
            Completion::Stale
        );
        assert_eq!(controller.labels(), vec!["new"]);
    }

    #[test]
    fn slots_have_independent_generations() {
        let mut controller = mounted_with(vec![datum("a", 1.0)]);
        let series = controller.select_bar(&BarSelection::Index(0)).unwrap();
        let aggregate = controller.apply_filters().unwrap();

        assert_eq!(
            controller.complete(series, Ok(FetchOutcome::TimeSeries(vec![day(2, 1.0)]))),
            Completion::Applied
        );
        assert_eq!(
            controller.complete(aggregate, Ok(FetchOutcome::Aggregate(vec![datum("b", 1.0)]))),
            Completion::Applied
        );
    }

    #[test]
    fn mismatched_outcome_is_a_failure() {
        let mut controller = mounted_with(vec![]);
        let ticket = controller.apply_filters().unwrap();
        assert_eq!(
            controller.complete(ticket, Ok(FetchOutcome::TimeSeries(vec![]))),
            Completion::Failed
        );
    }

    #[test]
    fn unmount_clears_and_discards_in_flight() {
        let mut controller = mounted_with(vec![datum("a", 1.0)]);
        let ticket = controller.select_bar(&BarSelection::Index(0)).unwrap();
        controller.unmount();

        assert!(controller.aggregate().is_empty());
        assert!(controller.time_series().is_empty());
        assert_eq!(controller.state(), ControllerState::Uninitialized);
        assert_eq!(
            controller.complete(ticket, Ok(FetchOutcome::TimeSeries(vec![day(1, 1.0)]))),
            Completion::Stale
        );
    }

    #[test]
    fn remount_after_unmount() {
        let mut controller = mounted_with(vec![]);
        controller.unmount();
        assert!(controller.mount(FilterSelection::default()).is_ok());
    }

    #[test]
    fn inverted_range_blocks_fetch_but_not_mount() {
        let mut controller = DashboardController::new();
        let mut selection = FilterSelection::default();
        std::mem::swap(&mut selection.start_date, &mut selection.end_date);

        assert!(controller.mount(selection).is_err());
        assert_eq!(controller.state(), ControllerState::Ready);
        assert!(controller.apply_filters().is_err());

        controller
            .edit_filter(FilterEdit::parse("startDate", "01-10-2022").unwrap())
            .unwrap();
        assert!(controller.apply_filters().is_ok());
    }

    #[test]
    fn share_url_uses_current_filters() {
        let controller = mounted_with(vec![]);
        let url = controller.share_url("http://localhost:5173/dashboard").unwrap();
        assert!(url.ends_with("startDate=01-10-2022&endDate=08-10-2022"));
    }
}
