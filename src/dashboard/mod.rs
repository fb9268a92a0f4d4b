//! Dashboard orchestration.
//!
//! [`Dashboard`] ties the pieces together: the [`controller`] state machine,
//! a [`MetricsSource`], the filter cookie, and the diagnostics channel. It
//! executes the controller's fetch tickets synchronously and reports
//! failures without surfacing them to the user; the previous dataset stays
//! on screen.

pub mod charts;
pub mod controller;

use anyhow::Result;

use crate::diagnostics::{DiagnosticEvent, Diagnostics, EventKind};
use crate::filters::FilterSelection;
use crate::filters::store::{self, FilterEdit};
use crate::metrics::MetricsSource;
use crate::utils::cookies::CookieJar;

use charts::DashboardView;
use controller::{BarSelection, Completion, DashboardController, FetchTicket, Slot};

/// A mounted (or mountable) dashboard bound to a metrics source.
#[derive(Debug)]
pub struct Dashboard<S: MetricsSource> {
    controller: DashboardController,
    source: S,
    diagnostics: Diagnostics,
}

impl<S: MetricsSource> Dashboard<S> {
    pub fn new(source: S, diagnostics: Diagnostics) -> Self {
        Self {
            controller: DashboardController::new(),
            source,
            diagnostics,
        }
    }

    pub fn controller(&self) -> &DashboardController {
        &self.controller
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mount with the resolved initial selection and load the aggregate.
    ///
    /// A rejected selection (inverted range) is logged; the view still
    /// mounts with empty charts.
    pub fn mount(&mut self, initial: FilterSelection) -> Completion {
        match self.controller.mount(initial) {
            Ok(ticket) => self.run(ticket),
            Err(e) => {
                self.reject(&e);
                Completion::Failed
            }
        }
    }

    /// Edit one filter field and persist the whole selection to the cookie.
    pub fn edit_filter(&mut self, edit: FilterEdit, jar: &mut CookieJar) -> Result<()> {
        let selection = self.controller.edit_filter(edit)?;
        store::persist(selection, jar)
    }

    /// "Apply Filters": refetch the aggregate for the current selection.
    pub fn apply_filters(&mut self) -> Result<Completion> {
        let ticket = self.controller.apply_filters().inspect_err(|e| self.reject(e))?;
        Ok(self.run(ticket))
    }

    /// Bar click: fetch the time series for the clicked feature.
    pub fn select_bar(&mut self, selection: &BarSelection) -> Result<Completion> {
        let ticket = self.controller.select_bar(selection)?;
        Ok(self.run(ticket))
    }

    /// "Copy Share URL".
    pub fn share_url(&self, base_url: &str) -> Result<String> {
        self.controller.share_url(base_url)
    }

    pub fn unmount(&mut self) {
        self.controller.unmount();
    }

    /// Render-ready snapshot of the current state.
    pub fn view(&self) -> DashboardView {
        DashboardView {
            filters: self.controller.filters().clone(),
            bar_chart: charts::bar_chart(self.controller.aggregate()),
            line_chart: charts::line_chart(self.controller.time_series()),
            selected_feature: self.controller.selected_feature().map(str::to_string),
        }
    }

    /// Execute a ticket and feed the outcome back to the controller.
    fn run(&mut self, ticket: FetchTicket) -> Completion {
        let outcome = ticket.execute(&self.source);

        if let Err(e) = &outcome {
            let endpoint = match ticket.slot() {
                Slot::Aggregate => self.source.aggregate_endpoint(),
                Slot::TimeSeries => self.source.time_series_endpoint(),
            };
            let message = format!("{} fetch failed: {e:#}", slot_name(ticket.slot()));
            self.diagnostics.record(
                DiagnosticEvent::new(EventKind::FetchFailed, message)
                    .with_endpoint(endpoint)
                    .with_feature(ticket.feature()),
            );
        }

        let slot = ticket.slot();
        let feature = ticket.feature().map(str::to_string);
        let completion = self.controller.complete(ticket, outcome);
        if completion == Completion::Stale {
            self.diagnostics.record(
                DiagnosticEvent::new(EventKind::FetchStale, format!("discarded stale {} result", slot_name(slot)))
                    .with_feature(feature.as_deref()),
            );
        }
        completion
    }

    fn reject(&self, error: &anyhow::Error) {
        self.diagnostics.record(DiagnosticEvent::new(
            EventKind::FetchRejected,
            format!("fetch not issued: {error}"),
        ));
    }
}

fn slot_name(slot: Slot) -> &'static str {
    match slot {
        Slot::Aggregate => "aggregate",
        Slot::TimeSeries => "time-series",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
