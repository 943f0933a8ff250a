use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::dedup::DedupState;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::journal::{Journal, LogLevel};
use crate::matcher::SearchTerm;
use crate::notify::NotifyBackend;
use crate::source::OutageSource;
use crate::validate::validate_fetch;

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse response.";

/// Result of one fetch + process sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No response at all; the cause is in the fetch journal entry.
    TransportFailed,
    /// Neither the decoded nor the raw body validated.
    Unparseable,
    Checked {
        records: usize,
        dispatch: DispatchOutcome,
    },
}

/// Which trigger hours fired during one tick, in configured order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub fired: Vec<(u32, CheckOutcome)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Polls the outage source at most once per trigger hour per day.
pub struct Scheduler {
    config: Config,
    source: Arc<dyn OutageSource>,
    journal: Arc<dyn Journal>,
    dispatcher: Dispatcher,
    search_term: SearchTerm,
    state: DedupState,
}

impl Scheduler {
    pub fn new(
        config: Config,
        source: Arc<dyn OutageSource>,
        journal: Arc<dyn Journal>,
        notifier: Arc<dyn NotifyBackend>,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            notifier,
            journal.clone(),
            &config.street_name,
            &config.city_name,
        );
        let search_term = SearchTerm::new(&config.street_name);
        Self {
            config,
            source,
            journal,
            dispatcher,
            search_term,
            state: DedupState::new(),
        }
    }

    pub fn state(&self) -> &DedupState {
        &self.state
    }

    /// Run every trigger hour that matches `now` and has not fired today.
    /// Each fired hour is marked for today whatever the check's outcome.
    pub async fn tick(&mut self, now: NaiveDateTime) -> TickReport {
        let today = now.date();
        let due: Vec<u32> = self
            .config
            .hours
            .iter()
            .copied()
            .filter(|&hour| hour == now.hour() && self.state.is_due(hour, today))
            .collect();

        let mut report = TickReport::default();
        for hour in due {
            info!(hour, date = %today, "Trigger hour reached, checking outages");
            let outcome = self.check_now(now).await;
            self.state.mark_fired(hour, today);
            report.fired.push((hour, outcome));
        }
        report
    }

    /// One unscheduled fetch + validate + dispatch. Leaves dedup state alone.
    pub async fn check_now(&self, now: NaiveDateTime) -> CheckOutcome {
        let result = self
            .source
            .fetch(
                now,
                &self.config.city_sym,
                self.config.interval_days,
                self.config.request_timeout(),
            )
            .await;
        self.journal.record_fetch(&result).await;

        if result.is_transport_error() {
            warn!(
                url = %result.url,
                error = result.error.as_deref().unwrap_or("no status"),
                "Outage fetch failed, skipping until next trigger hour"
            );
            return CheckOutcome::TransportFailed;
        }

        let records = match validate_fetch(&result) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, path = e.path(), "Outage response rejected");
                self.journal
                    .record_message(now, LogLevel::Error, PARSE_FAILURE_MESSAGE)
                    .await;
                return CheckOutcome::Unparseable;
            }
        };

        info!(records = records.len(), "Outage response parsed");
        let dispatch = self.dispatcher.dispatch(&records, &self.search_term, now).await;

        CheckOutcome::Checked {
            records: records.len(),
            dispatch,
        }
    }

    /// Tick on the wall clock until `shutdown` is cancelled. Cancellation
    /// interrupts both the idle wait and an in-flight tick; an interrupted
    /// tick does not mark its hour as fired.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            hours = ?self.config.hours,
            poll_interval_seconds = self.config.poll_interval_seconds,
            "Outage watch scheduler started"
        );

        loop {
            let now = Local::now().naive_local();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                report = self.tick(now) => {
                    for (hour, outcome) in &report.fired {
                        info!(hour, outcome = ?outcome, "Trigger hour done");
                    }
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }

        info!("Shutdown signal received, scheduler stopped");
    }
}
