//! The run loop: discover once, probe each element in order, publish progress.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::harness::types::{ExerciserConfig, RunError, RunReport, RunResult, RunSnapshot};
use crate::page::Page;
use crate::probe::prober::UNAVAILABLE_LABEL;
use crate::probe::{ProbeOutcome, Summary, discover, element_label, probe};

/// Drives runs against a page and keeps the latest [`RunSnapshot`].
///
/// At most one run is in progress at a time; the snapshot survives the run
/// so that an interrupted run's partial results stay readable.
pub struct Exerciser {
    config: ExerciserConfig,
    running: AtomicBool,
    state: watch::Sender<RunSnapshot>,
}

/// Holds the running flag; releasing it clears the live fields of the
/// snapshot however the run ends.
struct RunGuard<'a> {
    running: &'a AtomicBool,
    state: &'a watch::Sender<RunSnapshot>,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool, state: &'a watch::Sender<RunSnapshot>) -> RunResult<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RunError::AlreadyRunning)?;
        Ok(Self { running, state })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|snapshot| {
            snapshot.is_running = false;
            snapshot.current_label = None;
        });
        self.running.store(false, Ordering::Release);
    }
}

impl Exerciser {
    pub fn new(config: ExerciserConfig) -> Self {
        let (state, _) = watch::channel(RunSnapshot::default());
        Self {
            config,
            running: AtomicBool::new(false),
            state,
        }
    }

    pub fn config(&self) -> &ExerciserConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Receiver notified after every change to the snapshot
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.state.subscribe()
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> RunSnapshot {
        self.state.borrow().clone()
    }

    /// Run every discovered element through the prober, in discovery order.
    ///
    /// Previous outcomes are discarded when the run starts. Cancellation is
    /// observed between probes; the probe in flight is always finished and
    /// recorded. Fails only when a run is already in progress.
    pub async fn run<P>(&self, page: &P, cancel: &CancellationToken) -> RunResult<RunReport>
    where
        P: Page + ?Sized,
    {
        let _guard = RunGuard::acquire(&self.running, &self.state)?;
        self.state.send_modify(|snapshot| {
            snapshot.is_running = true;
            snapshot.current_label = None;
            snapshot.outcomes.clear();
        });
        info!(source = page.source_type(), "starting run");

        let elements = match discover(page, &self.config.selectors).await {
            Ok(elements) => elements,
            Err(err) => {
                error!(error = %err, "discovery failed");
                return Ok(self.finish(0, Some(err.to_string())));
            }
        };
        info!(count = elements.len(), "elements discovered");

        for (index, element) in elements.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            let label = match page.inspect(element).await {
                Ok(info) => element_label(&info),
                Err(_) => UNAVAILABLE_LABEL.to_string(),
            };
            debug!(index, %label, "probing");
            self.state.send_modify(|snapshot| snapshot.current_label = Some(label));

            let outcome = probe(page, &self.config, element).await;
            log_outcome(index, &outcome);
            self.state.send_modify(|snapshot| snapshot.outcomes.push(outcome));

            let pause = self.config.timings.inter_probe();
            if index + 1 < elements.len() && !pause.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        Ok(self.finish(elements.len(), None))
    }

    fn finish(&self, discovered: usize, failure: Option<String>) -> RunReport {
        let outcomes = self.state.borrow().outcomes.clone();
        let summary = Summary::from_outcomes(&outcomes);
        let cancelled = failure.is_none() && outcomes.len() < discovered;

        if cancelled {
            info!(probed = outcomes.len(), discovered, "run cancelled");
        }
        info!(
            total = summary.total,
            success = summary.success,
            warning = summary.warning,
            error = summary.error,
            "run finished"
        );

        RunReport {
            outcomes,
            summary,
            discovered,
            cancelled,
            failure,
        }
    }
}

fn log_outcome(index: usize, outcome: &ProbeOutcome) {
    info!(
        index,
        label = %outcome.label,
        status = %outcome.status,
        detail = outcome.detail.as_deref().unwrap_or(""),
        "probe finished"
    );
}
