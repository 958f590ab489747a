//! Runs a list of cases through the comparator with a bounded worker pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::aggregate::ResultAggregator;
use crate::compare::{EndpointComparator, Transport};
use crate::model::{ComparisonOutcome, EndpointRequest, OutcomeKind};

#[derive(Debug, Clone, PartialEq)]
pub struct SweepCase {
    pub request: EndpointRequest,
    pub kind: OutcomeKind,
}

impl SweepCase {
    pub fn endpoint(request: EndpointRequest) -> Self {
        Self {
            request,
            kind: OutcomeKind::Endpoint,
        }
    }

    pub fn not_found_probe(request: EndpointRequest) -> Self {
        Self {
            request,
            kind: OutcomeKind::NotFoundProbe,
        }
    }
}

/// Shared stop signal, checked between endpoints.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    pub completed: usize,
    pub not_run: usize,
    pub cancelled: bool,
}

pub struct Sweep<'a, T> {
    comparator: &'a EndpointComparator<T>,
    workers: usize,
    cancel: CancelFlag,
    stop_on_mismatch: bool,
}

impl<'a, T: Transport> Sweep<'a, T> {
    pub fn new(comparator: &'a EndpointComparator<T>) -> Self {
        Self {
            comparator,
            workers: 1,
            cancel: CancelFlag::new(),
            stop_on_mismatch: false,
        }
    }

    /// Number of endpoints compared at once. Clamped to at least 1.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Cancel the sweep after the first non-matching outcome.
    pub fn stop_on_mismatch(mut self, stop: bool) -> Self {
        self.stop_on_mismatch = stop;
        self
    }

    /// Compare every case and record the outcomes in case order.
    ///
    /// Cases are taken in batches of `workers`; each outcome is recorded
    /// whole. Cancellation takes effect at the next batch boundary.
    pub fn run(&self, cases: &[SweepCase], aggregator: &mut ResultAggregator) -> SweepStats {
        let mut stats = SweepStats::default();

        for batch in cases.chunks(self.workers) {
            if self.cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            for outcome in self.run_batch(batch) {
                log::info!(
                    "{} {} {} ({} / {})",
                    if outcome.overall_match { "match" } else { "MISMATCH" },
                    outcome.method,
                    outcome.endpoint,
                    outcome.local_status,
                    outcome.reference_status
                );
                if !outcome.overall_match && self.stop_on_mismatch {
                    self.cancel.cancel();
                }
                aggregator.record(outcome);
                stats.completed += 1;
            }
        }

        stats.not_run = cases.len() - stats.completed;
        stats
    }

    /// Every case runs on its own scoped thread, including single-case
    /// batches, so a panic always surfaces as a failed outcome.
    fn run_batch(&self, batch: &[SweepCase]) -> Vec<ComparisonOutcome> {
        thread::scope(|s| {
            let handles: Vec<_> = batch
                .iter()
                .map(|case| {
                    s.spawn(move || self.comparator.compare_request(&case.request, case.kind))
                })
                .collect();
            handles
                .into_iter()
                .zip(batch)
                .map(|(h, case)| {
                    h.join().unwrap_or_else(|_| {
                        self.comparator
                            .failed_outcome(&case.request, case.kind, "comparison worker panicked")
                    })
                })
                .collect()
        })
    }
}
