use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::repository::{ContractStore, DecisionStore, StoreError};
use super::service::ContractReviewService;

/// Outcome of one scheduler pass over the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct PassSummary {
    pub processed: usize,
    pub failed: usize,
    /// True when the pass was skipped because another pass was running.
    pub skipped: bool,
}

/// Periodic driver of the review pipeline.
///
/// One pass fetches the pending contracts and reviews them one by one; a
/// failing item is recorded and skipped so the rest of the batch still runs.
/// Passes never overlap: a tick that fires while a pass is in flight is
/// dropped, not queued.
pub struct ContractReviewScheduler<C, D> {
    service: Arc<ContractReviewService<C, D>>,
    interval: Duration,
    running: AtomicBool,
}

impl<C, D> ContractReviewScheduler<C, D>
where
    C: ContractStore + 'static,
    D: DecisionStore + 'static,
{
    pub fn new(service: Arc<ContractReviewService<C, D>>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            running: AtomicBool::new(false),
        }
    }

    /// Run a single pass, unless one is already in flight.
    pub async fn run_once(&self) -> Result<PassSummary, StoreError> {
        if self.running.swap(true, Ordering::AcqRel) {
            warn!("review pass already in flight, skipping this one");
            return Ok(PassSummary {
                skipped: true,
                ..PassSummary::default()
            });
        }

        let outcome = self.pass().await;
        self.running.store(false, Ordering::Release);
        outcome
    }

    async fn pass(&self) -> Result<PassSummary, StoreError> {
        let pending = self.service.pending_contracts()?;
        if pending.is_empty() {
            return Ok(PassSummary::default());
        }

        info!(pending = pending.len(), "starting review pass");
        let mut summary = PassSummary::default();
        for contract in &pending {
            // Per-item isolation: one bad contract must not poison the batch.
            match self.service.process_one(contract, Utc::now()).await {
                Ok(_) => summary.processed += 1,
                Err(err) => {
                    error!(contract = %contract.id.0, %err, "contract left pending after failure");
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            failed = summary.failed,
            "review pass finished"
        );
        Ok(summary)
    }

    /// Tick forever at the configured interval. Spawned once at startup.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_secs = self.interval.as_secs(), "review scheduler started");
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once().await {
                error!(%err, "review pass aborted by store failure");
            }
        }
    }
}
