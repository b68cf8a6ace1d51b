//! Cycle loop: forward scan, reverse delivery, sleep, repeat.

use std::fmt;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::deps::BridgeDeps;
use crate::outbound::{self, DeliveryStats};
use crate::reconcile::{self, ScanStats};
use crate::validation::ValidationWindow;

/// One cycle's failure, split by how the loop reacts to it.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Transient mailbox, tracker, or ledger trouble. The next cycle
    /// retries; the ledger guarantees nothing is double-applied.
    #[error(transparent)]
    Recoverable(#[from] anyhow::Error),

    /// The backend broke its own contract. Retrying is still safe, but
    /// it gets a louder log line than routine flakiness.
    #[error("Backend invariant violated: {0}")]
    Invariant(String),

    /// A delivery marker that cannot be cleared would re-deliver on
    /// every cycle, so the process must stop instead.
    #[error("Failed to clear delivery marker on ticket {ticket_id}")]
    FatalMarkerClear {
        ticket_id: i64,
        #[source]
        source: anyhow::Error,
    },
}

impl CycleError {
    /// Whether the loop must stop instead of sleeping and retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CycleError::FatalMarkerClear { .. })
    }
}

/// Counters from one full forward+reverse cycle.
#[derive(Debug, Default)]
pub struct CycleStats {
    pub scan: ScanStats,
    pub delivery: DeliveryStats,
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Cycle Complete ===")?;
        writeln!(f, "Scan mode:          {}", if self.scan.deep { "deep" } else { "normal" })?;
        writeln!(f, "Threads listed:     {}", self.scan.roots_listed)?;
        writeln!(f, "Threads ignored:    {}", self.scan.threads_ignored)?;
        writeln!(f, "Tickets created:    {}", self.scan.tickets_created)?;
        writeln!(f, "Comments added:     {}", self.scan.comments_added)?;
        writeln!(f, "Tickets reopened:   {}", self.scan.tickets_transitioned)?;
        writeln!(f, "Marked tickets:     {}", self.delivery.marked_tickets)?;
        writeln!(f, "Replies delivered:  {}", self.delivery.replies_posted)?;
        writeln!(f, "Already delivered:  {}", self.delivery.already_delivered)?;
        writeln!(f, "Orphaned markers:   {}", self.delivery.orphaned)?;
        write!(f, "Markers cleared:    {}", self.delivery.markers_cleared)
    }
}

/// Drives cycles on the configured interval and owns the deep-scan timer.
pub struct Runner {
    deps: BridgeDeps,
    window: ValidationWindow,
}

impl Runner {
    pub fn new(deps: BridgeDeps) -> Self {
        let scan = &deps.config.scan;
        let window = ValidationWindow::new(
            Utc::now(),
            Duration::minutes(scan.deep_scan_interval_mins),
            Duration::days(scan.deep_scan_lookback_days),
        );
        Self { deps, window }
    }

    /// One forward+reverse cycle. Recoverable failures are logged and
    /// absorbed here, so the caller only ever sees errors that must stop
    /// the process.
    pub async fn run_cycle(&mut self) -> Result<CycleStats, CycleError> {
        let mode = self.window.begin_cycle(Utc::now());
        let mut stats = CycleStats::default();

        match reconcile::run_scan(&self.deps, mode).await {
            Ok(scan) => stats.scan = scan,
            Err(e) if e.is_fatal() => return Err(e),
            Err(CycleError::Invariant(msg)) => {
                error!(%msg, "Forward scan aborted on backend invariant");
            }
            Err(e) => warn!(error = %e, "Forward scan failed, will retry next cycle"),
        }

        // Delivery runs even when the scan failed. The two flows share
        // nothing but the ledger.
        match outbound::run_delivery(&self.deps).await {
            Ok(delivery) => stats.delivery = delivery,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!(error = %e, "Reverse delivery failed, will retry next cycle"),
        }

        Ok(stats)
    }

    /// The scheduling loop. Returns on ctrl-c, or with the fatal error
    /// that stopped it.
    pub async fn run_loop(&mut self) -> Result<(), CycleError> {
        let poll = std::time::Duration::from_secs(self.deps.config.scan.poll_interval_secs);
        loop {
            let stats = self.run_cycle().await?;
            info!(
                deep = stats.scan.deep,
                tickets_created = stats.scan.tickets_created,
                comments_added = stats.scan.comments_added,
                replies_delivered = stats.delivery.replies_posted,
                "Cycle complete"
            );

            tokio::select! {
                _ = tokio::time::sleep(poll) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    return Ok(());
                }
            }
        }
    }
}
