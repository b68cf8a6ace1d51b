//! Shared dependencies for the forward and reverse cycles.

use std::sync::Arc;

use modbridge_core::{FileConfig, ThreadSource, TicketTracker};
use modbridge_ledger::Ledger;

/// Everything a cycle needs. The trait objects are the live REST clients
/// in production and in-memory mocks in tests.
#[derive(Clone)]
pub struct BridgeDeps {
    pub source: Arc<dyn ThreadSource>,
    pub tracker: Arc<dyn TicketTracker>,
    pub ledger: Ledger,
    pub config: Arc<FileConfig>,
}
