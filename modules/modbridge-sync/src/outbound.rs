//! Reverse sync: deliver queued operator replies back into the mailbox.
//!
//! Operators queue a reply by writing it into a ticket custom field (the
//! marker). Each cycle finds marked tickets, posts the rendered text into
//! the originating thread, records a delivery-receipt comment on the
//! ticket, and blanks the marker. The receipt is what makes a crash
//! between post and clear survivable: the next cycle sees it in the
//! ticket history and clears the marker without posting again.

use std::collections::HashMap;

use anyhow::Context;
use tracing::{debug, info, warn};

use modbridge_core::{template, HistoryEntry, HistoryKind};

use crate::deps::BridgeDeps;
use crate::runner::CycleError;

/// Counters from one reverse cycle.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    pub marked_tickets: u32,
    pub replies_posted: u32,
    pub already_delivered: u32,
    pub orphaned: u32,
    pub markers_cleared: u32,
}

/// Run one reverse cycle: deliver every marked ticket's pending reply.
pub async fn run_delivery(deps: &BridgeDeps) -> Result<DeliveryStats, CycleError> {
    let config = &deps.config;
    let field = &config.outbound.marker_field;
    let mut stats = DeliveryStats::default();

    let marked = deps
        .tracker
        .search_by_marker(field)
        .await
        .context("Failed to search for marked tickets")?;
    stats.marked_tickets = marked.len() as u32;

    for ticket in &marked {
        // A marker on a ticket the ledger never created cannot be routed
        // anywhere. Leave it in place for an operator to look at.
        let address = match deps
            .ledger
            .source_address_for_ticket(ticket.ticket_id)
            .await
            .context("Ledger lookup failed")?
        {
            Some(address) => address,
            None => {
                warn!(ticket_id = ticket.ticket_id, "Marked ticket has no ledger entry, skipping");
                stats.orphaned += 1;
                continue;
            }
        };

        let body = template::render(
            &config.outbound.template,
            &HashMap::from([("Content", ticket.marker_value.as_str())]),
        );

        let history = deps
            .tracker
            .history(ticket.ticket_id)
            .await
            .with_context(|| format!("Failed to fetch history for ticket {}", ticket.ticket_id))?;

        if delivered_since_marker(&history, &ticket.marker_value, &body) {
            debug!(ticket_id = ticket.ticket_id, "Reply already delivered, clearing marker only");
            stats.already_delivered += 1;
        } else {
            deps.source
                .post_reply(&address, &body)
                .await
                .with_context(|| format!("Failed to post reply for ticket {}", ticket.ticket_id))?;

            // Delivery receipt. If this fails the post still happened;
            // the worst case is one duplicate reply after a crash.
            if let Err(e) = deps.tracker.add_comment(ticket.ticket_id, &body).await {
                warn!(ticket_id = ticket.ticket_id, error = %e, "Reply delivered but receipt comment failed");
            }
            info!(ticket_id = ticket.ticket_id, thread = %address, "Delivered reply to mailbox");
            stats.replies_posted += 1;
        }

        // The marker comes off no matter which branch ran. A marker that
        // cannot be cleared would re-deliver forever, so failing here
        // stops the process.
        deps.tracker
            .clear_marker(ticket.ticket_id, field)
            .await
            .map_err(|e| CycleError::FatalMarkerClear {
                ticket_id: ticket.ticket_id,
                source: e,
            })?;
        stats.markers_cleared += 1;
    }

    Ok(stats)
}

/// Whether the current marker value has already gone out: find the most
/// recent marker-set entry carrying this value, then look for a comment
/// with the rendered body strictly after it.
///
/// No marker-set entry on record means no proof either way; the reply is
/// sent, since posting twice beats silently dropping an operator's words.
fn delivered_since_marker(history: &[HistoryEntry], marker_value: &str, rendered: &str) -> bool {
    let set_at = history.iter().rposition(|e| {
        e.kind == HistoryKind::SetMarker && e.new_value.as_deref() == Some(marker_value)
    });
    let Some(set_at) = set_at else {
        return false;
    };
    history[set_at + 1..]
        .iter()
        .any(|e| e.kind == HistoryKind::Comment && e.description == rendered)
}
