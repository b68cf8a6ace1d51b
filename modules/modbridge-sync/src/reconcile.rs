//! Forward sync: mirror mailbox threads into tracker tickets.
//!
//! One cycle walks the feed in the order the source hands it out. Every
//! external write is recorded in the ledger immediately after it
//! succeeds, so a crash anywhere leaves at worst one re-creatable write
//! behind, never a lost one.

use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use modbridge_core::{route_queue, template, FileConfig, Reply, ThreadRoot};

use crate::deps::BridgeDeps;
use crate::runner::CycleError;
use crate::validation::ScanMode;

/// Counters from one forward cycle.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub deep: bool,
    pub roots_listed: u32,
    pub threads_ignored: u32,
    pub tickets_created: u32,
    pub comments_added: u32,
    pub tickets_transitioned: u32,
    pub stopped_at_seen: bool,
    pub stopped_at_cutoff: bool,
}

/// Whether the scan keeps walking the feed after a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVerdict {
    Continue,
    Stop,
}

/// Early-stop rule, evaluated after a thread has been processed.
///
/// Normal cycles trust the newest-first ordering: the first thread with
/// nothing new means everything behind it has been handled too. Deep
/// cycles distrust that ordering and only stop once a fully-seen thread
/// is also older than the horizon.
pub fn scan_verdict(mode: ScanMode, fully_seen: bool, newest_at: DateTime<Utc>) -> ScanVerdict {
    if !fully_seen {
        return ScanVerdict::Continue;
    }
    match mode {
        ScanMode::Normal => ScanVerdict::Stop,
        ScanMode::Deep { horizon } => {
            if newest_at < horizon {
                ScanVerdict::Stop
            } else {
                ScanVerdict::Continue
            }
        }
    }
}

/// Run one forward cycle in the given mode.
pub async fn run_scan(deps: &BridgeDeps, mode: ScanMode) -> Result<ScanStats, CycleError> {
    let config = &deps.config;
    let mut stats = ScanStats {
        deep: matches!(mode, ScanMode::Deep { .. }),
        ..Default::default()
    };

    let roots = deps
        .source
        .list_roots(config.scan.max_roots)
        .await
        .context("Failed to list mailbox threads")?;
    stats.roots_listed = roots.len() as u32;

    for root in &roots {
        // Replies first: the thread's newest timestamp has to be known
        // before any processing decision is made about it.
        let replies = deps
            .source
            .replies(&root.id)
            .await
            .with_context(|| format!("Failed to fetch replies for thread {}", root.id))?;

        let newest_at = replies
            .iter()
            .map(|r| r.created_at)
            .fold(root.created_at, |a, b| a.max(b));

        if newest_at < config.scan.absolute_cutoff {
            debug!(thread = %root.id, "Reached absolute cutoff, stopping scan");
            stats.stopped_at_cutoff = true;
            break;
        }

        if config.ignore.matches(&root.author, &root.subject) {
            debug!(thread = %root.id, author = %root.author, "Ignoring thread");
            stats.threads_ignored += 1;
            continue;
        }

        let (ticket_id, already_had_root) = match deps
            .ledger
            .ticket_for_root(&root.id)
            .await
            .context("Ledger lookup failed")?
        {
            Some(id) => (id, true),
            None => {
                let id = create_ticket_for(deps, root).await?;
                deps.ledger
                    .record_root(&root.id, id)
                    .await
                    .with_context(|| format!("Failed to record thread {} in ledger", root.id))?;
                stats.tickets_created += 1;
                (id, false)
            }
        };

        // Reply pass, in thread order.
        let mut new_replies = 0u32;
        let mut saw_new_human_reply = false;
        for reply in &replies {
            if deps
                .ledger
                .reply_processed(&root.id, &reply.id)
                .await
                .context("Ledger lookup failed")?
            {
                continue;
            }

            let body = render_comment(config, root, reply);
            deps.tracker
                .add_comment(ticket_id, &body)
                .await
                .with_context(|| format!("Failed to comment on ticket {ticket_id}"))?;
            deps.ledger
                .record_reply(&root.id, &reply.id)
                .await
                .with_context(|| format!("Failed to record reply {} in ledger", reply.id))?;
            stats.comments_added += 1;
            new_replies += 1;

            if !reply.author.eq_ignore_ascii_case(&config.identity.bot_account) {
                saw_new_human_reply = true;
            }
        }

        // A closed-out ticket whose thread got fresh human activity comes
        // back into the configured working status.
        if already_had_root && saw_new_human_reply && config.transition.enabled {
            let status = deps
                .tracker
                .status(ticket_id)
                .await
                .with_context(|| format!("Failed to read status of ticket {ticket_id}"))?;
            let triggered = config
                .transition
                .triggers
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&status));
            if triggered {
                info!(ticket_id, from = %status, to = %config.transition.target, "Reopening ticket on new reply");
                deps.tracker
                    .set_status(ticket_id, &config.transition.target)
                    .await
                    .with_context(|| format!("Failed to set status of ticket {ticket_id}"))?;
                stats.tickets_transitioned += 1;
            }
        }

        let fully_seen = already_had_root && new_replies == 0;
        if scan_verdict(mode, fully_seen, newest_at) == ScanVerdict::Stop {
            debug!(thread = %root.id, deep = stats.deep, "Nothing new, stopping scan");
            stats.stopped_at_seen = true;
            break;
        }
    }

    Ok(stats)
}

async fn create_ticket_for(deps: &BridgeDeps, root: &ThreadRoot) -> Result<i64, CycleError> {
    let config = &deps.config;
    let url = thread_url(config, &root.id);
    let vars = HashMap::from([
        ("Author", root.author.as_str()),
        ("Subject", root.subject.as_str()),
        ("ModmailMessageUrl", url.as_str()),
        ("Content", root.body.as_str()),
    ]);
    let subject = template::render(&config.templates.ticket_subject, &vars);
    let body = template::render(&config.templates.ticket_body, &vars);
    let queue = route_queue(&config.routing.rules, config.routing.default_queue, &root.author);

    let ticket_id = deps
        .tracker
        .create_ticket(queue, &subject, &body)
        .await
        .with_context(|| format!("Failed to create ticket for thread {}", root.id))?;
    if ticket_id < 1 {
        return Err(CycleError::Invariant(format!(
            "Tracker returned ticket id {ticket_id} for thread {}",
            root.id
        )));
    }

    info!(ticket_id, queue, thread = %root.id, "Created ticket");
    Ok(ticket_id)
}

fn render_comment(config: &FileConfig, root: &ThreadRoot, reply: &Reply) -> String {
    let url = thread_url(config, &root.id);
    let vars = HashMap::from([
        ("Author", reply.author.as_str()),
        ("Subject", root.subject.as_str()),
        ("ModmailMessageUrl", url.as_str()),
        ("Content", reply.body.as_str()),
    ]);
    template::render(&config.templates.comment_body, &vars)
}

fn thread_url(config: &FileConfig, root_id: &str) -> String {
    template::render(&config.templates.thread_url, &HashMap::from([("Id", root_id)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn normal_mode_stops_on_fully_seen() {
        let now = Utc::now();
        assert_eq!(
            scan_verdict(ScanMode::Normal, true, now),
            ScanVerdict::Stop
        );
        assert_eq!(
            scan_verdict(ScanMode::Normal, false, now),
            ScanVerdict::Continue
        );
    }

    #[test]
    fn deep_mode_pushes_through_seen_threads_inside_horizon() {
        let now = Utc::now();
        let mode = ScanMode::Deep {
            horizon: now - Duration::days(30),
        };
        assert_eq!(
            scan_verdict(mode, true, now - Duration::days(5)),
            ScanVerdict::Continue
        );
        assert_eq!(
            scan_verdict(mode, false, now - Duration::days(45)),
            ScanVerdict::Continue
        );
    }

    #[test]
    fn deep_mode_stops_on_seen_thread_past_horizon() {
        let now = Utc::now();
        let mode = ScanMode::Deep {
            horizon: now - Duration::days(30),
        };
        assert_eq!(
            scan_verdict(mode, true, now - Duration::days(45)),
            ScanVerdict::Stop
        );
    }
}
