//! Reverse sync integration tests: marked tickets → delivery into the
//! mock mailbox, receipt comments, marker clearing.
//!
//! Run with: cargo test -p modbridge-sync --test outbound_test

use std::sync::Arc;

use chrono::Utc;

use modbridge_core::file_config::{
    FileConfig, IdentityConfig, OutboundConfig, RoutingConfig, ScanConfig, TemplatesConfig,
    TransitionConfig,
};
use modbridge_core::{HistoryEntry, HistoryKind, IgnoreList, TicketTracker};
use modbridge_ledger::Ledger;
use modbridge_sync::deps::BridgeDeps;
use modbridge_sync::outbound;
use modbridge_sync::testing::{thread, MockMailbox, MockTracker};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config() -> FileConfig {
    FileConfig {
        identity: IdentityConfig {
            bot_account: "ticketbridge".to_string(),
        },
        scan: ScanConfig::default(),
        ignore: IgnoreList::default(),
        routing: RoutingConfig::default(),
        transition: TransitionConfig::default(),
        outbound: OutboundConfig::default(),
        templates: TemplatesConfig {
            thread_url: "https://mail.example.org/message/{Id}".to_string(),
            ticket_subject: "Modmail - {Author} - {Subject}".to_string(),
            ticket_body: "Post from {Author}\nResponse URL: {ModmailMessageUrl}\nContents:\n{Content}".to_string(),
            comment_body: "Post from {Author}\nContents:\n{Content}".to_string(),
        },
    }
}

async fn make_deps(
    mailbox: Arc<MockMailbox>,
    tracker: Arc<MockTracker>,
    config: FileConfig,
) -> BridgeDeps {
    let ledger = Ledger::connect("sqlite::memory:").await.expect("ledger connect");
    ledger.migrate().await.expect("ledger migrate");
    BridgeDeps {
        source: mailbox,
        tracker,
        ledger,
        config: Arc::new(config),
    }
}

fn filler(description: &str) -> HistoryEntry {
    HistoryEntry {
        kind: HistoryKind::Other,
        description: description.to_string(),
        old_value: None,
        new_value: None,
        at: Utc::now(),
    }
}

// ===========================================================================
// Delivery
// ===========================================================================

#[tokio::test]
async fn delivers_marked_ticket_and_clears() {
    let mailbox = Arc::new(MockMailbox::new().with_thread(thread("t1", "alice", "appeal", 3), vec![]));
    let tracker = Arc::new(MockTracker::new().with_ticket(42, "open"));
    let deps = make_deps(mailbox.clone(), tracker.clone(), test_config()).await;

    deps.ledger.record_root("t1", 42).await.unwrap();
    tracker.queue_outbound(42, "We re-checked the logs, you're unbanned.");

    let stats = outbound::run_delivery(&deps).await.expect("delivery");

    assert_eq!(stats.marked_tickets, 1);
    assert_eq!(stats.replies_posted, 1);
    assert_eq!(stats.markers_cleared, 1);
    assert_eq!(
        mailbox.posted(),
        vec![("t1".to_string(), "We re-checked the logs, you're unbanned.".to_string())]
    );
    // The receipt comment is the replay guard for the next cycle.
    assert_eq!(
        tracker.comments_of(42),
        vec!["We re-checked the logs, you're unbanned."]
    );
    assert!(!tracker.is_marked(42));
}

#[tokio::test]
async fn delivers_every_marked_ticket() {
    let mailbox = Arc::new(
        MockMailbox::new()
            .with_thread(thread("ta", "alice", "one", 1), vec![])
            .with_thread(thread("tb", "bob", "two", 2), vec![]),
    );
    let tracker = Arc::new(MockTracker::new().with_ticket(1, "open").with_ticket(2, "open"));
    let deps = make_deps(mailbox.clone(), tracker.clone(), test_config()).await;

    deps.ledger.record_root("ta", 1).await.unwrap();
    deps.ledger.record_root("tb", 2).await.unwrap();
    tracker.queue_outbound(1, "first answer");
    tracker.queue_outbound(2, "second answer");

    let stats = outbound::run_delivery(&deps).await.expect("delivery");
    assert_eq!(stats.replies_posted, 2);
    assert_eq!(stats.markers_cleared, 2);
    assert_eq!(mailbox.posted_count(), 2);
    assert!(!tracker.is_marked(1));
    assert!(!tracker.is_marked(2));
}

#[tokio::test]
async fn outbound_template_wraps_the_marker_value() {
    let mut config = test_config();
    config.outbound.template = "Moderator reply:\n{Content}".to_string();

    let mailbox = Arc::new(MockMailbox::new().with_thread(thread("t1", "alice", "appeal", 3), vec![]));
    let tracker = Arc::new(MockTracker::new().with_ticket(42, "open"));
    let deps = make_deps(mailbox.clone(), tracker.clone(), config).await;

    deps.ledger.record_root("t1", 42).await.unwrap();
    tracker.queue_outbound(42, "see rule 4");

    outbound::run_delivery(&deps).await.expect("delivery");
    assert_eq!(
        mailbox.posted(),
        vec![("t1".to_string(), "Moderator reply:\nsee rule 4".to_string())]
    );
}

// ===========================================================================
// Duplicate suppression
// ===========================================================================

#[tokio::test]
async fn already_delivered_reply_is_not_posted_again() {
    // Crash-recovery shape: marker set at one entry, the rendered reply
    // already present as a comment later in the history.
    let mailbox = Arc::new(MockMailbox::new().with_thread(thread("t1", "alice", "appeal", 3), vec![]));
    let tracker = Arc::new(MockTracker::new().with_ticket(42, "open"));
    let deps = make_deps(mailbox.clone(), tracker.clone(), test_config()).await;

    deps.ledger.record_root("t1", 42).await.unwrap();
    tracker.push_history(42, filler("owner changed"));
    tracker.push_history(42, filler("mail logged"));
    tracker.queue_outbound(42, "you're unbanned");
    tracker.push_history(42, filler("priority changed"));
    tracker.add_comment(42, "you're unbanned").await.unwrap();

    let stats = outbound::run_delivery(&deps).await.expect("delivery");

    assert_eq!(stats.already_delivered, 1);
    assert_eq!(stats.replies_posted, 0);
    assert_eq!(stats.markers_cleared, 1);
    assert_eq!(mailbox.posted_count(), 0);
    assert!(!tracker.is_marked(42));
}

#[tokio::test]
async fn requeued_marker_is_delivered_even_with_old_receipt() {
    // The same text was delivered once before; queueing it again puts a
    // fresh marker-set entry after the old receipt, so it goes out again.
    let mailbox = Arc::new(MockMailbox::new().with_thread(thread("t1", "alice", "appeal", 3), vec![]));
    let tracker = Arc::new(MockTracker::new().with_ticket(42, "open"));
    let deps = make_deps(mailbox.clone(), tracker.clone(), test_config()).await;

    deps.ledger.record_root("t1", 42).await.unwrap();
    tracker.queue_outbound(42, "please stop");
    tracker.add_comment(42, "please stop").await.unwrap();
    tracker.clear_marker(42, "PendingReply").await.unwrap();
    tracker.queue_outbound(42, "please stop");

    let stats = outbound::run_delivery(&deps).await.expect("delivery");
    assert_eq!(stats.replies_posted, 1);
    assert_eq!(mailbox.posted_count(), 1);
}

// ===========================================================================
// Orphans and failures
// ===========================================================================

#[tokio::test]
async fn orphaned_marker_is_left_in_place() {
    // Marked ticket the ledger never created: no thread to deliver to.
    let mailbox = Arc::new(MockMailbox::new());
    let tracker = Arc::new(MockTracker::new().with_ticket(9, "open"));
    let deps = make_deps(mailbox.clone(), tracker.clone(), test_config()).await;

    tracker.queue_outbound(9, "reply to nowhere");

    let stats = outbound::run_delivery(&deps).await.expect("delivery");

    assert_eq!(stats.orphaned, 1);
    assert_eq!(stats.replies_posted, 0);
    assert_eq!(stats.markers_cleared, 0);
    assert_eq!(mailbox.posted_count(), 0);
    assert!(tracker.is_marked(9));
}

#[tokio::test]
async fn receipt_failure_still_posts_and_clears() {
    let mailbox = Arc::new(MockMailbox::new().with_thread(thread("t1", "alice", "appeal", 3), vec![]));
    let tracker = Arc::new(MockTracker::new().with_ticket(42, "open").failing_comments());
    let deps = make_deps(mailbox.clone(), tracker.clone(), test_config()).await;

    deps.ledger.record_root("t1", 42).await.unwrap();
    tracker.queue_outbound(42, "the reply");

    let stats = outbound::run_delivery(&deps).await.expect("delivery");
    assert_eq!(stats.replies_posted, 1);
    assert_eq!(stats.markers_cleared, 1);
    assert_eq!(mailbox.posted_count(), 1);
    assert!(!tracker.is_marked(42));
}

#[tokio::test]
async fn marker_clear_failure_is_fatal() {
    let mailbox = Arc::new(MockMailbox::new().with_thread(thread("t1", "alice", "appeal", 3), vec![]));
    let tracker = Arc::new(MockTracker::new().with_ticket(42, "open").failing_clears());
    let deps = make_deps(mailbox.clone(), tracker.clone(), test_config()).await;

    deps.ledger.record_root("t1", 42).await.unwrap();
    tracker.queue_outbound(42, "the reply");

    let err = outbound::run_delivery(&deps).await.unwrap_err();
    assert!(err.is_fatal());

    // The post happened before the clear failed. This is the accepted
    // at-most-one-duplicate window; the receipt makes the retry skip it.
    assert_eq!(mailbox.posted_count(), 1);
}
