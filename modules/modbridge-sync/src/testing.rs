// Test mocks for the bridge's two external seams.
//
// - MockMailbox (ThreadSource): in-memory feed of threads and replies
// - MockTracker (TicketTracker): stateful in-memory ticket store
//
// Both are thread-safe via interior Mutex so tests can keep a concrete
// Arc for assertions while the engine holds the same mock as a trait
// object. Every tracker call is recorded by name, which is what the
// "repeat cycle touches nothing" tests assert on.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use modbridge_core::{
    HistoryEntry, HistoryKind, MarkedTicket, Reply, ThreadRoot, ThreadSource, TicketTracker,
};

// ---------------------------------------------------------------------------
// MockMailbox
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MailboxInner {
    roots: Vec<ThreadRoot>,
    replies: HashMap<String, Vec<Reply>>,
    posted: Vec<(String, String)>,
    fail_lists: bool,
}

/// In-memory mailbox. The feed is served in exactly the order threads
/// were seeded (or last reordered), newest-first being the caller's
/// problem to arrange.
pub struct MockMailbox {
    inner: Mutex<MailboxInner>,
}

impl MockMailbox {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MailboxInner::default()),
        }
    }

    /// Seed a thread with its replies. Seeding order defines feed order.
    pub fn with_thread(self, root: ThreadRoot, replies: Vec<Reply>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.replies.insert(root.id.clone(), replies);
            inner.roots.push(root);
        }
        self
    }

    /// Make `list_roots` fail for every call.
    pub fn failing_lists(self) -> Self {
        self.inner.lock().unwrap().fail_lists = true;
        self
    }

    /// Add a thread at the back of the feed after construction. Lets a
    /// test introduce a thread the source serves behind already-seen
    /// ones, which is the ordering violation deep scans exist for.
    pub fn add_thread(&self, root: ThreadRoot, replies: Vec<Reply>) {
        let mut inner = self.inner.lock().unwrap();
        inner.replies.insert(root.id.clone(), replies);
        inner.roots.push(root);
    }

    /// Append a reply to an already-seeded thread.
    pub fn push_reply(&self, root_id: &str, reply: Reply) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .replies
            .get_mut(root_id)
            .unwrap_or_else(|| panic!("MockMailbox: no thread registered for {root_id}"))
            .push(reply);
    }

    /// Rearrange the feed into the given id order.
    pub fn reorder_feed(&self, ids: &[&str]) {
        let mut inner = self.inner.lock().unwrap();
        assert_eq!(ids.len(), inner.roots.len(), "reorder_feed must list every thread");
        let mut reordered = Vec::with_capacity(ids.len());
        for id in ids {
            let root = inner
                .roots
                .iter()
                .find(|r| r.id == *id)
                .unwrap_or_else(|| panic!("MockMailbox: no thread registered for {id}"))
                .clone();
            reordered.push(root);
        }
        inner.roots = reordered;
    }

    // --- Assertion helpers ---

    pub fn posted(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().posted.clone()
    }

    pub fn posted_count(&self) -> usize {
        self.inner.lock().unwrap().posted.len()
    }
}

#[async_trait]
impl ThreadSource for MockMailbox {
    async fn list_roots(&self, max: u32) -> Result<Vec<ThreadRoot>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_lists {
            bail!("MockMailbox: list_roots forced failure");
        }
        Ok(inner.roots.iter().take(max as usize).cloned().collect())
    }

    async fn replies(&self, root_id: &str) -> Result<Vec<Reply>> {
        let inner = self.inner.lock().unwrap();
        match inner.replies.get(root_id) {
            Some(replies) => Ok(replies.clone()),
            None => bail!("MockMailbox: no thread registered for {root_id}"),
        }
    }

    async fn post_reply(&self, root_id: &str, body: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.replies.contains_key(root_id) {
            bail!("MockMailbox: no thread registered for {root_id}");
        }
        inner.posted.push((root_id.to_string(), body.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockTracker
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct MockTicket {
    queue: i64,
    subject: String,
    body: String,
    status: String,
    history: Vec<HistoryEntry>,
}

struct TrackerInner {
    next_ticket_id: i64,
    tickets: HashMap<i64, MockTicket>,
    marked: Vec<MarkedTicket>,
    calls: Vec<String>,
    forced_create_ids: VecDeque<i64>,
    fail_clears: bool,
    fail_comments: bool,
}

/// Stateful in-memory ticket store. `create_ticket` allocates sequential
/// ids, comments and status changes land in a per-ticket history in the
/// shape the reverse sync reads back.
pub struct MockTracker {
    inner: Mutex<TrackerInner>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                next_ticket_id: 1,
                tickets: HashMap::new(),
                marked: Vec::new(),
                calls: Vec::new(),
                forced_create_ids: VecDeque::new(),
                fail_clears: false,
                fail_comments: false,
            }),
        }
    }

    /// Id the next created ticket gets.
    pub fn with_next_ticket_id(self, id: i64) -> Self {
        self.inner.lock().unwrap().next_ticket_id = id;
        self
    }

    /// Seed a ticket that exists without having been created through the
    /// seam.
    pub fn with_ticket(self, id: i64, status: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.tickets.insert(
                id,
                MockTicket {
                    queue: 1,
                    subject: String::new(),
                    body: String::new(),
                    status: status.to_string(),
                    history: vec![HistoryEntry {
                        kind: HistoryKind::Create,
                        description: "Ticket created".to_string(),
                        old_value: None,
                        new_value: None,
                        at: Utc::now(),
                    }],
                },
            );
        }
        self
    }

    /// Force the next `create_ticket` to report this id, bypassing
    /// allocation. An id below 1 simulates a misbehaving backend.
    pub fn on_create_return(self, id: i64) -> Self {
        self.inner.lock().unwrap().forced_create_ids.push_back(id);
        self
    }

    /// Make `clear_marker` fail for every call.
    pub fn failing_clears(self) -> Self {
        self.inner.lock().unwrap().fail_clears = true;
        self
    }

    /// Make `add_comment` fail for every call.
    pub fn failing_comments(self) -> Self {
        self.inner.lock().unwrap().fail_comments = true;
        self
    }

    /// Write a value into a ticket's marker field: records the marker-set
    /// transaction in the history and makes the ticket show up in
    /// `search_by_marker`.
    pub fn queue_outbound(&self, ticket_id: i64, value: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ticket) = inner.tickets.get_mut(&ticket_id) {
            ticket.history.push(HistoryEntry {
                kind: HistoryKind::SetMarker,
                description: "Marker set".to_string(),
                old_value: None,
                new_value: Some(value.to_string()),
                at: Utc::now(),
            });
        }
        inner.marked.push(MarkedTicket {
            ticket_id,
            marker_value: value.to_string(),
        });
    }

    /// Append a raw history entry (filler transactions for history-scan
    /// tests).
    pub fn push_history(&self, ticket_id: i64, entry: HistoryEntry) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .tickets
            .get_mut(&ticket_id)
            .unwrap_or_else(|| panic!("MockTracker: no ticket registered for {ticket_id}"))
            .history
            .push(entry);
    }

    // --- Assertion helpers ---

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn created_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == "create_ticket")
            .count()
    }

    pub fn status_of(&self, ticket_id: i64) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.tickets.get(&ticket_id).map(|t| t.status.clone())
    }

    pub fn subject_of(&self, ticket_id: i64) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.tickets.get(&ticket_id).map(|t| t.subject.clone())
    }

    pub fn body_of(&self, ticket_id: i64) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.tickets.get(&ticket_id).map(|t| t.body.clone())
    }

    pub fn queue_of(&self, ticket_id: i64) -> Option<i64> {
        let inner = self.inner.lock().unwrap();
        inner.tickets.get(&ticket_id).map(|t| t.queue)
    }

    /// Bodies of the comment transactions on a ticket, oldest first.
    pub fn comments_of(&self, ticket_id: i64) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .tickets
            .get(&ticket_id)
            .map(|t| {
                t.history
                    .iter()
                    .filter(|e| e.kind == HistoryKind::Comment)
                    .map(|e| e.description.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the ticket still carries a pending marker.
    pub fn is_marked(&self, ticket_id: i64) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.marked.iter().any(|m| m.ticket_id == ticket_id)
    }
}

#[async_trait]
impl TicketTracker for MockTracker {
    async fn create_ticket(&self, queue: i64, subject: &str, body: &str) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("create_ticket".to_string());

        if let Some(forced) = inner.forced_create_ids.pop_front() {
            return Ok(forced);
        }

        let id = inner.next_ticket_id;
        inner.next_ticket_id += 1;
        inner.tickets.insert(
            id,
            MockTicket {
                queue,
                subject: subject.to_string(),
                body: body.to_string(),
                status: "new".to_string(),
                history: vec![HistoryEntry {
                    kind: HistoryKind::Create,
                    description: "Ticket created".to_string(),
                    old_value: None,
                    new_value: None,
                    at: Utc::now(),
                }],
            },
        );
        Ok(id)
    }

    async fn add_comment(&self, ticket_id: i64, body: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("add_comment".to_string());
        if inner.fail_comments {
            bail!("MockTracker: add_comment forced failure");
        }
        match inner.tickets.get_mut(&ticket_id) {
            Some(ticket) => {
                ticket.history.push(HistoryEntry {
                    kind: HistoryKind::Comment,
                    description: body.to_string(),
                    old_value: None,
                    new_value: None,
                    at: Utc::now(),
                });
                Ok(())
            }
            None => bail!("MockTracker: no ticket registered for {ticket_id}"),
        }
    }

    async fn status(&self, ticket_id: i64) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("status".to_string());
        match inner.tickets.get(&ticket_id) {
            Some(ticket) => Ok(ticket.status.clone()),
            None => bail!("MockTracker: no ticket registered for {ticket_id}"),
        }
    }

    async fn set_status(&self, ticket_id: i64, status: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("set_status".to_string());
        match inner.tickets.get_mut(&ticket_id) {
            Some(ticket) => {
                ticket.history.push(HistoryEntry {
                    kind: HistoryKind::Status,
                    description: format!("Status changed to {status}"),
                    old_value: Some(ticket.status.clone()),
                    new_value: Some(status.to_string()),
                    at: Utc::now(),
                });
                ticket.status = status.to_string();
                Ok(())
            }
            None => bail!("MockTracker: no ticket registered for {ticket_id}"),
        }
    }

    async fn history(&self, ticket_id: i64) -> Result<Vec<HistoryEntry>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("history".to_string());
        match inner.tickets.get(&ticket_id) {
            Some(ticket) => Ok(ticket.history.clone()),
            None => bail!("MockTracker: no ticket registered for {ticket_id}"),
        }
    }

    async fn search_by_marker(&self, _field: &str) -> Result<Vec<MarkedTicket>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("search_by_marker".to_string());
        Ok(inner.marked.clone())
    }

    async fn clear_marker(&self, ticket_id: i64, _field: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("clear_marker".to_string());
        if inner.fail_clears {
            bail!("MockTracker: clear_marker forced failure");
        }
        inner.marked.retain(|m| m.ticket_id != ticket_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A thread root created `age_days` ago.
pub fn thread(id: &str, author: &str, subject: &str, age_days: i64) -> ThreadRoot {
    ThreadRoot {
        id: id.to_string(),
        author: author.to_string(),
        subject: subject.to_string(),
        body: format!("body of {id}"),
        created_at: Utc::now() - chrono::Duration::days(age_days),
    }
}

/// A reply posted `age_days` ago.
pub fn reply(id: &str, author: &str, body: &str, age_days: i64) -> Reply {
    Reply {
        id: id.to_string(),
        author: author.to_string(),
        body: body.to_string(),
        created_at: Utc::now() - chrono::Duration::days(age_days),
    }
}

// ---------------------------------------------------------------------------
// Mock self-tests
// ---------------------------------------------------------------------------
