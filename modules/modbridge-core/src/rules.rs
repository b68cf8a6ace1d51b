use serde::Deserialize;

/// Threads from system accounts or with boilerplate subjects are never
/// bridged. Both lists match case-insensitively; subjects by prefix.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreList {
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub subject_prefixes: Vec<String>,
}

impl IgnoreList {
    pub fn matches(&self, author: &str, subject: &str) -> bool {
        let author = author.to_lowercase();
        let subject = subject.to_lowercase();
        self.authors.iter().any(|a| a.to_lowercase() == author)
            || self
                .subject_prefixes
                .iter()
                .any(|p| subject.starts_with(&p.to_lowercase()))
    }
}

/// One entry of the ordered author-to-queue routing table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteRule {
    pub author: String,
    pub queue: i64,
}

/// First rule whose author matches wins; the default queue otherwise.
/// The table is a small human-edited list, so a linear scan is fine.
pub fn route_queue(rules: &[RouteRule], default_queue: i64, author: &str) -> i64 {
    rules
        .iter()
        .find(|r| r.author.eq_ignore_ascii_case(author))
        .map(|r| r.queue)
        .unwrap_or(default_queue)
}
