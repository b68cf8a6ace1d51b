use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

use crate::rules::{IgnoreList, RouteRule};
use crate::template;

/// TOML-backed configuration loaded from disk.
/// Secrets (tokens, DB URL) stay as env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub identity: IdentityConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub ignore: IgnoreList,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub transition: TransitionConfig,
    #[serde(default)]
    pub outbound: OutboundConfig,
    pub templates: TemplatesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Account the bridge itself posts under. Replies from this account
    /// never count as human activity.
    pub bot_account: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    #[serde(default = "default_max_roots")]
    pub max_roots: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Threads whose newest activity predates this are never looked at.
    /// RFC3339 string; the Unix epoch disables the guard.
    #[serde(default = "default_absolute_cutoff")]
    pub absolute_cutoff: DateTime<Utc>,
    #[serde(default = "default_deep_scan_interval_mins")]
    pub deep_scan_interval_mins: i64,
    #[serde(default = "default_deep_scan_lookback_days")]
    pub deep_scan_lookback_days: i64,
}

fn default_max_roots() -> u32 {
    200
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_absolute_cutoff() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}
fn default_deep_scan_interval_mins() -> i64 {
    30
}
fn default_deep_scan_lookback_days() -> i64 {
    30
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_roots: default_max_roots(),
            poll_interval_secs: default_poll_interval_secs(),
            absolute_cutoff: default_absolute_cutoff(),
            deep_scan_interval_mins: default_deep_scan_interval_mins(),
            deep_scan_lookback_days: default_deep_scan_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    #[serde(default = "default_queue")]
    pub default_queue: i64,
    #[serde(default)]
    pub rules: Vec<RouteRule>,
}

fn default_queue() -> i64 {
    1
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_queue: default_queue(),
            rules: Vec::new(),
        }
    }
}

/// Reopen-on-reply behavior. Disabled unless configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Statuses that trigger the transition, compared case-insensitively.
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default = "default_transition_target")]
    pub target: String,
}

fn default_transition_target() -> String {
    "open".to_string()
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            triggers: Vec::new(),
            target: default_transition_target(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutboundConfig {
    /// Ticket custom field that queues a reply for delivery.
    #[serde(default = "default_marker_field")]
    pub marker_field: String,
    /// Body posted back to the source; `{Content}` is the marker value.
    #[serde(default = "default_outbound_template")]
    pub template: String,
}

fn default_marker_field() -> String {
    "PendingReply".to_string()
}
fn default_outbound_template() -> String {
    "{Content}".to_string()
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            marker_field: default_marker_field(),
            template: default_outbound_template(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Public URL of a thread, `{Id}` substituted. Deployment-specific,
    /// so no default.
    pub thread_url: String,
    #[serde(default = "default_ticket_subject")]
    pub ticket_subject: String,
    #[serde(default = "default_ticket_body")]
    pub ticket_body: String,
    #[serde(default = "default_comment_body")]
    pub comment_body: String,
}

fn default_ticket_subject() -> String {
    "Modmail - {Author} - {Subject}".to_string()
}
fn default_ticket_body() -> String {
    "Post from {Author}\nResponse URL: {ModmailMessageUrl}\nContents:\n{Content}".to_string()
}
fn default_comment_body() -> String {
    "Post from {Author}\nContents:\n{Content}".to_string()
}

const MESSAGE_TOKENS: &[&str] = &["Author", "Subject", "ModmailMessageUrl", "Content"];

impl FileConfig {
    /// Reject bad templates at startup instead of mid-cycle.
    pub fn validate(&self) -> Result<()> {
        template::validate(&self.templates.thread_url, &["Id"])
            .context("templates.thread_url")?;
        template::validate(&self.templates.ticket_subject, MESSAGE_TOKENS)
            .context("templates.ticket_subject")?;
        template::validate(&self.templates.ticket_body, MESSAGE_TOKENS)
            .context("templates.ticket_body")?;
        template::validate(&self.templates.comment_body, MESSAGE_TOKENS)
            .context("templates.comment_body")?;
        template::validate(&self.outbound.template, &["Content"])
            .context("outbound.template")?;
        Ok(())
    }
}

/// Load, parse, and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}
