use anyhow::Result;

/// Application configuration loaded from environment variables.
/// Contains only secrets and env-specific endpoints; scan behavior,
/// routing, and templates live in the TOML FileConfig.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Ledger database
    pub database_url: String,

    // Moderation mailbox
    pub mailbox_url: String,
    pub mailbox_token: String,

    // Ticket tracker
    pub tracker_url: String,
    pub tracker_user: String,
    pub tracker_password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")?,
            mailbox_url: std::env::var("MAILBOX_URL")?,
            mailbox_token: std::env::var("MAILBOX_TOKEN")?,
            tracker_url: std::env::var("TRACKER_URL")?,
            tracker_user: std::env::var("TRACKER_USER")?,
            tracker_password: std::env::var("TRACKER_PASSWORD")?,
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.len().min(5);
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  MAILBOX_URL: {}", self.mailbox_url);
        tracing::info!("  MAILBOX_TOKEN: {}", preview(&self.mailbox_token));
        tracing::info!("  TRACKER_URL: {}", self.tracker_url);
        tracing::info!("  TRACKER_USER: {}", self.tracker_user);
        tracing::info!("  TRACKER_PASSWORD: {}", preview(&self.tracker_password));
    }
}
