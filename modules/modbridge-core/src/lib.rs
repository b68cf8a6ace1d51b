pub mod config;
pub mod file_config;
pub mod rules;
pub mod template;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use file_config::{load_config, FileConfig};
pub use rules::{route_queue, IgnoreList, RouteRule};
pub use traits::{ThreadSource, TicketTracker};
pub use types::*;
