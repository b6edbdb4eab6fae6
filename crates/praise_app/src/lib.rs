//! Headless praise counter: configuration, console presenter and the
//! connection step that builds a worker session.
mod config;
mod presenter;
mod session;

pub use config::{AppConfig, SentinelConfig, TokenSource, DEFAULT_CONFIG_FILE};
pub use presenter::{format_line, ConsolePresenter};
pub use session::connect_session;
