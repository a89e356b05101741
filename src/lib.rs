#[macro_use]
extern crate log;

pub mod config;
pub mod context;
pub mod error;
pub mod locale;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;

pub use crate::config::{Config, ConfigError};
pub use crate::context::{Gateway, Settings};
pub use crate::error::{error_pages, GatewayError};
pub use crate::session::{session_middleware, DiscordLink, SessionRecord, SESSION_COOKIE_NAME};
pub use crate::state::{RunMode, SessionState};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
