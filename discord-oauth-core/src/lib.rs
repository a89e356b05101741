#[macro_use]
extern crate log;

mod client;
mod error;
mod models;

pub use crate::client::{generate_state, DiscordApi, DiscordOAuthClient, TokenTypeHint};
pub use crate::error::DiscordError;
pub use crate::models::{DiscordGuild, DiscordUser, TokenPair};

pub const DISCORD_API_URL: &str = "https://discord.com/api/v10";
pub const DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
