use std::env;

use thiserror::Error;

pub mod steam_session;

pub use steam_session::{MobileAuthFile, SteamSession};

/// Failure taxonomy for remote session calls. Only `AuthExpired` is
/// recoverable inside the scheduler; everything else propagates.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token expired or invalid")]
    AuthExpired,
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected remote response: {0}")]
    Protocol(String),
    #[error("session refresh rejected: {0}")]
    RefreshFailed(String),
}

pub fn community_base_url() -> String {
    env::var("STEAM_COMMUNITY_URL")
        .unwrap_or_else(|_| "https://steamcommunity.com".to_string())
}

pub fn api_base_url() -> String {
    env::var("STEAM_API_URL").unwrap_or_else(|_| "https://api.steampowered.com".to_string())
}
