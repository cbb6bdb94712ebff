use std::{env, fs};

use anyhow::{Context, bail};
use dotenvy::dotenv;
use tracing::{info, warn};

use crate::models::AcceptPolicy;
use crate::remote::{MobileAuthFile, SteamSession};
use crate::services::countdown::ConsoleCountdown;
use crate::services::scheduler::{BatchScheduler, IDLE_DELAY_S};
use crate::traits::AccountSession;

mod interval;
mod logger;
mod models;
mod remote;
mod services;
mod traits;

const USAGE: &str = "usage: confirmator <maFile> [--accept-trades] [--accept-market] \
                     [--accept-other] [idle-delay-seconds]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();

    let mut policy = AcceptPolicy::NONE;
    let mut idle_delay_secs = IDLE_DELAY_S;
    let mut auth_path: Option<String> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--accept-trades" => policy = policy | AcceptPolicy::TRADES,
            "--accept-market" => policy = policy | AcceptPolicy::MARKET,
            "--accept-other" => policy = policy | AcceptPolicy::OTHERS,
            other => {
                if let Ok(delay) = other.parse::<u64>() {
                    idle_delay_secs = delay;
                } else if auth_path.is_none() {
                    auth_path = Some(other.to_string());
                } else {
                    bail!("unrecognized argument '{other}'\n{USAGE}");
                }
            }
        }
    }

    let Some(auth_path) = auth_path else {
        bail!("no credential file given\n{USAGE}");
    };

    if policy.is_empty() {
        warn!("no accept flags given, defaulting to every confirmation type");
        policy = AcceptPolicy::ALL;
    }

    let contents = fs::read_to_string(&auth_path)
        .with_context(|| format!("reading credential file '{auth_path}'"))?;
    let auth: MobileAuthFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing credential file '{auth_path}'"))?;

    info!(
        "starting account '{}' (accepting: {})",
        auth.account_name, policy
    );

    let mut session = SteamSession::new(auth)?;
    info!("refreshing session");
    session
        .refresh_session()
        .await
        .context("initial session refresh failed")?;

    BatchScheduler::new(
        session,
        policy,
        idle_delay_secs,
        Box::new(ConsoleCountdown),
    )
    .run()
    .await
}
