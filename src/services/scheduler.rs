use anyhow::Context;
use tracing::{debug, info, warn};

use crate::interval::format_interval;
use crate::models::{AcceptPolicy, Confirmation, ConfirmationType};
use crate::remote::SessionError;
use crate::services::countdown::Countdown;
use crate::traits::AccountSession;

/// Most confirmations submitted in one accept call; the rest is deferred.
pub const ACCEPT_CHUNK_MAX: usize = 10;
/// Shortened wait used after an expired token, a reported accept failure,
/// or when deferred confirmations are queued.
pub const ACCEPT_RETRY_DELAY_S: u64 = 15;
/// Default wait between polling cycles when nothing is outstanding.
pub const IDLE_DELAY_S: u64 = 60;

/// Per-loop state. One value per scheduler invocation, never shared, so any
/// number of account loops can run side by side.
#[derive(Debug, Default)]
pub struct ScheduleState {
    next_delay_secs: u64,
    pending: Vec<Confirmation>,
    fetches: u64,
    accepts: u64,
    errors: u64,
}

/// The polling loop: wait, fetch (or drain the deferred queue), filter by
/// policy, accept up to [`ACCEPT_CHUNK_MAX`] in one remote call, decide the
/// next wait from the outcome.
pub struct BatchScheduler<S> {
    session: S,
    policy: AcceptPolicy,
    idle_delay_secs: u64,
    countdown: Box<dyn Countdown>,
}

impl<S: AccountSession> BatchScheduler<S> {
    pub fn new(
        session: S,
        policy: AcceptPolicy,
        idle_delay_secs: u64,
        countdown: Box<dyn Countdown>,
    ) -> Self {
        Self {
            session,
            policy,
            idle_delay_secs,
            countdown,
        }
    }

    /// Runs forever. Returns only by propagating a fatal error: an
    /// unclassified fetch/accept failure or a failed session refresh.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(
            "watching confirmations for account {} (accepting: {})",
            self.session.identity(),
            self.policy
        );
        let mut state = ScheduleState::default();
        loop {
            self.run_cycle(&mut state).await?;
        }
    }

    fn retry_delay(&self) -> u64 {
        ACCEPT_RETRY_DELAY_S.min(self.idle_delay_secs)
    }

    async fn run_cycle(&mut self, state: &mut ScheduleState) -> anyhow::Result<()> {
        if state.next_delay_secs > 0 {
            debug!("waiting {}", format_interval(state.next_delay_secs));
            self.countdown.wait(state.next_delay_secs).await;
        }
        state.next_delay_secs = self.idle_delay_secs;

        let working_set = if state.pending.is_empty() {
            state.fetches += 1;
            match self.session.fetch_confirmations().await {
                Ok(confs) if confs.is_empty() => {
                    info!("nothing to confirm");
                    return Ok(());
                }
                Ok(confs) => {
                    info!("got {} confirmation(s)", confs.len());
                    confs
                }
                Err(SessionError::AuthExpired) => {
                    state.errors += 1;
                    warn!("fetch failed: {}", SessionError::AuthExpired);
                    info!("refreshing session");
                    self.session
                        .refresh_session()
                        .await
                        .context("session refresh failed")?;
                    state.next_delay_secs = self.retry_delay();
                    return Ok(());
                }
                Err(err) => {
                    state.errors += 1;
                    return Err(err).context("fetching confirmations");
                }
            }
        } else {
            info!(
                "retrying {} deferred confirmation(s)",
                state.pending.len()
            );
            std::mem::take(&mut state.pending)
        };

        let total = working_set.len();
        let mut batch: Vec<Confirmation> = Vec::new();
        for conf in working_set {
            if batch.len() >= ACCEPT_CHUNK_MAX {
                // re-classified next cycle; classification is pure so the
                // outcome cannot change
                state.pending.push(conf);
            } else if self.policy.accepts(conf.kind) {
                if conf.kind == ConfirmationType::Trade {
                    info!("  {}: {} offer {}", conf.id, conf.description, conf.creator);
                } else {
                    info!("  {}: {}", conf.id, conf.description);
                }
                batch.push(conf);
            }
        }

        if batch.is_empty() {
            info!("nothing to confirm");
            return Ok(());
        }

        info!("accepting {} out of {} confirmation(s)", batch.len(), total);
        state.accepts += 1;
        match self.session.accept_confirmations(&batch).await {
            Ok(true) => info!("accepted {} confirmation(s)", batch.len()),
            Ok(false) => {
                state.errors += 1;
                warn!("remote reported failure for the accept call");
                state.next_delay_secs = self.retry_delay();
            }
            Err(SessionError::AuthExpired) => {
                state.errors += 1;
                warn!("accept failed: {}", SessionError::AuthExpired);
                info!("refreshing session");
                self.session
                    .refresh_session()
                    .await
                    .context("session refresh failed")?;
                // the unsent batch goes back in front of any overflow so
                // fetch order is preserved
                let overflow = std::mem::take(&mut state.pending);
                state.pending = batch;
                state.pending.extend(overflow);
                state.next_delay_secs = self.retry_delay();
                return Ok(());
            }
            Err(err) => {
                state.errors += 1;
                return Err(err).context("accepting confirmations");
            }
        }

        if !state.pending.is_empty() {
            debug!(
                "{} confirmation(s) deferred to the next cycle",
                state.pending.len()
            );
            state.next_delay_secs = self.retry_delay();
        }
        debug!(
            fetches = state.fetches,
            accepts = state.accepts,
            errors = state.errors,
            "cycle complete"
        );
        Ok(())
    }
}
