use async_trait::async_trait;

use crate::models::Confirmation;
use crate::remote::SessionError;

/// Remote session seam the scheduler drives. The production implementor is
/// [`crate::remote::SteamSession`]; tests mock it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountSession: Send + Sync {
    /// Lists the confirmations currently awaiting approval, oldest first.
    async fn fetch_confirmations(&self) -> Result<Vec<Confirmation>, SessionError>;

    /// Mints a fresh access token from the stored refresh token.
    async fn refresh_session(&mut self) -> Result<(), SessionError>;

    /// Accepts the whole batch in one remote call. `Ok(false)` means the
    /// remote processed the request but reported failure.
    async fn accept_confirmations(
        &self,
        batch: &[Confirmation],
    ) -> Result<bool, SessionError>;

    /// Stable account identifier, for logging only.
    fn identity(&self) -> String;
}
