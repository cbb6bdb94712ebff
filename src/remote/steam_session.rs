use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode, header::COOKIE};
use serde::Deserialize;
use sha1::Sha1;
use tracing::{debug, info};

use crate::models::Confirmation;
use crate::remote::{SessionError, api_base_url, community_base_url};
use crate::traits::AccountSession;

type HmacSha1 = Hmac<Sha1>;

/// SteamGuard credential file ("maFile") as exported by the mobile
/// authenticator. Only the fields the confirmation endpoints need.
#[derive(Debug, Deserialize)]
pub struct MobileAuthFile {
    pub account_name: String,
    pub device_id: String,
    pub identity_secret: String,
    #[serde(rename = "Session")]
    pub session: SessionData,
}

#[derive(Debug, Deserialize)]
pub struct SessionData {
    #[serde(rename = "SteamID")]
    pub steam_id: u64,
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "RefreshToken")]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct ConfirmationListResponse {
    success: bool,
    #[serde(default)]
    needauth: bool,
    #[serde(default)]
    conf: Vec<Confirmation>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AcceptResponse {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    response: TokenPayload,
}

#[derive(Debug, Default, Deserialize)]
struct TokenPayload {
    #[serde(default)]
    access_token: Option<String>,
}

/// Live session against the Steam community `mobileconf` endpoints.
pub struct SteamSession {
    client: Client,
    community_url: String,
    api_url: String,
    steam_id: u64,
    device_id: String,
    identity_secret: Vec<u8>,
    access_token: String,
    refresh_token: String,
}

impl SteamSession {
    pub fn new(auth: MobileAuthFile) -> anyhow::Result<Self> {
        let identity_secret = BASE64
            .decode(auth.identity_secret.as_bytes())
            .with_context(|| {
                format!(
                    "identity_secret for account '{}' is not valid base64",
                    auth.account_name
                )
            })?;

        let client = Client::builder()
            .user_agent("confirmator/0.1.0")
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            community_url: community_base_url(),
            api_url: api_base_url(),
            steam_id: auth.session.steam_id,
            device_id: auth.device_id,
            identity_secret,
            access_token: auth.session.access_token,
            refresh_token: auth.session.refresh_token,
        })
    }

    /// base64(HMAC-SHA1(identity_secret, be64(time) || tag)), the signature
    /// every mobileconf request carries.
    fn confirmation_key(&self, time: u64, tag: &str) -> String {
        let mut mac = HmacSha1::new_from_slice(&self.identity_secret)
            .expect("HMAC can take key of any size");
        mac.update(&time.to_be_bytes());
        mac.update(tag.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    fn confirmation_query(&self, tag: &str) -> Vec<(&'static str, String)> {
        let time = unix_time();
        vec![
            ("p", self.device_id.clone()),
            ("a", self.steam_id.to_string()),
            ("k", self.confirmation_key(time, tag)),
            ("t", time.to_string()),
            ("m", "react".to_string()),
            ("tag", tag.to_string()),
        ]
    }

    fn session_cookie(&self) -> String {
        format!(
            "steamLoginSecure={}%7C%7C{}",
            self.steam_id, self.access_token
        )
    }
}

#[async_trait]
impl AccountSession for SteamSession {
    async fn fetch_confirmations(&self) -> Result<Vec<Confirmation>, SessionError> {
        let url = format!("{}/mobileconf/getlist", self.community_url);
        let resp = self
            .client
            .get(&url)
            .query(&self.confirmation_query("conf"))
            .header(COOKIE, self.session_cookie())
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SessionError::AuthExpired);
            }
            status if !status.is_success() => {
                return Err(SessionError::Protocol(format!(
                    "getlist returned HTTP {status}"
                )));
            }
            _ => {}
        }

        let list = resp.json::<ConfirmationListResponse>().await?;
        if !list.success {
            if list.needauth {
                return Err(SessionError::AuthExpired);
            }
            return Err(SessionError::Protocol(format!(
                "getlist rejected: {}",
                list.message.unwrap_or_else(|| "no detail".to_string())
            )));
        }

        debug!("getlist returned {} confirmation(s)", list.conf.len());
        Ok(list.conf)
    }

    async fn refresh_session(&mut self) -> Result<(), SessionError> {
        let url = format!(
            "{}/IAuthenticationService/GenerateAccessTokenForApp/v1/",
            self.api_url
        );
        let form = [
            ("refresh_token", self.refresh_token.clone()),
            ("steamid", self.steam_id.to_string()),
        ];
        let resp = self.client.post(&url).form(&form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SessionError::RefreshFailed(format!(
                "token service returned HTTP {status}"
            )));
        }

        let token = resp.json::<TokenResponse>().await?;
        match token.response.access_token {
            Some(access_token) if !access_token.is_empty() => {
                self.access_token = access_token;
                info!("session refreshed for {}", self.steam_id);
                Ok(())
            }
            _ => Err(SessionError::RefreshFailed(
                "token service returned no access token".to_string(),
            )),
        }
    }

    async fn accept_confirmations(
        &self,
        batch: &[Confirmation],
    ) -> Result<bool, SessionError> {
        let url = format!("{}/mobileconf/multiajaxop", self.community_url);

        let mut form: Vec<(&'static str, String)> = self.confirmation_query("allow");
        form.push(("op", "allow".to_string()));
        for conf in batch {
            form.push(("cid[]", conf.id.clone()));
            form.push(("ck[]", conf.key.clone()));
        }

        let resp = self
            .client
            .post(&url)
            .header(COOKIE, self.session_cookie())
            .form(&form)
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SessionError::AuthExpired);
            }
            status if !status.is_success() => {
                return Err(SessionError::Protocol(format!(
                    "multiajaxop returned HTTP {status}"
                )));
            }
            _ => {}
        }

        let accept = resp.json::<AcceptResponse>().await?;
        Ok(accept.success)
    }

    fn identity(&self) -> String {
        self.steam_id.to_string()
    }
}

fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}
