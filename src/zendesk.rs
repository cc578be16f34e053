//! Zendesk ticketing client.
//!
//! The plugin configures a Zendesk client at activation so that credentials
//! are validated up front; the labeling workflow does not open tickets yet.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::SocialSupportConfig;
use crate::error::TicketingError;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Zendesk REST client using basic authentication.
pub struct ZendeskClient {
    client: Client,
    instance_uri: String,
    user: String,
    password: String,
}

/// The authenticated Zendesk user.
#[derive(Debug, Clone, Deserialize)]
pub struct ZendeskUser {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
struct MeResponse {
    user: ZendeskUser,
}

impl ZendeskClient {
    /// Create a client for the given instance.
    ///
    /// `instance_uri` should be like `https://example.zendesk.com`; a trailing
    /// slash is ignored.
    pub fn new(
        instance_uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, TicketingError> {
        let instance_uri = instance_uri.into();
        let trimmed = instance_uri.trim().trim_end_matches('/').to_string();
        if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
            return Err(TicketingError::InvalidInstance(instance_uri));
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            instance_uri: trimmed,
            user: user.into(),
            password: password.into(),
        })
    }

    /// Create a client from validated plugin configuration.
    pub fn from_config(config: &SocialSupportConfig) -> Result<Self, TicketingError> {
        Self::new(
            config.zendesk_instance_uri.clone(),
            config.zendesk_user.clone(),
            config.zendesk_password.clone(),
        )
    }

    pub fn instance_uri(&self) -> &str {
        &self.instance_uri
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.instance_uri, path.trim_start_matches('/'))
    }

    fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.user, self.password);
        format!("Basic {}", STANDARD.encode(raw.as_bytes()))
    }

    /// Checks the credentials by fetching the authenticated user.
    pub async fn verify_credentials(&self) -> Result<ZendeskUser, TicketingError> {
        let url = self.endpoint("users/me.json");

        info!(url = %url, "verifying Zendesk credentials");
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.basic_auth())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TicketingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let me: MeResponse = resp.json().await?;
        info!(user = ?me.user.email, role = ?me.user.role, "Zendesk credentials accepted");
        Ok(me.user)
    }
}
