//! HTTP implementation of the [`ChatClient`] capability.
//!
//! Talks the homeserver's client API directly: `whoami` with the caller's
//! own token, room state reads with the daemon's access token.

use super::{ChatClient, ClientError};
use async_trait::async_trait;
use roomlink_proto::{PowerLevels, RoomId};
use serde::Deserialize;
use std::time::Duration;

/// reqwest-backed homeserver client.
pub struct HttpChatClient {
    base_url: String,
    access_token: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct WhoamiResponse {
    user_id: String,
}

impl HttpChatClient {
    /// Create a client for the homeserver at `base_url`.
    ///
    /// `access_token` authenticates the daemon's own state reads; caller
    /// tokens are supplied per-request to [`ChatClient::whoami`].
    pub fn new(base_url: &str, access_token: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("roomlinkd/0.3")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            http,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::Lookup(e.into()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Lookup(e.into())),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(ClientError::Unauthorized)
            }
            reqwest::StatusCode::NOT_FOUND => Err(ClientError::NotFound(path.to_string())),
            status => Err(ClientError::Lookup(anyhow::anyhow!(
                "unexpected status {status} from {url}"
            ))),
        }
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn whoami(&self, token: &str) -> Result<String, ClientError> {
        let response: WhoamiResponse = self
            .get_json("/_matrix/client/v3/account/whoami", token)
            .await?;
        Ok(response.user_id)
    }

    async fn power_levels(&self, room: &RoomId) -> Result<PowerLevels, ClientError> {
        let path = format!(
            "/_matrix/client/v3/rooms/{}/state/m.room.power_levels/",
            encode_segment(room.as_str())
        );
        self.get_json(&path, &self.access_token).await
    }
}

/// Percent-encode a path segment. Room ids carry `!` and `:` which must not
/// be interpreted by the URL parser.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
