use serde::Deserialize;
use std::time::Duration;

use super::error::{Result, TwitchError};

pub const DEFAULT_HELIX_URL: &str = "https://api.twitch.tv/helix";

/// Upper bound on one HTTP request, connect through body
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// User info response
#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    pub data: Vec<UserData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// Emote listing response (global and per-channel share a shape)
#[derive(Debug, Clone, Deserialize)]
pub struct EmotesResponse {
    pub data: Vec<HelixEmote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelixEmote {
    pub id: String,
    pub name: String,
}

/// Minimal Helix client: identity lookups and emote listings
#[derive(Debug, Clone)]
pub struct HelixClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    access_token: String,
    timeout: Duration,
}

impl HelixClient {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            access_token: access_token.into(),
            timeout: HTTP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether credentials were configured at all
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.access_token.is_empty()
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path_and_query);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Client-Id", &self.client_id)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TwitchError::HttpError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Get user information by login name
    pub async fn get_user_by_login(&self, login: &str) -> Result<UserData> {
        let login = login.trim_start_matches('#');
        let users: UsersResponse = self
            .get(&format!("/users?login={}", urlencoding::encode(login)))
            .await?;
        users
            .data
            .into_iter()
            .next()
            .ok_or_else(|| TwitchError::UserNotFound(login.to_string()))
    }

    /// Global emotes available in every channel
    pub async fn get_global_emotes(&self) -> Result<Vec<HelixEmote>> {
        let emotes: EmotesResponse = self.get("/chat/emotes/global").await?;
        Ok(emotes.data)
    }

    /// Emotes owned by a broadcaster
    pub async fn get_channel_emotes(&self, broadcaster_id: &str) -> Result<Vec<HelixEmote>> {
        let emotes: EmotesResponse = self
            .get(&format!(
                "/chat/emotes?broadcaster_id={}",
                urlencoding::encode(broadcaster_id)
            ))
            .await?;
        Ok(emotes.data)
    }
}
