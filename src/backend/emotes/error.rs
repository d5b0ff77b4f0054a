use thiserror::Error;

use crate::backend::twitch::TwitchError;

/// Why a provider load produced nothing
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Twitch(#[from] TwitchError),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
