use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::emotes::{DEFAULT_BTTV_URL, DEFAULT_FFZ_URL, DEFAULT_SEVENTV_URL};
use crate::backend::render::{ColorMode, RenderOptions};
use crate::backend::twitch::{
    normalize_channel, ChatConfig, IrcCredentials, DEFAULT_HELIX_URL, DEFAULT_IRC_URL, HTTP_TIMEOUT,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub twitch: TwitchSettings,
    #[serde(default)]
    pub overlay: OverlaySettings,
    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TwitchSettings {
    pub channel: String,
    /// Helix credentials; without them channel-id lookups, native Twitch
    /// emotes and avatars are unavailable
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub access_token: String,
    /// Chat login; anonymous when unset
    #[serde(default)]
    pub nick: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct OverlaySettings {
    pub port: u16,
    pub max_messages: usize,
    pub eviction_grace_ms: u64,
    pub animation_interval: u64,
    pub color_mode: ColorMode,
    pub time_format: String,
    /// Served at `/`, relative to the project root
    pub assets_dir: String,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            port: 3000,
            max_messages: 10,
            eviction_grace_ms: 500,
            animation_interval: 5,
            color_mode: ColorMode::Random,
            time_format: "%H:%M".to_string(),
            assets_dir: "assets/overlay".to_string(),
        }
    }
}

impl OverlaySettings {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.eviction_grace_ms)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            color_mode: self.color_mode,
            time_format: self.time_format.clone(),
            animation_interval: self.animation_interval,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Endpoints {
    pub helix: String,
    pub bttv: String,
    pub ffz: String,
    pub seventv: String,
    pub irc: String,
    /// Per-request limit for Helix lookups
    pub helix_timeout_secs: u64,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            helix: DEFAULT_HELIX_URL.to_string(),
            bttv: DEFAULT_BTTV_URL.to_string(),
            ffz: DEFAULT_FFZ_URL.to_string(),
            seventv: DEFAULT_SEVENTV_URL.to_string(),
            irc: DEFAULT_IRC_URL.to_string(),
            helix_timeout_secs: HTTP_TIMEOUT.as_secs(),
        }
    }
}

impl Endpoints {
    pub fn helix_timeout(&self) -> Duration {
        Duration::from_secs(self.helix_timeout_secs)
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if normalize_channel(&self.twitch.channel).is_empty() {
            return Err(ConfigError::Invalid("twitch.channel must not be empty".to_string()));
        }
        if self.overlay.max_messages == 0 {
            return Err(ConfigError::Invalid("overlay.max_messages must be at least 1".to_string()));
        }
        if self.endpoints.helix_timeout_secs == 0 {
            return Err(ConfigError::Invalid("endpoints.helix_timeout_secs must be at least 1".to_string()));
        }
        if StrftimeItems::new(&self.overlay.time_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Invalid(format!(
                "overlay.time_format is not a valid format: {}",
                self.overlay.time_format
            )));
        }
        Ok(())
    }

    /// Channel login without `#`, lower-cased
    pub fn channel(&self) -> String {
        normalize_channel(&self.twitch.channel)
    }

    pub fn chat_config(&self) -> ChatConfig {
        let credentials = match (&self.twitch.nick, self.twitch.access_token.is_empty()) {
            (Some(nick), false) => Some(IrcCredentials {
                nick: nick.to_lowercase(),
                token: Some(self.twitch.access_token.clone()),
            }),
            _ => None,
        };
        ChatConfig {
            channel_name: self.channel(),
            irc_url: self.endpoints.irc.clone(),
            credentials,
        }
    }
}

/// Load and validate `config.toml` from the project root
pub fn load_config() -> Result<AppConfig> {
    let project_root = project_root::get_project_root().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    AppConfig::from_file(project_root.join("config.toml"))
}
