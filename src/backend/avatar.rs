use std::collections::HashMap;
use std::future::Future;
use tokio::sync::RwLock;

use crate::backend::twitch::{HelixClient, TwitchError};

/// Purple circle with a user silhouette, used when no avatar can be found
pub const DEFAULT_AVATAR: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMzIiIGhlaWdodD0iMzIiIHZpZXdCb3g9IjAgMCAzMiAzMiIgZmlsbD0ibm9uZSIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj4KPGNpcmNsZSBjeD0iMTYiIGN5PSIxNiIgcj0iMTYiIGZpbGw9IiM5MTQ2ZkYiLz4KPHN2ZyB4PSI4IiB5PSI4IiB3aWR0aD0iMTYiIGhlaWdodD0iMTYiIHZpZXdCb3g9IjAgMCAyNCAyNCIgZmlsbD0id2hpdGUiPgo8cGF0aCBkPSJNMTIgMTJjMi4yMSAwIDQtMS43OSA0LTRzLTEuNzktNC00LTQtNCAxLjc5LTQgNHMxLjc5IDQgNCA0em0wIDJjLTIuNjcgMC04IDEuMzQtOCA0djJoMTZ2LTJjMC0yLjY2LTUuMzMtNC04LTR6Ii8+Cjwvc3ZnPgo8L3N2Zz4K";

/// Where avatars are looked up
pub trait UserDirectory: Send + Sync {
    /// Profile image URL for a login, `Ok(None)` when the user doesn't exist
    fn avatar_url(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<Option<String>, TwitchError>> + Send;
}

impl UserDirectory for HelixClient {
    async fn avatar_url(&self, login: &str) -> Result<Option<String>, TwitchError> {
        if !self.has_credentials() {
            return Ok(None);
        }
        match self.get_user_by_login(login).await {
            Ok(user) if !user.profile_image_url.is_empty() => Ok(Some(user.profile_image_url)),
            Ok(_) | Err(TwitchError::UserNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Memoized username -> avatar lookup.
///
/// Entries are never refreshed, including the placeholder stored after a
/// failed lookup.
pub struct AvatarResolver<D> {
    directory: D,
    cache: RwLock<HashMap<String, String>>,
}

impl<D: UserDirectory> AvatarResolver<D> {
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, username: &str) -> String {
        if let Some(cached) = self.cache.read().await.get(username) {
            return cached.clone();
        }

        let avatar = match self.directory.avatar_url(username).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                log::debug!("No avatar for {}, using placeholder", username);
                DEFAULT_AVATAR.to_string()
            }
            Err(e) => {
                log::warn!("Error fetching avatar for {}: {}", username, e);
                DEFAULT_AVATAR.to_string()
            }
        };

        self.cache
            .write()
            .await
            .insert(username.to_string(), avatar.clone());
        avatar
    }

    /// Number of users seen so far
    pub async fn cached_users(&self) -> usize {
        self.cache.read().await.len()
    }
}
