use tracing::{debug, warn};

use crate::models::{TokenPair, User};

use super::store::{KeyValueStore, StoreResult};

/// Storage keys used by the session store
pub struct StorageKeys;

impl StorageKeys {
    pub const ACCESS_TOKEN: &'static str = "accessToken";
    pub const REFRESH_TOKEN: &'static str = "refreshToken";
    /// User record (JSON)
    pub const USER: &'static str = "user";

    pub const ALL: [&'static str; 3] = [Self::ACCESS_TOKEN, Self::REFRESH_TOKEN, Self::USER];
}

/// Session as read back from storage. Only the access token is guaranteed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

/// Persists the token pair and user record under three independent keys.
pub struct SessionStore {
    store: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write the session.
    ///
    /// The access token is written last: its presence is what `load` treats
    /// as a session, so a failure on an earlier write leaves nothing loadable.
    pub fn save(&self, tokens: &TokenPair, user: &User) -> StoreResult<()> {
        self.write(&tokens.access_token, Some(&tokens.refresh_token), user)
    }

    /// Write a session that may lack a refresh token. `None` removes any
    /// stored refresh token rather than writing an empty one.
    pub fn write(&self, access_token: &str, refresh_token: Option<&str>, user: &User) -> StoreResult<()> {
        let user_json = serde_json::to_string(user)?;
        match refresh_token {
            Some(refresh_token) => self.store.set(StorageKeys::REFRESH_TOKEN, refresh_token)?,
            None => self.store.remove(StorageKeys::REFRESH_TOKEN)?,
        }
        self.store.set(StorageKeys::USER, &user_json)?;
        self.store.set(StorageKeys::ACCESS_TOKEN, access_token)?;
        debug!(user_id = %user.id, "Session saved");
        Ok(())
    }

    /// Load the session, or `None` if no access token is stored
    pub fn load(&self) -> StoreResult<Option<StoredSession>> {
        let Some(access_token) = self.store.get(StorageKeys::ACCESS_TOKEN)? else {
            return Ok(None);
        };

        let refresh_token = self.store.get(StorageKeys::REFRESH_TOKEN).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read stored refresh token");
            None
        });

        let user = match self.store.get(StorageKeys::USER) {
            Ok(Some(json)) => match serde_json::from_str::<User>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Stored user record is not valid JSON");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user record");
                None
            }
        };

        Ok(Some(StoredSession {
            access_token,
            refresh_token,
            user,
        }))
    }

    /// Remove all session keys. Every key is attempted; the first failure is
    /// returned.
    pub fn clear(&self) -> StoreResult<()> {
        let mut first_error = None;
        for key in StorageKeys::ALL {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove session entry");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
