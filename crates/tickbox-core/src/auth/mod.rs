//! Authentication module for managing user sessions.
//!
//! This module provides:
//! - `AuthManager`: login/logout orchestration and the observable `AuthState`
//! - `SessionStore`: persistence of the token pair and user record
//! - `KeyValueStore` backends: file, OS keychain (via keyring), and memory
//! - `decode_user`/`decode_claims`: access token payload decoding
//!
//! Sessions are restored on startup by `AuthManager::initialize`, without a
//! network call.

pub mod manager;
pub mod session;
pub mod state;
pub mod store;
pub mod token;

pub use manager::{AuthManager, LoginError};
pub use session::{SessionStore, StorageKeys, StoredSession};
pub use state::{AuthState, AuthStatus};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError, StoreResult};
pub use token::{decode_claims, decode_user, AccessClaims, DecodeError};
