// Session state
//
// Holds the current bearer token in memory and mirrors it to durable
// storage. Two states only: authenticated (token set) or anonymous.

mod store;

pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore, TOKEN_KEY};

use std::sync::RwLock;
use tracing::{debug, info};

/// Current authentication state, shared by reference with the API client
pub struct Session {
    token: RwLock<Option<String>>,
    store: Box<dyn TokenStore>,
}

impl Session {
    /// Create an anonymous session backed by `store`
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            token: RwLock::new(None),
            store: Box::new(store),
        }
    }

    /// Create a session and adopt any token persisted by a previous run
    pub fn restore(store: impl TokenStore + 'static) -> Result<Self, StoreError> {
        let session = Self::new(store);
        if let Some(token) = session.load_persisted()? {
            info!("Restored persisted session");
            session.set_token(Some(token));
        }
        Ok(session)
    }

    /// Replace the in-memory token; `None` means anonymous
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Write the token to durable storage, or remove it when `None`
    pub fn persist(&self, token: Option<&str>) -> Result<(), StoreError> {
        self.store.save(token)
    }

    /// Read the durable token; callers adopt it with `set_token`
    pub fn load_persisted(&self) -> Result<Option<String>, StoreError> {
        self.store.load()
    }

    /// Enter the authenticated state and persist the token
    pub fn sign_in(&self, token: &str) -> Result<(), StoreError> {
        self.set_token(Some(token.to_string()));
        debug!("Session authenticated");
        self.persist(Some(token))
    }

    /// Enter the anonymous state and clear the persisted token
    ///
    /// The in-memory token is cleared even if the durable write fails.
    pub fn sign_out(&self) -> Result<(), StoreError> {
        self.set_token(None);
        debug!("Session cleared");
        self.persist(None)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
