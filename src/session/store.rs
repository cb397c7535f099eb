// Durable token storage
//
// The session token lives under a single fixed key in a small TOML
// key-value file. Other keys in the file are left alone.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info};

/// Key under which the bearer token is stored
pub const TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode session file: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Durable key-value storage for the auth token
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, if any
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Write the token, or remove the key when `None`
    fn save(&self, token: Option<&str>) -> Result<(), StoreError>;
}

/// File-backed store, private to the current user
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.spontime/session.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".spontime").join("session.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_table(&self) -> Result<toml::Table, StoreError> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        contents.parse::<toml::Table>().map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_table(&self, table: &toml::Table) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let contents = toml::to_string(table)?;

        // Owner-only from creation, and narrowed before any token is written
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .map_err(|e| self.io_error(e))?;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
            file.write_all(contents.as_bytes())
                .map_err(|e| self.io_error(e))?;
        }

        #[cfg(not(unix))]
        fs::write(&self.path, contents).map_err(|e| self.io_error(e))?;

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let table = self.read_table()?;
        let token = table
            .get(TOKEN_KEY)
            .and_then(|value| value.as_str())
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        debug!(path = %self.path.display(), found = token.is_some(), "Loaded session file");
        Ok(token)
    }

    fn save(&self, token: Option<&str>) -> Result<(), StoreError> {
        let mut table = self.read_table()?;

        match token {
            Some(token) => {
                table.insert(TOKEN_KEY.to_string(), toml::Value::String(token.to_string()));
            }
            None => {
                if table.remove(TOKEN_KEY).is_none() && !self.path.exists() {
                    return Ok(());
                }
            }
        }

        self.write_table(&table)?;
        info!(path = %self.path.display(), stored = token.is_some(), "Session file updated");
        Ok(())
    }
}

/// In-process store, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, token: Option<&str>) -> Result<(), StoreError> {
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = token.map(str::to_string);
        Ok(())
    }
}
