//! Durable storage for the opaque auth token.
//!
//! The token is written by an external login flow and read by every
//! authenticated call. The default file lives at
//! `~/.config/library-client/token` (or `$XDG_CONFIG_HOME/library-client/token`).

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

const TOKEN_FILE_NAME: &str = "token";
const APP_DIR_NAME: &str = "library-client";

/// Errors for token storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error("token storage I/O error at {path}: {source}")]
    Io {
        /// Token file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Refused to store an empty token.
    #[error("refusing to store an empty token")]
    EmptyToken,
}

/// Local storage slot for the auth token.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Returns the stored token, or `None` when absent or blank.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing store cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replaces the stored token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] for blank tokens or write failures.
    fn store(&self, token: &str) -> Result<(), StorageError>;

    /// Removes the token. Returns `true` when one was present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when removal fails.
    fn clear(&self) -> Result<bool, StorageError>;
}

/// Reads the token, treating storage failures as "no token".
///
/// Used on every authenticated action; a broken store must gate the action
/// the same way a logged-out user does.
#[must_use]
pub fn read_token(store: &dyn TokenStore) -> Option<String> {
    match store.load() {
        Ok(token) => token,
        Err(error) => {
            warn!(error = %error, "Token store unreadable; treating session as logged out");
            None
        }
    }
}

fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Token persisted to a single file with owner-only permissions.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store backed by `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(normalize_token(&raw)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(self.io_error(error)),
        }
    }

    fn store(&self, token: &str) -> Result<(), StorageError> {
        let token = normalize_token(token).ok_or(StorageError::EmptyToken)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;
        }
        fs::write(&self.path, token).map_err(|error| self.io_error(error))?;
        set_owner_only_permissions(&self.path).map_err(|error| self.io_error(error))?;
        Ok(())
    }

    fn clear(&self) -> Result<bool, StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(self.io_error(error)),
        }
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// In-process token slot, for tests and embedding hosts with their own storage.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `token`.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(normalize_token(token)),
        }
    }
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("MemoryTokenStore")
            .field("token_present", &present)
            .finish()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, token: &str) -> Result<(), StorageError> {
        let token = normalize_token(token).ok_or(StorageError::EmptyToken)?;
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    fn clear(&self) -> Result<bool, StorageError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some())
    }
}

/// Returns the default token path (`~/.config/library-client/token`).
///
/// # Errors
///
/// Returns [`StorageError::ConfigDirUnavailable`] if no usable config dir is found.
pub fn default_token_path() -> Result<PathBuf, StorageError> {
    Ok(resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )?
    .join(TOKEN_FILE_NAME))
}

pub(crate) fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

pub(crate) fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, StorageError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(StorageError::ConfigDirUnavailable)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_file_store_missing_file_is_absent() {
        let tempdir = TempDir::new().unwrap();
        let store = FileTokenStore::new(tempdir.path().join("token"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip_trims_whitespace() {
        let tempdir = TempDir::new().unwrap();
        let store = FileTokenStore::new(tempdir.path().join("nested").join("token"));
        store.store("  abc.def  \n").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_file_store_blank_file_is_absent() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("token");
        fs::write(&path, "   \n").unwrap();
        let store = FileTokenStore::new(path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_empty_token() {
        let tempdir = TempDir::new().unwrap();
        let store = FileTokenStore::new(tempdir.path().join("token"));
        assert!(matches!(store.store(" "), Err(StorageError::EmptyToken)));
    }

    #[test]
    fn test_file_store_clear_reports_presence() {
        let tempdir = TempDir::new().unwrap();
        let store = FileTokenStore::new(tempdir.path().join("token"));
        assert!(!store.clear().unwrap());
        store.store("tok").unwrap();
        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tempdir = TempDir::new().unwrap();
        let store = FileTokenStore::new(tempdir.path().join("token"));
        store.store("tok").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_memory_store_round_trip_and_clear() {
        let store = MemoryTokenStore::new();
        assert!(store.load().unwrap().is_none());
        store.store("tok").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok"));
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_memory_store_debug_hides_token() {
        let store = MemoryTokenStore::with_token("secret-value");
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("token_present: true"));
    }

    #[test]
    fn test_read_token_returns_stored_value() {
        let store = MemoryTokenStore::with_token("tok");
        assert_eq!(read_token(&store).as_deref(), Some("tok"));
    }

    #[test]
    fn test_resolve_config_dir_prefers_xdg_over_home() {
        let resolved = resolve_config_dir(
            Some(PathBuf::from("/tmp/xdg")),
            Some(PathBuf::from("/tmp/home")),
            None,
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/xdg/library-client"));
    }

    #[test]
    fn test_resolve_config_dir_falls_back_to_home() {
        let resolved = resolve_config_dir(None, Some(PathBuf::from("/tmp/home")), None).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/home/.config/library-client"));
    }

    #[test]
    fn test_resolve_config_dir_errors_when_all_sources_missing() {
        let result = resolve_config_dir(None, None, None);
        assert!(matches!(result, Err(StorageError::ConfigDirUnavailable)));
    }

    #[test]
    fn test_sanitize_env_path_rejects_blank_values() {
        assert!(sanitize_env_path(Some(OsString::from(""))).is_none());
        assert!(sanitize_env_path(Some(OsString::from("   "))).is_none());
    }
}
