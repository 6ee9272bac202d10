//! Session resolution: stored token → role and upload permission.
//!
//! A [`Session`] is a value produced by [`SessionResolver::resolve`] and
//! handed to the components that need it. Nothing caches it globally; callers
//! re-resolve when they need fresh data.

mod token_store;

pub use token_store::{
    FileTokenStore, MemoryTokenStore, StorageError, TokenStore, default_token_path, read_token,
};
pub(crate) use token_store::{resolve_config_dir, sanitize_env_path};

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::api::{LibraryService, UserProfile};

/// Privilege level of the current user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    /// No token, or the token could not be verified.
    #[default]
    Guest,
    /// Authenticated non-admin user.
    Member,
    /// Authenticated administrator.
    Admin,
}

impl Role {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved identity for one page load.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    role: Role,
    can_upload: bool,
}

impl Session {
    /// The least-privileged session: no token, no upload permission.
    #[must_use]
    pub fn guest() -> Self {
        Self::default()
    }

    /// Builds an authenticated session from an identity service answer.
    #[must_use]
    pub fn from_profile(token: impl Into<String>, profile: &UserProfile) -> Self {
        Self {
            token: Some(token.into()),
            role: if profile.is_admin() {
                Role::Admin
            } else {
                Role::Member
            },
            can_upload: profile.can_upload,
        }
    }

    /// Returns the bearer token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the resolved role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the upload permission seen at resolution time.
    #[must_use]
    pub fn can_upload(&self) -> bool {
        self.can_upload
    }

    /// Returns true for guest sessions.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.role == Role::Guest
    }

    /// Returns true for admin sessions.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token_present", &self.token.is_some())
            .field("role", &self.role)
            .field("can_upload", &self.can_upload)
            .finish()
    }
}

/// Turns a stored token into a [`Session`] via the identity service.
#[derive(Clone)]
pub struct SessionResolver {
    service: Arc<dyn LibraryService>,
}

impl SessionResolver {
    /// Creates a resolver backed by `service`.
    #[must_use]
    pub fn new(service: Arc<dyn LibraryService>) -> Self {
        Self { service }
    }

    /// Resolves `token` into a session.
    ///
    /// No token means guest without a network call. Any service failure also
    /// yields guest; the failure is logged, never surfaced as a notification.
    #[instrument(level = "debug", skip_all, fields(token_present = token.is_some()))]
    pub async fn resolve(&self, token: Option<&str>) -> Session {
        let Some(token) = token else {
            debug!("no stored token; resolving as guest");
            return Session::guest();
        };

        match self.service.current_user(token).await {
            Ok(profile) => {
                let session = Session::from_profile(token, &profile);
                debug!(role = %session.role(), can_upload = session.can_upload(), "session resolved");
                session
            }
            Err(error) => {
                warn!(error = %error, "Error fetching user data; degrading session to guest");
                Session::guest()
            }
        }
    }

    /// Reads the token from `store` and resolves it.
    pub async fn resolve_stored(&self, store: &dyn TokenStore) -> Session {
        let token = read_token(store);
        self.resolve(token.as_deref()).await
    }
}

impl fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionResolver").finish_non_exhaustive()
    }
}
