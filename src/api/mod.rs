//! Remote library service contract and its HTTP implementation.
//!
//! Components never talk to reqwest directly; they hold an
//! `Arc<dyn LibraryService>` so the workflow logic can be driven against a
//! mock server or an in-process fake.
//!
//! # Endpoints
//!
//! | Call | Method | Auth |
//! |---|---|---|
//! | `/resources` | GET | none |
//! | `/resources/{id}` | DELETE | bearer |
//! | `/user` | GET | bearer |
//! | `/request-permission` | POST | bearer |
//! | `/upload` | POST (multipart) | bearer |
//! | `/pending-resources` | GET | bearer |

mod client;
mod error;

pub use client::HttpLibraryService;
pub use error::ApiError;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::catalog::{Resource, ResourceId};
use crate::upload::FileBlob;

/// Role value the identity service uses for administrators.
pub const ADMIN_ROLE_CODE: i64 = 1;

/// Identity service answer for `GET /user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    /// Numeric role code; [`ADMIN_ROLE_CODE`] marks an administrator.
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: i64,
    /// Whether the user may submit new resources.
    #[serde(default, rename = "canUpload", deserialize_with = "null_as_default")]
    pub can_upload: bool,
}

impl UserProfile {
    /// Returns true when the role code marks an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE_CODE
    }
}

/// Decodes an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of the moderation queue (`GET /pending-resources`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PendingResource {
    /// Resource title, when the service sends it.
    #[serde(default)]
    pub title: Option<String>,
    /// Category label; `quiz` entries are not counted by the admin badge.
    #[serde(default)]
    pub category: String,
}

/// Contract the client core needs from the remote library service.
///
/// Uses `async_trait` so the screen can hold `Arc<dyn LibraryService>`.
#[async_trait]
pub trait LibraryService: Send + Sync {
    /// Fetches the full public resource list.
    async fn list_resources(&self) -> Result<Vec<Resource>, ApiError>;

    /// Deletes one resource.
    async fn delete_resource(&self, token: &str, id: &ResourceId) -> Result<(), ApiError>;

    /// Fetches role and upload permission for the token's user.
    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError>;

    /// Asks the service to grant upload permission.
    async fn request_permission(&self, token: &str) -> Result<(), ApiError>;

    /// Submits a new resource for moderation.
    async fn upload_resource(&self, token: &str, file: &FileBlob, title: &str)
    -> Result<(), ApiError>;

    /// Fetches the moderation queue.
    async fn pending_resources(&self, token: &str) -> Result<Vec<PendingResource>, ApiError>;
}
