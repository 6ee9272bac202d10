//! Library Client Core
//!
//! Client-side core for a shared learning-resource library: users browse and
//! search shared files, contributors request upload permission and submit
//! new resources, administrators see the size of the moderation queue.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`api`] - Library service contract and its reqwest implementation
//! - [`session`] - Token storage and session (role/permission) resolution
//! - [`catalog`] - Cached resource list with search and title sort
//! - [`notify`] - Single overwritable status notification
//! - [`upload`] - Permission-gated upload workflow state machine
//! - [`moderation`] - Admin pending-queue badge
//! - [`screen`] - Page-load orchestration wiring the above together
//! - [`view`] - Passive text projection of screen state
//! - [`config`] - Client configuration loading
//! - [`failure`] - Workflow failure taxonomy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod catalog;
pub mod config;
pub mod failure;
pub mod moderation;
pub mod notify;
pub mod screen;
pub mod session;
#[cfg(test)]
pub(crate) mod test_support;
pub mod upload;
pub(crate) mod user_agent;
pub mod view;

// Re-export commonly used types
pub use api::{ApiError, HttpLibraryService, LibraryService, PendingResource, UserProfile};
pub use catalog::{
    CatalogStore, FileIcon, Resource, ResourceCatalog, ResourceId, SortDirection, compare_titles,
    icon_for_asset, icon_for_extension,
};
pub use config::{ClientConfig, ConfigOverrides, FileConfig, load_file_config, parse_config_str};
pub use failure::{FailureCategory, WorkflowError};
pub use moderation::{AdminBadge, count_pending};
pub use notify::{Notification, NotificationChannel, NotificationKind};
pub use screen::LibraryScreen;
pub use session::{
    FileTokenStore, MemoryTokenStore, Role, Session, SessionResolver, StorageError, TokenStore,
    default_token_path,
};
pub use upload::{ClickOutcome, FileBlob, GatePhase, LOGIN_ROUTE, PendingUploadDraft, UploadGate};
pub use view::{ResourceRow, ScreenSnapshot, render};
