//! Permission-gated contribution workflow.
//!
//! ```text
//! Idle ──click──▶ CheckingPermission ──canUpload=false──▶ PermissionDenied ──request ok──▶ Idle
//!                        │
//!                        └──canUpload=true──▶ FormOpen ──submit──▶ Submitting ──ok──▶ Idle
//!                                                ▲                      │
//!                                                └────────failure───────┘
//! ```
//!
//! See [`UploadGate`] for the transitions and their guards.

mod draft;
mod gate;

pub use draft::{FileBlob, PendingUploadDraft};
pub use gate::{ClickOutcome, GatePhase, LOGIN_ROUTE, UploadGate};
