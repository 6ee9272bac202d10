//! Upload gate state machine.
//!
//! Each async step records the epoch it started in and re-checks it before
//! applying the response. Closing the dialog or popup bumps the epoch, so a
//! response that arrives afterwards is logged and dropped.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use super::{FileBlob, PendingUploadDraft};
use crate::api::LibraryService;
use crate::catalog::CatalogStore;
use crate::failure::{FailureCategory, WorkflowError};
use crate::notify::NotificationChannel;
use crate::session::{TokenStore, read_token};

/// Route the view navigates to when an action needs a logged-in user.
pub const LOGIN_ROUTE: &str = "/login";

const UPLOAD_LOGIN: &str = "Please login to upload resources";
const CHECK_ERRORED: &str = "An error occurred while checking permissions";
const REQUEST_OK: &str = "Permission request sent successfully";
const REQUEST_REJECTED: &str = "Failed to send permission request";
const REQUEST_ERRORED: &str = "An error occurred while sending permission request";
const DRAFT_INCOMPLETE: &str = "Please select a file and enter a title";
const UPLOAD_OK: &str = "File uploaded successfully and pending for review";
const UPLOAD_REJECTED: &str = "File upload failed";
const UPLOAD_ERRORED: &str = "An error occurred during file upload";

/// Externally visible phase of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Idle,
    CheckingPermission,
    PermissionDenied,
    FormOpen,
    Submitting,
}

impl GatePhase {
    /// Returns a stable label for logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingPermission => "checking permission",
            Self::PermissionDenied => "permission denied",
            Self::FormOpen => "form open",
            Self::Submitting => "submitting",
        }
    }
}

impl fmt::Display for GatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of clicking the upload control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No token: the login notification was shown; navigate to [`LOGIN_ROUTE`].
    LoginRequired,
    /// A permission check or submit is in flight; the control is disabled.
    Busy,
    /// The upload dialog is already open; its draft is untouched.
    FormAlreadyOpen,
    /// Permission denied: the permission-request popup is open.
    PermissionPrompt,
    /// Permission granted: the upload dialog is open with an empty draft.
    FormOpened,
    /// The permission check failed; an error notification was shown.
    CheckFailed,
    /// The check completed after the user closed the flow; result dropped.
    Superseded,
}

impl ClickOutcome {
    /// Returns a stable label for logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginRequired => "login required",
            Self::Busy => "busy",
            Self::FormAlreadyOpen => "form already open",
            Self::PermissionPrompt => "permission prompt",
            Self::FormOpened => "form opened",
            Self::CheckFailed => "permission check failed",
            Self::Superseded => "superseded",
        }
    }
}

#[derive(Debug, Clone)]
enum GateState {
    Idle,
    CheckingPermission,
    PermissionDenied { requesting: bool },
    FormOpen(PendingUploadDraft),
    Submitting(PendingUploadDraft),
}

impl GateState {
    fn phase(&self) -> GatePhase {
        match self {
            Self::Idle => GatePhase::Idle,
            Self::CheckingPermission => GatePhase::CheckingPermission,
            Self::PermissionDenied { .. } => GatePhase::PermissionDenied,
            Self::FormOpen(_) => GatePhase::FormOpen,
            Self::Submitting(_) => GatePhase::Submitting,
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: GateState,
    epoch: u64,
}

impl Inner {
    fn transition(&mut self, next: GateState) -> u64 {
        debug!(from = %self.state.phase(), to = %next.phase(), "upload gate transition");
        self.state = next;
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    fn is_current(&self, epoch: u64, phase: GatePhase) -> bool {
        self.epoch == epoch && self.state.phase() == phase
    }
}

/// Orchestrates click → permission check → (request permission | form) → submit.
pub struct UploadGate {
    service: Arc<dyn LibraryService>,
    tokens: Arc<dyn TokenStore>,
    catalog: Arc<CatalogStore>,
    notifications: NotificationChannel,
    inner: Mutex<Inner>,
}

impl UploadGate {
    /// Creates a gate in [`GatePhase::Idle`].
    #[must_use]
    pub fn new(
        service: Arc<dyn LibraryService>,
        tokens: Arc<dyn TokenStore>,
        catalog: Arc<CatalogStore>,
        notifications: NotificationChannel,
    ) -> Self {
        Self {
            service,
            tokens,
            catalog,
            notifications,
            inner: Mutex::new(Inner {
                state: GateState::Idle,
                epoch: 0,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> GatePhase {
        self.inner().state.phase()
    }

    /// Copy of the draft while the form is open or submitting.
    #[must_use]
    pub fn draft(&self) -> Option<PendingUploadDraft> {
        match &self.inner().state {
            GateState::FormOpen(draft) | GateState::Submitting(draft) => Some(draft.clone()),
            _ => None,
        }
    }

    /// Returns true while the upload control should be disabled.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(
            self.inner().state,
            GateState::CheckingPermission
                | GateState::Submitting(_)
                | GateState::PermissionDenied { requesting: true }
        )
    }

    /// Handles a click on the upload control.
    ///
    /// Permission is always re-checked against the identity service; the
    /// session resolved at page load is not trusted for this decision.
    #[instrument(skip(self))]
    pub async fn click_upload(&self) -> ClickOutcome {
        match self.inner().state {
            GateState::CheckingPermission
            | GateState::Submitting(_)
            | GateState::PermissionDenied { requesting: true } => {
                debug!("upload click ignored while a request is in flight");
                return ClickOutcome::Busy;
            }
            GateState::FormOpen(_) => return ClickOutcome::FormAlreadyOpen,
            GateState::Idle | GateState::PermissionDenied { requesting: false } => {}
        }

        let Some(token) = read_token(self.tokens.as_ref()) else {
            self.inner().transition(GateState::Idle);
            self.notifications.error(UPLOAD_LOGIN);
            return ClickOutcome::LoginRequired;
        };

        let epoch = self.inner().transition(GateState::CheckingPermission);
        let result = self.service.current_user(&token).await;

        let mut inner = self.inner();
        if !inner.is_current(epoch, GatePhase::CheckingPermission) {
            debug!("permission check finished after the flow was closed; ignoring");
            return ClickOutcome::Superseded;
        }

        match result {
            Ok(profile) if profile.can_upload => {
                inner.transition(GateState::FormOpen(PendingUploadDraft::default()));
                ClickOutcome::FormOpened
            }
            Ok(_) => {
                inner.transition(GateState::PermissionDenied { requesting: false });
                ClickOutcome::PermissionPrompt
            }
            Err(err) => {
                inner.transition(GateState::Idle);
                drop(inner);
                warn!(error = %err, "Error fetching user data during permission check");
                self.notifications.error(CHECK_ERRORED);
                ClickOutcome::CheckFailed
            }
        }
    }

    /// Closes the upload dialog or permission popup, discarding any draft.
    ///
    /// Requests already sent are not aborted; their responses are dropped.
    /// Returns `true` when the gate was not already idle.
    pub fn cancel(&self) -> bool {
        let mut inner = self.inner();
        if matches!(inner.state, GateState::Idle) {
            return false;
        }
        inner.transition(GateState::Idle);
        true
    }

    /// Replaces the selected file.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidState`] unless the form is open.
    pub fn set_file(&self, file: FileBlob) -> Result<(), WorkflowError> {
        self.edit_draft(|draft| draft.file = Some(file))
    }

    /// Clears the selected file.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidState`] unless the form is open.
    pub fn clear_file(&self) -> Result<(), WorkflowError> {
        self.edit_draft(|draft| draft.file = None)
    }

    /// Replaces the entered title.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidState`] unless the form is open.
    pub fn set_title(&self, title: impl Into<String>) -> Result<(), WorkflowError> {
        let title = title.into();
        self.edit_draft(|draft| draft.title = title)
    }

    fn edit_draft(&self, edit: impl FnOnce(&mut PendingUploadDraft)) -> Result<(), WorkflowError> {
        let mut inner = self.inner();
        match &mut inner.state {
            GateState::FormOpen(draft) => {
                edit(draft);
                Ok(())
            }
            other => Err(WorkflowError::InvalidState {
                state: other.phase().as_str(),
            }),
        }
    }

    /// Sends the permission request from the popup.
    ///
    /// Success closes the popup; failure keeps it open for another try.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the popup is not open, no token is
    /// stored, the call fails, or the popup was closed mid-flight.
    #[instrument(skip(self))]
    pub async fn request_permission(&self) -> Result<(), WorkflowError> {
        let (token, epoch) = {
            let mut inner = self.inner();
            match &inner.state {
                GateState::PermissionDenied { requesting: false } => {}
                GateState::PermissionDenied { requesting: true } => {
                    return Err(WorkflowError::InvalidState {
                        state: "requesting permission",
                    });
                }
                other => {
                    return Err(WorkflowError::InvalidState {
                        state: other.phase().as_str(),
                    });
                }
            }
            let Some(token) = read_token(self.tokens.as_ref()) else {
                inner.transition(GateState::Idle);
                drop(inner);
                self.notifications.error(UPLOAD_LOGIN);
                return Err(WorkflowError::LoginRequired {
                    action: "request upload permission",
                });
            };
            // Same epoch: closing the popup is what invalidates the request.
            inner.state = GateState::PermissionDenied { requesting: true };
            (token, inner.epoch)
        };

        let result = self.service.request_permission(&token).await;

        let mut inner = self.inner();
        if !inner.is_current(epoch, GatePhase::PermissionDenied) {
            debug!("permission request finished after the popup was closed; ignoring");
            return Err(WorkflowError::Superseded);
        }

        match result {
            Ok(()) => {
                inner.transition(GateState::Idle);
                drop(inner);
                info!("upload permission requested");
                self.notifications.success(REQUEST_OK);
                Ok(())
            }
            Err(err) => {
                inner.state = GateState::PermissionDenied { requesting: false };
                drop(inner);
                let err = WorkflowError::from_api(err);
                warn!(
                    error = %err,
                    category = err.category().map_or("none", FailureCategory::label),
                    "Error sending permission request"
                );
                self.notifications.error(match err {
                    WorkflowError::Rejected { .. } => REQUEST_REJECTED,
                    _ => REQUEST_ERRORED,
                });
                Err(err)
            }
        }
    }

    /// Submits the open form.
    ///
    /// An incomplete draft is refused locally with no network call. On
    /// success the form closes, the draft is cleared and the catalog is
    /// reloaded. On failure the form stays open with the draft intact.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] for validation, auth, transport or server
    /// failures, or when the form was closed mid-flight.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<(), WorkflowError> {
        let draft = match &self.inner().state {
            GateState::FormOpen(draft) => draft.clone(),
            other => {
                return Err(WorkflowError::InvalidState {
                    state: other.phase().as_str(),
                });
            }
        };

        let (file, title) = match draft.ready() {
            Ok((file, title)) => (file.clone(), title.to_string()),
            Err(reason) => {
                self.notifications.error(DRAFT_INCOMPLETE);
                return Err(WorkflowError::Validation { reason });
            }
        };

        let Some(token) = read_token(self.tokens.as_ref()) else {
            self.notifications.error(UPLOAD_LOGIN);
            return Err(WorkflowError::LoginRequired {
                action: "upload resources",
            });
        };

        let epoch = self.inner().transition(GateState::Submitting(draft));
        let result = self.service.upload_resource(&token, &file, &title).await;

        {
            let mut inner = self.inner();
            if !inner.is_current(epoch, GatePhase::Submitting) {
                debug!("upload finished after the form was closed; ignoring");
                return Err(WorkflowError::Superseded);
            }
            match &result {
                Ok(()) => {
                    inner.transition(GateState::Idle);
                }
                Err(_) => {
                    let restored = match std::mem::replace(&mut inner.state, GateState::Idle) {
                        GateState::Submitting(draft) => draft,
                        _ => PendingUploadDraft::default(),
                    };
                    inner.transition(GateState::FormOpen(restored));
                }
            }
        }

        match result {
            Ok(()) => {
                info!(title = %title, "resource uploaded");
                self.notifications.success(UPLOAD_OK);
                // Load failures raise their own notification.
                let _ = self.catalog.load().await;
                Ok(())
            }
            Err(err) => {
                let err = WorkflowError::from_api(err);
                warn!(
                    error = %err,
                    category = err.category().map_or("none", FailureCategory::label),
                    "Error during file upload"
                );
                self.notifications.error(match err {
                    WorkflowError::Rejected { .. } => UPLOAD_REJECTED,
                    _ => UPLOAD_ERRORED,
                });
                Err(err)
            }
        }
    }
}

impl fmt::Debug for UploadGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadGate")
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
