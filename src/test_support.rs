//! In-process [`LibraryService`] fake for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{ApiError, LibraryService, PendingResource, UserProfile};
use crate::catalog::{Resource, ResourceId};
use crate::upload::FileBlob;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Rejected,
    Offline,
}

#[derive(Debug, Default)]
struct State {
    resources: Vec<Resource>,
    profile: UserProfile,
    pending: Vec<PendingResource>,
    failures: HashMap<&'static str, Failure>,
    calls: HashMap<&'static str, usize>,
    holds: HashMap<&'static str, Arc<Notify>>,
    uploads: Vec<(String, String)>,
    tokens_seen: HashSet<String>,
}

/// Scriptable fake: canned data, per-operation failures, call counting, and
/// one-shot holds that park an operation until released.
#[derive(Debug, Default)]
pub(crate) struct FakeService {
    state: Mutex<State>,
}

impl FakeService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with_resources(self, resources: Vec<Resource>) -> Self {
        self.state().resources = resources;
        self
    }

    pub(crate) fn with_profile(self, role: i64, can_upload: bool) -> Self {
        self.set_profile(role, can_upload);
        self
    }

    pub(crate) fn with_pending(self, pending: Vec<PendingResource>) -> Self {
        self.state().pending = pending;
        self
    }

    pub(crate) fn failing(self, op: &'static str) -> Self {
        self.fail(op);
        self
    }

    pub(crate) fn set_profile(&self, role: i64, can_upload: bool) {
        self.state().profile = UserProfile { role, can_upload };
    }

    /// Makes `op` answer HTTP 500.
    pub(crate) fn fail(&self, op: &'static str) {
        self.state().failures.insert(op, Failure::Rejected);
    }

    /// Makes `op` fail at the transport level.
    pub(crate) fn go_offline(&self, op: &'static str) {
        self.state().failures.insert(op, Failure::Offline);
    }

    pub(crate) fn recover(&self, op: &'static str) {
        self.state().failures.remove(op);
    }

    /// Parks the next `op` call until the returned handle is notified.
    pub(crate) fn hold(&self, op: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state().holds.insert(op, notify.clone());
        notify
    }

    pub(crate) fn calls(&self, op: &'static str) -> usize {
        self.state().calls.get(op).copied().unwrap_or(0)
    }

    pub(crate) fn uploads(&self) -> Vec<(String, String)> {
        self.state().uploads.clone()
    }

    pub(crate) fn saw_token(&self, token: &str) -> bool {
        self.state().tokens_seen.contains(token)
    }

    async fn enter(&self, op: &'static str, token: Option<&str>) -> Result<(), ApiError> {
        let hold = {
            let mut state = self.state();
            *state.calls.entry(op).or_insert(0) += 1;
            if let Some(token) = token {
                state.tokens_seen.insert(token.to_string());
            }
            state.holds.remove(op)
        };
        if let Some(hold) = hold {
            hold.notified().await;
        }
        match self.state().failures.get(op).copied() {
            None => Ok(()),
            Some(Failure::Rejected) => Err(ApiError::http_status(op, 500, None)),
            Some(Failure::Offline) => Err(ApiError::Timeout {
                endpoint: op.to_string(),
            }),
        }
    }
}

#[async_trait]
impl LibraryService for FakeService {
    async fn list_resources(&self) -> Result<Vec<Resource>, ApiError> {
        self.enter("list_resources", None).await?;
        Ok(self.state().resources.clone())
    }

    async fn delete_resource(&self, token: &str, id: &ResourceId) -> Result<(), ApiError> {
        self.enter("delete_resource", Some(token)).await?;
        self.state().resources.retain(|resource| &resource.id != id);
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.enter("current_user", Some(token)).await?;
        Ok(self.state().profile.clone())
    }

    async fn request_permission(&self, token: &str) -> Result<(), ApiError> {
        self.enter("request_permission", Some(token)).await
    }

    async fn upload_resource(
        &self,
        token: &str,
        file: &FileBlob,
        title: &str,
    ) -> Result<(), ApiError> {
        self.enter("upload_resource", Some(token)).await?;
        self.state()
            .uploads
            .push((file.name.clone(), title.to_string()));
        Ok(())
    }

    async fn pending_resources(&self, token: &str) -> Result<Vec<PendingResource>, ApiError> {
        self.enter("pending_resources", Some(token)).await?;
        Ok(self.state().pending.clone())
    }
}

/// Two-entry catalog: `{1: "Zeta"}`, `{2: "Alpha"}`.
pub(crate) fn sample_resources() -> Vec<Resource> {
    vec![
        Resource::new("1", "Zeta", "https://cdn.example.com/zeta.pdf", "Physics"),
        Resource::new("2", "Alpha", "https://cdn.example.com/alpha.docx", "Math"),
    ]
}

pub(crate) fn pending(category: &str) -> PendingResource {
    PendingResource {
        title: None,
        category: category.to_string(),
    }
}
