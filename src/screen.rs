//! Resources screen: wires session, catalog, upload gate and admin badge.
//!
//! One [`LibraryScreen`] corresponds to one page load. The session is
//! resolved in [`load_page`](LibraryScreen::load_page) and passed on to the
//! admin badge; the upload gate never trusts it and re-checks on click.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::api::LibraryService;
use crate::catalog::{CatalogStore, ResourceId};
use crate::failure::WorkflowError;
use crate::moderation::AdminBadge;
use crate::notify::NotificationChannel;
use crate::session::{Session, SessionResolver, StorageError, TokenStore, read_token};
use crate::upload::UploadGate;

/// State holder for the resources screen.
pub struct LibraryScreen {
    service: Arc<dyn LibraryService>,
    tokens: Arc<dyn TokenStore>,
    notifications: NotificationChannel,
    resolver: SessionResolver,
    session: Session,
    catalog: Arc<CatalogStore>,
    gate: UploadGate,
    badge: Option<AdminBadge>,
}

impl LibraryScreen {
    /// Creates a screen with a guest session and an empty catalog.
    #[must_use]
    pub fn new(service: Arc<dyn LibraryService>, tokens: Arc<dyn TokenStore>) -> Self {
        let notifications = NotificationChannel::new();
        let catalog = Arc::new(CatalogStore::new(service.clone(), notifications.clone()));
        let gate = UploadGate::new(
            service.clone(),
            tokens.clone(),
            catalog.clone(),
            notifications.clone(),
        );
        Self {
            resolver: SessionResolver::new(service.clone()),
            service,
            tokens,
            notifications,
            session: Session::guest(),
            catalog,
            gate,
            badge: None,
        }
    }

    /// Page load: session resolution and catalog fetch run side by side,
    /// then the admin badge is built and fetched for admin sessions.
    #[instrument(skip(self))]
    pub async fn load_page(&mut self) {
        let (session, catalog_result) = tokio::join!(
            self.resolver.resolve_stored(self.tokens.as_ref()),
            self.catalog.load()
        );
        if let Ok(count) = catalog_result {
            debug!(count, "catalog ready");
        }
        self.apply_session(session).await;
        info!(role = %self.session.role(), "page loaded");
    }

    /// Re-resolves the session from the stored token.
    pub async fn refresh_session(&mut self) -> &Session {
        let session = self.resolver.resolve_stored(self.tokens.as_ref()).await;
        self.apply_session(session).await;
        &self.session
    }

    async fn apply_session(&mut self, session: Session) {
        self.badge = AdminBadge::for_session(self.service.clone(), &session);
        self.session = session;
        if let Some(badge) = self.badge.as_mut() {
            badge.refresh().await;
        }
    }

    /// Stores an externally issued token and re-resolves the session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the token cannot be persisted.
    pub async fn login(&mut self, token: &str) -> Result<&Session, StorageError> {
        self.tokens.store(token)?;
        Ok(self.refresh_session().await)
    }

    /// Removes the stored token and resets to a guest session immediately.
    ///
    /// The in-memory reset happens even if the token file cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the token store could not be cleared.
    pub fn logout(&mut self) -> Result<bool, StorageError> {
        self.session = Session::guest();
        self.badge = None;
        self.gate.cancel();
        let cleared = self.tokens.clear();
        if let Err(error) = &cleared {
            warn!(error = %error, "Failed to clear stored token on logout");
        }
        cleared
    }

    /// Deletes a resource with the currently stored token.
    ///
    /// # Errors
    ///
    /// See [`CatalogStore::remove`].
    pub async fn delete(&self, id: &ResourceId) -> Result<(), WorkflowError> {
        let token = read_token(self.tokens.as_ref());
        self.catalog.remove(token.as_deref(), id).await
    }

    /// Session resolved at the last page load or refresh.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns true when a token was present and verified at resolution.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        !self.session.is_guest()
    }

    /// Catalog store.
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Upload gate.
    #[must_use]
    pub fn gate(&self) -> &UploadGate {
        &self.gate
    }

    /// Notification singleton.
    #[must_use]
    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    /// Pending moderation count; zero when the session is not admin.
    #[must_use]
    pub fn admin_request_count(&self) -> usize {
        self.badge.as_ref().map_or(0, AdminBadge::count)
    }
}

impl fmt::Debug for LibraryScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryScreen")
            .field("session", &self.session)
            .field("gate", &self.gate)
            .field("badge", &self.badge)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{MemoryTokenStore, Role};
    use crate::test_support::{FakeService, pending, sample_resources};
    use crate::upload::{ClickOutcome, GatePhase};

    fn screen(service: &Arc<FakeService>, token: Option<&str>) -> LibraryScreen {
        let tokens: Arc<dyn TokenStore> =
            Arc::new(token.map_or_else(MemoryTokenStore::new, MemoryTokenStore::with_token));
        LibraryScreen::new(service.clone(), tokens)
    }

    #[tokio::test]
    async fn test_guest_page_load_skips_identity_and_badge() {
        let service = Arc::new(FakeService::new().with_resources(sample_resources()));
        let mut screen = screen(&service, None);

        screen.load_page().await;

        assert!(!screen.is_logged_in());
        assert_eq!(screen.catalog().snapshot().len(), 2);
        assert_eq!(service.calls("current_user"), 0);
        assert_eq!(service.calls("pending_resources"), 0);
        assert_eq!(screen.admin_request_count(), 0);
    }

    #[tokio::test]
    async fn test_admin_page_load_counts_pending_queue() {
        let service = Arc::new(
            FakeService::new()
                .with_profile(1, true)
                .with_pending(vec![pending("Math"), pending("Quiz"), pending("quiz")]),
        );
        let mut screen = screen(&service, Some("admin"));

        screen.load_page().await;

        assert_eq!(screen.session().role(), Role::Admin);
        assert_eq!(screen.admin_request_count(), 1);
        assert!(service.saw_token("admin"));
    }

    #[tokio::test]
    async fn test_member_page_load_never_fetches_pending_queue() {
        let service = Arc::new(FakeService::new().with_profile(0, true));
        let mut screen = screen(&service, Some("member"));

        screen.load_page().await;

        assert_eq!(screen.session().role(), Role::Member);
        assert_eq!(service.calls("pending_resources"), 0);
    }

    #[tokio::test]
    async fn test_logout_resets_session_synchronously() {
        let service = Arc::new(FakeService::new().with_profile(1, true).with_pending(vec![pending("Math")]));
        let mut screen = screen(&service, Some("admin"));
        screen.load_page().await;
        assert_eq!(screen.admin_request_count(), 1);

        assert!(screen.logout().unwrap());

        assert!(screen.session().is_guest());
        assert_eq!(screen.admin_request_count(), 0);
        assert_eq!(screen.gate().click_upload().await, ClickOutcome::LoginRequired);
    }

    #[tokio::test]
    async fn test_logout_closes_open_upload_form() {
        let service = Arc::new(FakeService::new().with_profile(0, true));
        let mut screen = screen(&service, Some("member"));
        screen.load_page().await;
        screen.gate().click_upload().await;

        screen.logout().unwrap();

        assert_eq!(screen.gate().phase(), GatePhase::Idle);
    }

    #[tokio::test]
    async fn test_login_stores_token_and_resolves() {
        let service = Arc::new(FakeService::new().with_profile(0, false));
        let mut screen = screen(&service, None);
        screen.load_page().await;

        let session = screen.login("fresh").await.unwrap();

        assert_eq!(session.role(), Role::Member);
        assert!(service.saw_token("fresh"));
    }

    #[tokio::test]
    async fn test_delete_uses_stored_token_and_reloads() {
        let service = Arc::new(
            FakeService::new()
                .with_profile(1, true)
                .with_resources(sample_resources()),
        );
        let mut screen = screen(&service, Some("admin"));
        screen.load_page().await;

        screen.delete(&ResourceId::from("2")).await.unwrap();

        assert_eq!(service.calls("list_resources"), 2);
        assert_eq!(screen.catalog().snapshot().len(), 1);
    }
}
