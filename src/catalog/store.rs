//! Catalog store: service-backed operations over a [`ResourceCatalog`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, instrument, warn};

use super::{Resource, ResourceCatalog, ResourceId, SortDirection};
use crate::api::{ApiError, LibraryService};
use crate::failure::{FailureCategory, WorkflowError};
use crate::notify::NotificationChannel;

const LOAD_FAILED: &str = "Error fetching resources";
const DELETE_OK: &str = "Resource deleted successfully";
const DELETE_REJECTED: &str = "Resource deletion failed";
const DELETE_ERRORED: &str = "An error occurred during resource deletion";
const DELETE_LOGIN: &str = "Please login to manage resources";

/// Holds the fetched catalog and keeps it in step with the service.
///
/// Every mutation on the service side (delete here, upload in the gate) is
/// followed by a full [`load`](Self::load) rather than a local patch.
pub struct CatalogStore {
    service: Arc<dyn LibraryService>,
    notifications: NotificationChannel,
    catalog: Mutex<ResourceCatalog>,
}

impl CatalogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(service: Arc<dyn LibraryService>, notifications: NotificationChannel) -> Self {
        Self {
            service,
            notifications,
            catalog: Mutex::new(ResourceCatalog::new()),
        }
    }

    fn catalog(&self) -> MutexGuard<'_, ResourceCatalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches the full list and replaces the snapshot.
    ///
    /// On failure an error notification is shown and the previous snapshot
    /// stays in place.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the service call.
    #[instrument(level = "debug", skip(self))]
    pub async fn load(&self) -> Result<usize, ApiError> {
        match self.service.list_resources().await {
            Ok(resources) => {
                let mut catalog = self.catalog();
                catalog.replace(resources);
                let count = catalog.len();
                debug!(count, "catalog loaded");
                Ok(count)
            }
            Err(err) => {
                error!(error = %err, "Error fetching resources");
                self.notifications.error(LOAD_FAILED);
                Err(err)
            }
        }
    }

    /// Sets the search query. No network call.
    pub fn search(&self, query: impl Into<String>) {
        self.catalog().set_query(query);
    }

    /// Toggles and applies the title sort over the full snapshot.
    pub fn sort(&self) -> SortDirection {
        self.catalog().sort()
    }

    /// Deletes a resource, then reloads the catalog from the service.
    ///
    /// Without a token nothing is sent. On a service failure the local
    /// snapshot is left untouched. If the delete succeeds but the reload
    /// fails, the entry is dropped locally so the stale row does not linger.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when gated or when the delete call fails.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn remove(&self, token: Option<&str>, id: &ResourceId) -> Result<(), WorkflowError> {
        let Some(token) = token else {
            self.notifications.error(DELETE_LOGIN);
            return Err(WorkflowError::LoginRequired {
                action: "manage resources",
            });
        };

        if let Err(err) = self.service.delete_resource(token, id).await {
            let workflow_error = WorkflowError::from_api(err);
            match workflow_error {
                WorkflowError::Rejected { .. } => self.notifications.error(DELETE_REJECTED),
                _ => self.notifications.error(DELETE_ERRORED),
            }
            warn!(
                error = %workflow_error,
                category = workflow_error.category().map_or("none", FailureCategory::label),
                "Resource deletion failed"
            );
            return Err(workflow_error);
        }

        info!("resource deleted");
        self.notifications.success(DELETE_OK);
        if self.load().await.is_err() {
            self.catalog().remove_entry(id);
        }
        Ok(())
    }

    /// Full snapshot in stored order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Resource> {
        self.catalog().entries().to_vec()
    }

    /// Search results in stored order.
    #[must_use]
    pub fn filtered(&self) -> Vec<Resource> {
        self.catalog().filtered().into_iter().cloned().collect()
    }

    /// Current search query.
    #[must_use]
    pub fn query(&self) -> String {
        self.catalog().query().to_string()
    }

    /// Direction the next sort will apply.
    #[must_use]
    pub fn next_sort(&self) -> SortDirection {
        self.catalog().next_sort()
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("catalog", &*self.catalog())
            .finish_non_exhaustive()
    }
}
