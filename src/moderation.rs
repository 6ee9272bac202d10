//! Admin moderation badge: count of pending non-quiz resources.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::api::{LibraryService, PendingResource};
use crate::session::Session;

/// Category excluded from the moderation badge count (compared case-insensitively).
pub const EXCLUDED_CATEGORY: &str = "quiz";

/// Counts pending entries whose category is not [`EXCLUDED_CATEGORY`].
#[must_use]
pub fn count_pending(items: &[PendingResource]) -> usize {
    items
        .iter()
        .filter(|item| item.category.to_lowercase() != EXCLUDED_CATEGORY)
        .count()
}

/// Read-side badge shown to administrators.
///
/// Only exists for admin sessions; guests and members never trigger the
/// pending-queue fetch.
pub struct AdminBadge {
    service: Arc<dyn LibraryService>,
    token: String,
    count: usize,
}

impl AdminBadge {
    /// Builds a badge when `session` is an admin session, `None` otherwise.
    #[must_use]
    pub fn for_session(service: Arc<dyn LibraryService>, session: &Session) -> Option<Self> {
        if !session.is_admin() {
            return None;
        }
        let token = session.token()?.to_string();
        Some(Self {
            service,
            token,
            count: 0,
        })
    }

    /// Fetches the moderation queue and recomputes the count.
    ///
    /// Failures are logged and leave the count at zero.
    #[instrument(level = "debug", skip(self))]
    pub async fn refresh(&mut self) -> usize {
        self.count = match self.service.pending_resources(&self.token).await {
            Ok(items) => {
                let count = count_pending(&items);
                debug!(total = items.len(), count, "moderation queue fetched");
                count
            }
            Err(error) => {
                warn!(error = %error, "Error fetching admin requests");
                0
            }
        };
        self.count
    }

    /// Last computed count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl fmt::Debug for AdminBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBadge")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}
