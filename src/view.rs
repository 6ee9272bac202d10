//! Catalog view: a passive text projection of screen state.

use std::fmt::Write as _;

use crate::catalog::FileIcon;
use crate::notify::{Notification, NotificationKind};
use crate::screen::LibraryScreen;
use crate::session::Role;
use crate::upload::GatePhase;

/// One rendered resource row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRow {
    pub id: String,
    pub title: String,
    pub icon: FileIcon,
    pub download_url: String,
    /// Delete control shown (admin sessions only).
    pub deletable: bool,
}

/// Everything the view needs, captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSnapshot {
    pub role: Role,
    pub admin_requests: usize,
    pub notification: Notification,
    pub gate: GatePhase,
    pub upload_enabled: bool,
    pub query: String,
    pub rows: Vec<ResourceRow>,
}

impl ScreenSnapshot {
    /// Captures the screen's current state.
    #[must_use]
    pub fn capture(screen: &LibraryScreen) -> Self {
        let deletable = screen.session().is_admin();
        let rows = screen
            .catalog()
            .filtered()
            .into_iter()
            .map(|resource| ResourceRow {
                id: resource.id.to_string(),
                icon: resource.icon(),
                download_url: resource.download_url().to_string(),
                title: resource.title,
                deletable,
            })
            .collect();

        Self {
            role: screen.session().role(),
            admin_requests: screen.admin_request_count(),
            notification: screen.notifications().current(),
            gate: screen.gate().phase(),
            upload_enabled: !screen.gate().is_busy(),
            query: screen.catalog().query(),
            rows,
        }
    }
}

/// Renders a snapshot as plain text.
#[must_use]
pub fn render(snapshot: &ScreenSnapshot) -> String {
    let mut out = String::new();

    match snapshot.role {
        Role::Guest => out.push_str("[Login] [Signup]\n"),
        Role::Member => out.push_str("[Profile] [Logout]\n"),
        Role::Admin if snapshot.admin_requests > 0 => {
            let _ = writeln!(out, "[Requests: {}] [Profile] [Logout]", snapshot.admin_requests);
        }
        Role::Admin => out.push_str("[Requests] [Profile] [Logout]\n"),
    }

    if snapshot.notification.visible {
        let marker = match snapshot.notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        let _ = writeln!(out, "({marker}) {}", snapshot.notification.message);
    }

    match snapshot.gate {
        GatePhase::PermissionDenied => {
            out.push_str("You need permission to upload. [Request permission] [Close]\n");
        }
        GatePhase::FormOpen | GatePhase::Submitting => out.push_str("Upload dialog open\n"),
        GatePhase::Idle | GatePhase::CheckingPermission => {}
    }

    if !snapshot.query.is_empty() {
        let _ = writeln!(out, "Search: {}", snapshot.query);
    }

    if snapshot.rows.is_empty() {
        out.push_str("No resources found.\n");
    }
    for row in &snapshot.rows {
        let _ = write!(out, "[{:<4}] {}  {}", row.icon.tag(), row.title, row.download_url);
        if row.deletable {
            let _ = write!(out, "  (delete: {})", row.id);
        }
        out.push('\n');
    }

    out
}
