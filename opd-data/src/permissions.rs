//! Permission gate.
//!
//! The backend hands out a flat list of permission names at login, which is
//! persisted as a JSON array. A [`PermissionStore`] is built from it once per
//! session and passed to whoever needs to authorize something.

use opd_core::storage::{keys, ClientStorage};
use std::collections::BTreeSet;

/// Landing routes in priority order: the first one granted wins.
pub const ROUTE_PRIORITY: [(&str, &str); 6] = [
    ("dashboard.view", "/dashboard"),
    ("letter.view", "/letter-numbers"),
    ("inspeksi-kpc.view", "/inspeksi-kpc"),
    ("docs.view", "/docs"),
    ("callrecord.view", "/callrecord"),
    ("profile.view", "/profile"),
];

/// Always reachable, whatever the permission list says.
pub const FALLBACK_ROUTE: &str = "/profile";

/// What a guarded route should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    Redirect(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionStore {
    granted: BTreeSet<String>,
}

impl PermissionStore {
    /// Read the cached permission list. Missing, unreadable or malformed
    /// data all mean "no permissions".
    pub fn load(storage: &dyn ClientStorage) -> Self {
        match storage.get_item(keys::PERMISSIONS) {
            Ok(Some(raw)) => Self::from_json(&raw),
            Ok(None) => Self::default(),
            Err(e) => {
                log::debug!("[OPD] permissions: storage read failed: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(list) => Self::from_permissions(list),
            Err(e) => {
                log::debug!("[OPD] permissions: ignoring malformed list: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_permissions<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.granted.contains(permission)
    }

    pub fn granted(&self) -> impl Iterator<Item = &str> {
        self.granted.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    pub fn resolve_default_route(&self) -> &'static str {
        ROUTE_PRIORITY
            .iter()
            .find(|(permission, _)| self.has_permission(permission))
            .map(|(_, route)| *route)
            .unwrap_or(FALLBACK_ROUTE)
    }

    /// Decide whether a view needing `required` may render.
    pub fn guard(&self, route: &str, required: Option<&str>) -> RouteDecision {
        match required {
            Some(permission) if !self.has_permission(permission) => {
                let target = self.resolve_default_route();
                log::warn!(
                    "[OPD] permissions: '{}' needs '{}', redirecting to {}",
                    route,
                    permission,
                    target
                );
                RouteDecision::Redirect(target.to_string())
            }
            _ => RouteDecision::Render,
        }
    }

    /// Forget everything, as on logout.
    pub fn invalidate(&mut self) {
        self.granted.clear();
    }
}
