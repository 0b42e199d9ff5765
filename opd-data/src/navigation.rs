//! Sidebar menu, filtered by what the user may see.

use crate::permissions::{PermissionStore, RouteDecision};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub title: &'static str,
    pub route: &'static str,
    /// None means always visible
    pub permission: Option<&'static str>,
}

const fn item(title: &'static str, route: &'static str, permission: &'static str) -> MenuItem {
    MenuItem {
        title,
        route,
        permission: Some(permission),
    }
}

/// Every screen of the dashboard, in sidebar order.
pub const MENU: &[MenuItem] = &[
    item("Dashboard", "/dashboard", "dashboard.view"),
    item("Letter Numbers", "/letter-numbers", "letter.view"),
    item("Companies", "/companies", "letter.manage"),
    item("Document Types", "/document-types", "letter.manage"),
    item("Radio Trunking", "/inspeksi-kpc/radio-trunking", "inspeksi-kpc.view"),
    item("Radio Conventional", "/inspeksi-kpc/radio-conventional", "inspeksi-kpc.view"),
    item("Radio Grafir", "/inspeksi-kpc/radio-grafir", "inspeksi-kpc.view"),
    item("Radio Scrap", "/inspeksi-kpc/radio-scrap", "inspeksi-kpc.view"),
    item("SWR Sites", "/swr/sites", "swr.view"),
    item("SWR Channels", "/swr/channels", "swr.view"),
    item("SWR History", "/swr/history", "swr.view"),
    item("SWR Signal", "/swr/signal", "swr.view"),
    item("Docs", "/docs", "docs.view"),
    item("Call Records", "/callrecord", "callrecord.view"),
    item("Fleet Statistics", "/callrecord/fleet-statistics", "callrecord.view"),
    MenuItem {
        title: "Profile",
        route: "/profile",
        permission: None,
    },
];

/// Sidebar entries the user is allowed to open, in declared order.
pub fn menu_items(permissions: &PermissionStore) -> Vec<MenuItem> {
    MENU.iter()
        .filter(|entry| {
            entry
                .permission
                .map_or(true, |p| permissions.has_permission(p))
        })
        .copied()
        .collect()
}

/// Permission a route needs, if it is a known screen.
pub fn required_permission(route: &str) -> Option<&'static str> {
    MENU.iter()
        .find(|entry| entry.route == route)
        .and_then(|entry| entry.permission)
}

/// Guard a known screen by route.
pub fn guard_route(permissions: &PermissionStore, route: &str) -> RouteDecision {
    permissions.guard(route, required_permission(route))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_is_filtered_in_order() {
        let permissions = PermissionStore::from_permissions(["swr.view", "docs.view"]);
        let titles: Vec<&str> = menu_items(&permissions).iter().map(|m| m.title).collect();
        assert_eq!(
            titles,
            vec!["SWR Sites", "SWR Channels", "SWR History", "SWR Signal", "Docs", "Profile"]
        );
    }

    #[test]
    fn profile_is_always_visible() {
        let items = menu_items(&PermissionStore::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].route, "/profile");
    }

    #[test]
    fn guard_route_uses_menu_permissions() {
        let permissions = PermissionStore::from_permissions(["docs.view"]);
        assert_eq!(
            guard_route(&permissions, "/swr/signal"),
            RouteDecision::Redirect("/docs".to_string())
        );
        assert_eq!(guard_route(&permissions, "/docs"), RouteDecision::Render);
        assert_eq!(guard_route(&permissions, "/profile"), RouteDecision::Render);
    }
}
