//! Role capability table and navigation gate.
//!
//! Every page of the dashboard is declared once in [`NAVIGATION`] together
//! with the roles allowed to open it. Sidebar filtering, direct navigation and
//! the HTTP request guards all consult the same table.

use serde::Serialize;
use utoipa::ToSchema;

use crate::database::models::{Role, User};

pub const LOGIN_PATH: &str = "/login";
pub const DEFAULT_PATH: &str = "/dashboard";

#[derive(Serialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Upload,
    Files,
    Users,
    Reports,
}

#[derive(Serialize, Clone, Copy, Debug)]
pub struct NavigationItem {
    pub page: Page,
    pub name: &'static str,
    pub href: &'static str,
    #[serde(skip)]
    pub roles: &'static [Role],
}

const UPLOADERS: &[Role] = &[Role::VideoEditor, Role::ScriptWriter, Role::VoiceArtist];
const ADMINISTRATORS: &[Role] = &[Role::Admin];

pub const NAVIGATION: [NavigationItem; 5] = [
    NavigationItem { page: Page::Dashboard, name: "Dashboard", href: "/dashboard", roles: &Role::ALL },
    NavigationItem { page: Page::Upload, name: "Upload Files", href: "/upload", roles: UPLOADERS },
    NavigationItem { page: Page::Files, name: "All Files", href: "/files", roles: ADMINISTRATORS },
    NavigationItem { page: Page::Users, name: "Manage Users", href: "/users", roles: ADMINISTRATORS },
    NavigationItem { page: Page::Reports, name: "Monthly Reports", href: "/reports", roles: ADMINISTRATORS },
];

impl Page {
    pub fn item(&self) -> &'static NavigationItem {
        match self {
            Page::Dashboard => &NAVIGATION[0],
            Page::Upload => &NAVIGATION[1],
            Page::Files => &NAVIGATION[2],
            Page::Users => &NAVIGATION[3],
            Page::Reports => &NAVIGATION[4],
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.item().roles.contains(&role)
    }

    pub fn from_path(path: &str) -> Option<Page> {
        let path = path.trim_end_matches('/');
        NAVIGATION.iter().find(|item| item.href == path).map(|item| item.page)
    }
}

/// Pages visible to the role, in declaration order. No role, no pages.
pub fn navigation(role: Option<Role>) -> Vec<&'static NavigationItem> {
    match role {
        Some(role) => NAVIGATION.iter().filter(|item| item.roles.contains(&role)).collect(),
        None => Vec::new()
    }
}

pub fn navigation_for_name(role_name: &str) -> Vec<&'static NavigationItem> {
    navigation(Role::parse(role_name))
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Access {
    Allow { page: Page },
    /// Login view, only offered to anonymous visitors
    Login,
    Redirect { target: String },
}

impl Access {
    fn redirect(target: &str) -> Self {
        Access::Redirect { target: target.to_string() }
    }
}

/// Decides what direct navigation to `path` does for the current user.
pub fn gate(user: Option<&User>, path: &str) -> Access {
    let is_login = path.trim_end_matches('/') == LOGIN_PATH;
    let user = match user {
        Some(user) => user,
        None if is_login => return Access::Login,
        None => return Access::redirect(LOGIN_PATH)
    };

    match Page::from_path(path) {
        Some(page) if page.permits(user.role) => Access::Allow { page },
        _ => Access::redirect(DEFAULT_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hrefs(role: Role) -> Vec<&'static str> {
        navigation(Some(role)).iter().map(|item| item.href).collect()
    }

    fn user(role: Role) -> User {
        User {
            id: String::from("1"),
            username: String::from("someone"),
            email: String::from("someone@teamfocuz.com"),
            role,
            name: String::from("Someone"),
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn navigation_matches_declared_subsets() {
        assert_eq!(hrefs(Role::Admin), vec!["/dashboard", "/files", "/users", "/reports"]);
        assert_eq!(hrefs(Role::VideoEditor), vec!["/dashboard", "/upload"]);
        assert_eq!(hrefs(Role::ScriptWriter), vec!["/dashboard", "/upload"]);
        assert_eq!(hrefs(Role::VoiceArtist), vec!["/dashboard", "/upload"]);
    }

    #[test]
    fn unknown_role_sees_nothing() {
        assert!(navigation(None).is_empty());
        assert!(navigation_for_name("guest").is_empty());
        assert_eq!(navigation_for_name("admin").len(), 4);
    }

    #[test]
    fn anonymous_navigation_goes_to_login() {
        assert_eq!(gate(None, "/reports"), Access::Redirect { target: String::from("/login") });
        assert_eq!(gate(None, "/dashboard"), Access::Redirect { target: String::from("/login") });
        assert_eq!(gate(None, "/"), Access::Redirect { target: String::from("/login") });
    }

    #[test]
    fn anonymous_login_shows_login_view() {
        assert_eq!(gate(None, "/login"), Access::Login);
        assert_eq!(gate(None, "/login/"), Access::Login);
    }

    #[test]
    fn forbidden_pages_go_to_dashboard() {
        let editor = user(Role::VideoEditor);
        assert_eq!(gate(Some(&editor), "/users"), Access::Redirect { target: String::from("/dashboard") });
        assert_eq!(gate(Some(&editor), "/upload/"), Access::Allow { page: Page::Upload });

        let admin = user(Role::Admin);
        assert_eq!(gate(Some(&admin), "/upload"), Access::Redirect { target: String::from("/dashboard") });
        assert_eq!(gate(Some(&admin), "/reports"), Access::Allow { page: Page::Reports });
    }

    #[test]
    fn unknown_paths_fall_back_to_dashboard() {
        let admin = user(Role::Admin);
        assert_eq!(gate(Some(&admin), "/"), Access::Redirect { target: String::from("/dashboard") });
        assert_eq!(gate(Some(&admin), "/login"), Access::Redirect { target: String::from("/dashboard") });
        assert_eq!(gate(Some(&admin), "/settings"), Access::Redirect { target: String::from("/dashboard") });
    }
}
