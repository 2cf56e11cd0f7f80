use crate::session::models::Session;

/// Client-side route surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    ChangePassword,
    Main,
    User,
    EditUser,
    UsersList,
    About,
    PrivacyPolicy,
    TermsOfService,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::Login,
        Route::Register,
        Route::ChangePassword,
        Route::Main,
        Route::User,
        Route::EditUser,
        Route::UsersList,
        Route::About,
        Route::PrivacyPolicy,
        Route::TermsOfService,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ChangePassword => "/change-password",
            Route::Main => "/main",
            Route::User => "/user",
            Route::EditUser => "/edit-user",
            Route::UsersList => "/users-list",
            Route::About => "/about",
            Route::PrivacyPolicy => "/privacy-policy",
            Route::TermsOfService => "/terms-of-service",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|route| route.path() == path)
    }
}

/// Outcome of a guard check for one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        target: Route,
        /// Originally requested path, carried so login can return there.
        return_url: Option<String>,
    },
}

/// Which guard protects a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    /// Requires an authenticated session.
    Auth,
    /// Requires an authenticated admin.
    Admin,
    /// Anonymous-only surfaces (login, register).
    LoginOnly,
}

pub fn guard_for(route: Route) -> GuardKind {
    match route {
        Route::Login | Route::Register => GuardKind::LoginOnly,
        Route::UsersList => GuardKind::Admin,
        _ => GuardKind::Auth,
    }
}

pub fn auth_guard(session: &Session, requested: &str) -> GuardDecision {
    if session.is_authenticated() {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect {
            target: Route::Login,
            return_url: Some(requested.to_string()),
        }
    }
}

pub fn admin_guard(session: &Session, requested: &str) -> GuardDecision {
    if !session.is_authenticated() {
        return GuardDecision::Redirect {
            target: Route::Login,
            return_url: Some(requested.to_string()),
        };
    }

    let is_admin = session
        .user
        .as_ref()
        .and_then(|user| user.is_admin)
        .unwrap_or(false);

    if is_admin {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect {
            target: Route::Main,
            return_url: None,
        }
    }
}

pub fn login_guard(session: &Session, _requested: &str) -> GuardDecision {
    if session.is_authenticated() {
        GuardDecision::Redirect {
            target: Route::Main,
            return_url: None,
        }
    } else {
        GuardDecision::Allow
    }
}

/// Evaluates the guard registered for a route against the current session.
pub fn check_route(session: &Session, route: Route) -> GuardDecision {
    let requested = route.path();
    match guard_for(route) {
        GuardKind::Auth => auth_guard(session, requested),
        GuardKind::Admin => admin_guard(session, requested),
        GuardKind::LoginOnly => login_guard(session, requested),
    }
}

/// A navigation request emitted by a guard decision or by logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTarget {
    pub route: Route,
    pub return_url: Option<String>,
}

impl NavTarget {
    pub fn to(route: Route) -> Self {
        Self {
            route,
            return_url: None,
        }
    }
}

/// Receives navigation requests. Injected into the session controller so it
/// never owns routing itself.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavTarget);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::models::User;

    fn user(is_admin: bool) -> User {
        User {
            id: "1".to_string(),
            username: "mrossi".to_string(),
            email: None,
            name: None,
            last_name: None,
            is_admin: Some(is_admin),
            active: Some(true),
            created_at: None,
            last_active_at: None,
        }
    }

    fn authenticated(is_admin: bool) -> Session {
        Session {
            token: Some("tok".to_string()),
            user: Some(user(is_admin)),
        }
    }

    #[test]
    fn test_auth_guard_allows_authenticated() {
        assert_eq!(
            auth_guard(&authenticated(false), "/main"),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_auth_guard_redirects_anonymous_with_return_url() {
        assert_eq!(
            auth_guard(&Session::anonymous(), "/main"),
            GuardDecision::Redirect {
                target: Route::Login,
                return_url: Some("/main".to_string()),
            }
        );
    }

    #[test]
    fn test_admin_guard_redirects_non_admin_to_main() {
        assert_eq!(
            admin_guard(&authenticated(false), "/users-list"),
            GuardDecision::Redirect {
                target: Route::Main,
                return_url: None,
            }
        );
        assert_eq!(
            admin_guard(&authenticated(true), "/users-list"),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_admin_guard_redirects_anonymous_to_login() {
        assert_eq!(
            admin_guard(&Session::anonymous(), "/users-list"),
            GuardDecision::Redirect {
                target: Route::Login,
                return_url: Some("/users-list".to_string()),
            }
        );
    }

    #[test]
    fn test_login_guard() {
        assert_eq!(
            login_guard(&Session::anonymous(), "/login"),
            GuardDecision::Allow
        );
        assert_eq!(
            login_guard(&authenticated(false), "/login"),
            GuardDecision::Redirect {
                target: Route::Main,
                return_url: None,
            }
        );
    }

    #[test]
    fn test_route_table() {
        assert_eq!(guard_for(Route::Login), GuardKind::LoginOnly);
        assert_eq!(guard_for(Route::Register), GuardKind::LoginOnly);
        assert_eq!(guard_for(Route::UsersList), GuardKind::Admin);
        assert_eq!(guard_for(Route::Main), GuardKind::Auth);
        assert_eq!(guard_for(Route::PrivacyPolicy), GuardKind::Auth);

        // an authenticated non-admin may use the app but not the admin list
        let session = authenticated(false);
        assert_eq!(check_route(&session, Route::Main), GuardDecision::Allow);
        assert_eq!(
            check_route(&session, Route::UsersList),
            GuardDecision::Redirect {
                target: Route::Main,
                return_url: None,
            }
        );
    }

    #[test]
    fn test_route_paths_roundtrip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/unknown"), None);
    }
}
