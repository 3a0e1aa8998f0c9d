use serde::{Deserialize, Serialize};
use std::fmt;

/// Navigation targets the host application knows how to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Unauthenticated entry point.
    Login,
    Dashboard,
    Sales,
    Profile,
}

impl Route {
    pub fn requires_auth(self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Dashboard => "dashboard",
            Route::Sales => "sales",
            Route::Profile => "profile",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    Unauthenticated,
}

/// Where a navigation request should land given the session state.
pub fn resolve(requested: Route, state: SessionState) -> Route {
    match (state, requested) {
        (SessionState::Unauthenticated, r) if r.requires_auth() => Route::Login,
        (SessionState::Authenticated, Route::Login) => Route::Dashboard,
        (_, r) => r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_routes_bounce_to_login_when_logged_out() {
        for r in [Route::Dashboard, Route::Sales, Route::Profile] {
            assert_eq!(resolve(r, SessionState::Unauthenticated), Route::Login);
            assert_eq!(resolve(r, SessionState::Authenticated), r);
        }
    }

    #[test]
    fn login_screen_is_skipped_when_logged_in() {
        assert_eq!(resolve(Route::Login, SessionState::Authenticated), Route::Dashboard);
        assert_eq!(resolve(Route::Login, SessionState::Unauthenticated), Route::Login);
    }
}
