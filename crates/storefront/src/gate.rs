//! Role gate: render-or-redirect decisions for gated routes.

use crate::routes::{LOGIN_PATH, RouteRequirement, UNAUTHORIZED_PATH};
use crate::session::{Session, SessionStatus};

/// Outcome of checking a session against a route requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The session has not resolved yet; show a loading placeholder.
    Wait,
    /// Show the requested view.
    Render,
    /// Nobody is signed in.
    RedirectLogin,
    /// The signed-in user lacks the required role.
    RedirectUnauthorized,
}

impl Decision {
    /// Where to send the user, for redirect decisions.
    #[must_use]
    pub const fn redirect_target(self) -> Option<&'static str> {
        match self {
            Self::RedirectLogin => Some(LOGIN_PATH),
            Self::RedirectUnauthorized => Some(UNAUTHORIZED_PATH),
            Self::Wait | Self::Render => None,
        }
    }

    /// Whether the decision is final for the current session.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Wait)
    }
}

/// Decide whether `session` may see a view guarded by `requirement`.
///
/// Pure and cheap; call it again whenever the session changes rather than
/// caching the result.
#[must_use]
pub fn authorize(session: &Session, requirement: &RouteRequirement) -> Decision {
    if session.status == SessionStatus::Pending {
        return Decision::Wait;
    }
    if session.identity.is_none() {
        return Decision::RedirectLogin;
    }
    match requirement.required_role {
        Some(required) if session.role != Some(required) => Decision::RedirectUnauthorized,
        _ => Decision::Render,
    }
}

#[cfg(test)]
mod tests {
    use artisan_backend::Identity;
    use artisan_core::Role;

    use super::*;

    fn signed_in(role: Option<Role>) -> Session {
        Session::resolved(Some(Identity::new("u1", None)), role)
    }

    fn seller_route() -> RouteRequirement {
        RouteRequirement::role("/seller/dashboard", Role::Seller)
    }

    fn requirements() -> Vec<RouteRequirement> {
        vec![
            RouteRequirement::authenticated("/checkout"),
            RouteRequirement::role("/seller/dashboard", Role::Seller),
            RouteRequirement::role("/somewhere", Role::User),
        ]
    }

    #[test]
    fn test_pending_session_always_waits() {
        let sessions = [
            Session::pending(),
            Session {
                identity: Some(Identity::new("u1", None)),
                role: Some(Role::Seller),
                status: SessionStatus::Pending,
            },
        ];
        for session in &sessions {
            for requirement in requirements() {
                assert_eq!(authorize(session, &requirement), Decision::Wait);
            }
        }
    }

    #[test]
    fn test_anonymous_redirects_to_login() {
        let session = Session::resolved(None, None);
        for requirement in requirements() {
            assert_eq!(authorize(&session, &requirement), Decision::RedirectLogin);
        }
    }

    #[test]
    fn test_no_required_role_renders() {
        let requirement = RouteRequirement::authenticated("/checkout");
        for role in [None, Some(Role::User), Some(Role::Seller)] {
            assert_eq!(authorize(&signed_in(role), &requirement), Decision::Render);
        }
    }

    #[test]
    fn test_role_mismatch_is_unauthorized() {
        assert_eq!(
            authorize(&signed_in(Some(Role::User)), &seller_route()),
            Decision::RedirectUnauthorized
        );
        assert_eq!(
            authorize(&signed_in(None), &seller_route()),
            Decision::RedirectUnauthorized
        );
    }

    #[test]
    fn test_seller_on_dashboard_renders() {
        assert_eq!(
            authorize(&signed_in(Some(Role::Seller)), &seller_route()),
            Decision::Render
        );
    }

    #[test]
    fn test_redirect_targets() {
        assert_eq!(Decision::RedirectLogin.redirect_target(), Some("/login"));
        assert_eq!(
            Decision::RedirectUnauthorized.redirect_target(),
            Some("/unauthorized")
        );
        assert_eq!(Decision::Render.redirect_target(), None);
        assert!(!Decision::Wait.is_terminal());
    }
}
