//! Route guard: pure reachability decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Given a resolved session and a requested path, say whether the view may
//! open or where to send the user instead. No I/O, no clock, no state.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::{Access, HOME, LOGIN, lookup};
use crate::state::session::{ResolvedSession, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

impl Decision {
    /// Where the user ends up: the requested path or a redirect target.
    #[must_use]
    pub fn target<'a>(self, requested: &'a str) -> &'a str {
        match self {
            Self::Allow => requested,
            Self::RedirectToLogin => LOGIN,
            Self::RedirectToHome => HOME,
        }
    }
}

#[must_use]
pub fn decide(session: ResolvedSession, path: &str) -> Decision {
    let Some(route) = lookup(path) else {
        return Decision::RedirectToHome;
    };
    match (route.access, session) {
        (Access::Public, _) => Decision::Allow,
        (Access::Authenticated | Access::Only(_), ResolvedSession::Anonymous) => Decision::RedirectToLogin,
        (Access::Authenticated, ResolvedSession::Authenticated(_)) => Decision::Allow,
        (Access::Only(required), ResolvedSession::Authenticated(role)) => {
            if role == required {
                Decision::Allow
            } else {
                Decision::RedirectToHome
            }
        }
    }
}

/// `None` while the session is still loading.
#[must_use]
pub fn decide_for_session(session: &Session, path: &str) -> Option<Decision> {
    session.resolved().map(|resolved| decide(resolved, path))
}
