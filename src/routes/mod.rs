//! Declarative route table for the client's top-level views.
//!
//! ARCHITECTURE
//! ============
//! One table lists every reachable view and who may open it. The guard in
//! [`guard`] is the only consumer; views never re-encode access rules.

pub mod guard;


use crate::net::types::Role;

/// Who may open a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Authenticated,
    Only(Role),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    /// Segment pattern; `:name` matches any single non-empty segment.
    pub pattern: &'static str,
    pub access: Access,
}

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const EMPLOYER_DASHBOARD: &str = "/employer/dashboard";

pub const ROUTES: &[Route] = &[
    Route { pattern: "/", access: Access::Public },
    Route { pattern: "/jobs", access: Access::Public },
    Route { pattern: "/jobs/:id", access: Access::Public },
    Route { pattern: "/login", access: Access::Public },
    Route { pattern: "/register", access: Access::Public },
    Route { pattern: "/profile", access: Access::Authenticated },
    Route { pattern: "/applications", access: Access::Authenticated },
    Route { pattern: "/messages", access: Access::Authenticated },
    Route { pattern: "/notifications", access: Access::Authenticated },
    Route { pattern: "/scheduler", access: Access::Authenticated },
    Route { pattern: "/dashboard", access: Access::Only(Role::JobSeeker) },
    Route { pattern: "/post-job", access: Access::Only(Role::Employer) },
    Route { pattern: "/employer/dashboard", access: Access::Only(Role::Employer) },
    Route { pattern: "/employer/jobs/create", access: Access::Only(Role::Employer) },
];

/// Strip query/fragment and split into non-empty segments.
fn segments(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn pattern_matches(pattern: &str, path_segments: &[&str]) -> bool {
    let pattern_segments = segments(pattern);
    pattern_segments.len() == path_segments.len()
        && pattern_segments
            .iter()
            .zip(path_segments)
            .all(|(p, s)| p.starts_with(':') || p == s)
}

/// Find the route for a concrete path.
#[must_use]
pub fn lookup(path: &str) -> Option<&'static Route> {
    let path_segments = segments(path);
    ROUTES.iter().find(|route| pattern_matches(route.pattern, &path_segments))
}
