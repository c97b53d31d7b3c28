//! Job board client: session state, backend access, route guarding, and the
//! headless views built on them.
//!
//! ARCHITECTURE
//! ============
//! - [`state::session::SessionStore`] owns who is logged in.
//! - [`net::http::HttpClient`] speaks to the REST backend; [`net::api::JobBoardApi`]
//!   adds the bearer token and expires the session on a rejected token.
//! - [`routes`] holds the route table and the pure guard.
//! - [`pages`] are the domain views; the `jobboard` binary drives them from
//!   the command line.

pub mod config;
pub mod error;
pub mod net;
pub mod pages;
pub mod routes;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_support;
