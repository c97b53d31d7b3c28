//! Backend plumbing: wire types, the HTTP adapter, and typed endpoints.

pub mod api;
pub mod http;
pub mod types;
