//! Client-side state: the session store and what it depends on.

pub mod backend;
pub mod session;
pub mod storage;
