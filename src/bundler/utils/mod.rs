//! Shared helpers: filesystem operations and bounded retries.

pub mod fs;
pub mod retry;
