//! One module per pipeline command.

pub mod build;
pub mod clean;
pub mod docker;
pub mod release;
