//! Multi-architecture image publishing.
//!
//! The image is built once by a `docker-container` buildx builder for every
//! linux platform of the release and pushed under the version tag and
//! `latest` in the same invocation.

mod availability;
mod builder;
mod config;
mod manager;
mod reference;
mod utils;

pub use builder::{BuilderStatus, parse_status};
pub use config::{DEFAULT_BUILDER_NAME, ImageOptions};
pub use manager::{ImagePublisher, PushOutcome};
pub use reference::ImageRef;
