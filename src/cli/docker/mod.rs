//! Container image publishing.
//!
//! # Module Structure
//!
//! - `image` - buildx builder management, build and push, registry checks

mod image;

pub use image::{
    BuilderStatus, DEFAULT_BUILDER_NAME, ImageOptions, ImagePublisher, ImageRef, PushOutcome,
    parse_status,
};
