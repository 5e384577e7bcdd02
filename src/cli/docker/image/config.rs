//! Docker image configuration and constants.

use crate::bundler::utils::retry::RetryPolicy;
use crate::cli::retry_config::docker_poll_policy;
use std::path::PathBuf;

/// Default name of the buildx builder instance
pub const DEFAULT_BUILDER_NAME: &str = "foobar-multiarch";

/// Driver used when the builder has to be created; the default `docker`
/// driver cannot build for more than one platform
pub const BUILDER_DRIVER: &str = "docker-container";

/// OCI provenance label keys
pub const LABEL_CREATED: &str = "org.opencontainers.image.created";
pub const LABEL_VERSION: &str = "org.opencontainers.image.version";
pub const LABEL_REVISION: &str = "org.opencontainers.image.revision";

/// Platform-specific Docker startup instructions
#[cfg(target_os = "macos")]
pub const DOCKER_START_HELP: &str = "Start Docker Desktop from Applications or Spotlight";

#[cfg(not(target_os = "macos"))]
pub const DOCKER_START_HELP: &str = "Start Docker daemon: sudo systemctl start docker";

/// Settings for image publication.
#[derive(Clone, Debug)]
pub struct ImageOptions {
    /// buildx builder instance name
    pub builder: String,
    /// Build context handed to `docker buildx build`
    pub context: PathBuf,
    /// Poll budget for daemon and builder readiness
    pub poll: RetryPolicy,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            builder: DEFAULT_BUILDER_NAME.to_string(),
            context: PathBuf::from("."),
            poll: docker_poll_policy(),
        }
    }
}
