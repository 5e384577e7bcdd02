//! Configuration structures for packaging operations.
//!
//! Version and platform types are validated at construction time, so the
//! packager only ever sees well-formed inputs.

mod arch;
mod builder;
mod core;
mod platform;
mod version;

pub use arch::Arch;
pub use builder::SettingsBuilder;
pub use core::{MANIFEST_FILE_NAME, Settings, archive_file_name, artifact_file_name};
pub use platform::{ArchiveFormat, Os, PlatformTarget, parse_target_list};
pub use version::Version;
