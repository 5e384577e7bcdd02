//! `build`: package the payload for every target.

use crate::bundler::{Artifact, ArtifactPackager, SettingsBuilder};
use crate::cli::RuntimeConfig;
use crate::error::Result;

/// Packages every configured target into the distribution directory.
pub async fn run(config: &RuntimeConfig) -> Result<Vec<Artifact>> {
    let mut builder = SettingsBuilder::new()
        .source(&config.source)
        .version(config.version.clone())
        .dist_dir(&config.dist_dir)
        .targets(config.targets.clone())
        .compress(config.compress);
    if let Some(name) = &config.name {
        builder = builder.name(name.clone());
    }
    let settings = builder.build()?;

    log::info!(
        "Building {} {} for {} target(s) into {}",
        settings.name(),
        config.version,
        settings.targets().len(),
        config.dist_dir.display()
    );
    let artifacts = ArtifactPackager::new(settings).package().await?;
    log::info!("✓ Built {} artifact(s)", artifacts.len());
    Ok(artifacts)
}
