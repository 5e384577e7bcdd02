//! Release asset download.
//!
//! GitHub assets live at a fixed URL per tag and file name. GitLab releases
//! only link to their assets, so the links are read from the Releases API
//! first.

use super::error::{InstallError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Network timeout for a single download
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Default GitLab instance
pub const DEFAULT_GITLAB_HOST: &str = "https://gitlab.com";

/// Fetches a URL into memory.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    /// Downloads `url` and returns the body.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// [`Fetch`] over HTTPS with reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("foobar_install/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InstallError::Download {
                url: String::new(),
                reason: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        log::info!("Downloading {url}");
        let download_error = |e: reqwest::Error| InstallError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url.clone()).send().await.map_err(download_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(InstallError::NotFound { url: url.to_string() });
        }
        let body = response
            .error_for_status()
            .map_err(download_error)?
            .bytes()
            .await
            .map_err(download_error)?;
        Ok(body.to_vec())
    }
}

/// Where releases are published.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReleaseSource {
    /// `owner/repo` on github.com
    GitHub { repo: String },
    /// `namespace/project` on a GitLab instance
    GitLab { host: Url, project: String },
}

impl ReleaseSource {
    /// GitHub source, validating the `owner/repo` slug.
    pub fn github(repo: &str) -> Result<Self> {
        check_slug(repo)?;
        Ok(ReleaseSource::GitHub { repo: repo.to_string() })
    }

    /// GitLab source on `host`, validating the project path.
    pub fn gitlab(host: &str, project: &str) -> Result<Self> {
        check_slug(project)?;
        let host = Url::parse(host).map_err(|e| InstallError::Location(format!("{host}: {e}")))?;
        if host.scheme() != "https" && host.scheme() != "http" {
            return Err(InstallError::Location(format!("{host} is not an http(s) URL")));
        }
        Ok(ReleaseSource::GitLab {
            host,
            project: project.to_string(),
        })
    }
}

fn check_slug(slug: &str) -> Result<()> {
    let parts: Vec<&str> = slug.split('/').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.trim().is_empty() || p.contains(char::is_whitespace)) {
        return Err(InstallError::Location(format!(
            "'{slug}' is not an owner/project path"
        )));
    }
    Ok(())
}

/// `https://github.com/<repo>/releases/download/<tag>/<file>`
pub fn github_asset_url(repo: &str, tag: &str, file: &str) -> Result<Url> {
    let mut url = Url::parse("https://github.com")
        .map_err(|e| InstallError::Location(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| InstallError::Location("github.com cannot carry a path".to_string()))?
        .extend(repo.split('/'))
        .extend(["releases", "download", tag, file]);
    Ok(url)
}

/// `<host>/api/v4/projects/<url-encoded project>/releases/<tag>`
pub fn gitlab_release_api_url(host: &Url, project: &str, tag: &str) -> Result<Url> {
    let mut url = host.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|()| InstallError::Location(format!("{host} cannot carry a path")))?
        .pop_if_empty()
        // One segment: the `/` separators are percent-encoded
        .extend(["api", "v4", "projects", project, "releases", tag]);
    Ok(url)
}

#[derive(Deserialize)]
struct GitLabRelease {
    assets: GitLabAssets,
}

#[derive(Deserialize)]
struct GitLabAssets {
    #[serde(default)]
    links: Vec<GitLabLink>,
}

#[derive(Deserialize)]
struct GitLabLink {
    name: String,
    url: String,
    #[serde(default)]
    direct_asset_url: Option<String>,
}

/// Asset name to download URL, from a GitLab release API response.
///
/// Prefers `direct_asset_url` when the release provides one.
pub fn parse_gitlab_links(body: &[u8]) -> Result<BTreeMap<String, Url>> {
    let release: GitLabRelease = serde_json::from_slice(body)?;
    release
        .assets
        .links
        .into_iter()
        .map(|link| {
            let raw = link.direct_asset_url.unwrap_or(link.url);
            let url = Url::parse(&raw).map_err(|e| InstallError::Location(format!("{raw}: {e}")))?;
            Ok((link.name, url))
        })
        .collect()
}

/// Resolves asset names of one release to URLs.
#[derive(Debug)]
pub struct AssetIndex {
    tag: String,
    kind: IndexKind,
}

#[derive(Debug)]
enum IndexKind {
    GitHub { repo: String },
    GitLab { links: BTreeMap<String, Url> },
}

impl AssetIndex {
    /// Prepares lookups for `tag`; GitLab needs one API call.
    pub async fn load<F: Fetch>(source: &ReleaseSource, tag: &str, fetcher: &F) -> Result<Self> {
        let kind = match source {
            ReleaseSource::GitHub { repo } => IndexKind::GitHub { repo: repo.clone() },
            ReleaseSource::GitLab { host, project } => {
                let api = gitlab_release_api_url(host, project, tag)?;
                let links = parse_gitlab_links(&fetcher.fetch(&api).await?)?;
                log::debug!("GitLab release {tag} links: {:?}", links.keys().collect::<Vec<_>>());
                IndexKind::GitLab { links }
            }
        };
        Ok(Self {
            tag: tag.to_string(),
            kind,
        })
    }

    /// Download URL for asset `name`.
    pub fn url(&self, name: &str) -> Result<Url> {
        match &self.kind {
            IndexKind::GitHub { repo } => github_asset_url(repo, &self.tag, name),
            IndexKind::GitLab { links } => links.get(name).cloned().ok_or_else(|| InstallError::AssetMissing {
                tag: self.tag.clone(),
                name: name.to_string(),
            }),
        }
    }
}
