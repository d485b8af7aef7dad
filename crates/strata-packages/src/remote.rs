//! HTTP clients for the image-diff service and the package repository.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PackageDiffError, PackageDiffResult};
use crate::traits::RepositoryLookup;
use crate::types::PackageDiff;

/// Default timeout for every remote call (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder substituted with the package name in repository URLs.
pub const PACKAGE_NAME_PLACEHOLDER: &str = "{packageName}";

/// Where the image-diff service lives and which image it is asked about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteServiceConfig {
    /// Full image reference, e.g. `ghcr.io/vanilla-os/desktop`.
    pub image_name: String,
    pub differ_url: String,
    pub timeout: Duration,
}

impl RemoteServiceConfig {
    pub fn new(image_name: impl Into<String>, differ_url: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            differ_url: differ_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Last `/`-separated component of the image name.
    pub fn image_short_name(&self) -> &str {
        self.image_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.image_name)
    }

    /// `<differ_url>/images/<image>/diff`
    pub fn diff_url(&self) -> String {
        format!(
            "{}/images/{}/diff",
            self.differ_url.trim_end_matches('/'),
            self.image_short_name()
        )
    }
}

#[derive(Serialize)]
struct ImageDiffRequest<'a> {
    old_digest: &'a str,
    new_digest: &'a str,
}

/// Client for the remote image-diff service.
pub struct DifferClient {
    config: RemoteServiceConfig,
    client: Client,
}

impl DifferClient {
    pub fn new(config: RemoteServiceConfig) -> PackageDiffResult<Self> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RemoteServiceConfig {
        &self.config
    }

    /// Ask the service for the package diff between two image digests.
    ///
    /// One request, no retries. Anything but a `200` carrying a valid
    /// [`PackageDiff`] is a [`PackageDiffError::RemoteService`].
    pub fn image_diff(&self, old_digest: &str, new_digest: &str) -> PackageDiffResult<PackageDiff> {
        let url = self.config.diff_url();
        debug!(%url, old_digest, new_digest, "requesting base image package diff");

        let body = ImageDiffRequest {
            old_digest,
            new_digest,
        };
        let response = self
            .client
            .get(&url)
            .json(&body)
            .send()
            .map_err(|e| PackageDiffError::RemoteService(format!("request to {url} failed: {e}")))?;

        let bytes = read_ok_body(response).map_err(PackageDiffError::RemoteService)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PackageDiffError::RemoteService(format!("invalid diff response: {e}")))
    }
}

/// Package metadata as served by the repository.
///
/// Only `version` is required; other fields are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoPackageInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub version: String,
}

/// Where package metadata is looked up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// URL template containing `{packageName}`.
    pub package_url: String,
    pub timeout: Duration,
}

impl RepositoryConfig {
    pub fn new(package_url: impl Into<String>) -> Self {
        Self {
            package_url: package_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn package_url_for(&self, name: &str) -> String {
        self.package_url.replace(PACKAGE_NAME_PLACEHOLDER, name)
    }
}

/// [`RepositoryLookup`] over HTTP.
pub struct RepositoryClient {
    config: RepositoryConfig,
    client: Client,
}

impl RepositoryClient {
    pub fn new(config: RepositoryConfig) -> PackageDiffResult<Self> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }
}

impl RepositoryLookup for RepositoryClient {
    fn lookup(&self, name: &str) -> PackageDiffResult<RepoPackageInfo> {
        let fail = |reason: String| PackageDiffError::RepositoryLookup {
            package: name.to_string(),
            reason,
        };

        let url = self.config.package_url_for(name);
        debug!(%url, package = name, "looking up latest package version");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| fail(format!("request to {url} failed: {e}")))?;
        let bytes = read_ok_body(response).map_err(fail)?;

        let info: RepoPackageInfo = serde_json::from_slice(&bytes)
            .map_err(|e| fail(format!("invalid package metadata: {e}")))?;
        if info.version.is_empty() {
            return Err(fail("package metadata has an empty version".into()));
        }
        Ok(info)
    }
}

/// Construction errors surface as [`PackageDiffError::Config`].
fn build_client(timeout: Duration) -> PackageDiffResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("strata/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(client_build_error)
}

fn client_build_error(e: impl fmt::Display) -> PackageDiffError {
    PackageDiffError::Config(format!("cannot create HTTP client: {e}"))
}

fn read_ok_body(response: Response) -> Result<Vec<u8>, String> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(format!("unexpected status {status} from {}", response.url()));
    }
    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| format!("cannot read response body: {e}"))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use axum::extract::Path;
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::types::PackageDiffEntry;

    /// Serve `router` on a loopback port from a background thread.
    fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, router).await.unwrap();
            });
        });

        format!("http://{addr}")
    }

    fn differ(url: &str) -> DifferClient {
        DifferClient::new(RemoteServiceConfig::new("ghcr.io/vanilla-os/desktop", url)).unwrap()
    }

    async fn image_diff_handler(Path(image): Path<String>, Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(image, "desktop");
        assert_eq!(body["old_digest"], "sha256:aaa");
        assert_eq!(body["new_digest"], "sha256:bbb");
        Json(json!({
            "Added": [{"name": "fish", "oldVersion": "", "newVersion": "3.7.0-1"}],
            "Upgraded": [{"name": "vim", "oldVersion": "9.0", "newVersion": "9.1"}],
            "Downgraded": null,
            "Removed": [],
        }))
    }

    #[test]
    fn client_setup_failure_is_config_error() {
        let err = client_build_error("no TLS backend");
        match &err {
            PackageDiffError::Config(msg) => assert!(msg.contains("no TLS backend")),
            other => panic!("expected Config, got {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "configuration error: cannot create HTTP client: no TLS backend"
        );

        assert!(build_client(Duration::from_secs(1)).is_ok());
        assert!(RepositoryClient::new(RepositoryConfig::new("http://r/{packageName}")).is_ok());
    }

    #[test]
    fn diff_url_uses_short_image_name() {
        let config = RemoteServiceConfig::new("ghcr.io/vanilla-os/desktop", "https://differ.example/");
        assert_eq!(config.image_short_name(), "desktop");
        assert_eq!(config.diff_url(), "https://differ.example/images/desktop/diff");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let bare = RemoteServiceConfig::new("desktop", "http://d");
        assert_eq!(bare.image_short_name(), "desktop");
    }

    #[test]
    fn image_diff_parses_response() {
        let url = serve(Router::new().route("/images/:image/diff", get(image_diff_handler)));

        let diff = differ(&url).image_diff("sha256:aaa", "sha256:bbb").unwrap();
        assert_eq!(diff.added, vec![PackageDiffEntry::new("fish", "", "3.7.0-1")]);
        assert_eq!(diff.upgraded, vec![PackageDiffEntry::new("vim", "9.0", "9.1")]);
        assert!(diff.downgraded.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn image_diff_non_200_is_remote_error() {
        let url = serve(Router::new().route(
            "/images/:image/diff",
            get(|| async { (HttpStatus::INTERNAL_SERVER_ERROR, "boom") }),
        ));

        let err = differ(&url).image_diff("a", "b").unwrap_err();
        match err {
            PackageDiffError::RemoteService(msg) => assert!(msg.contains("500")),
            other => panic!("expected RemoteService, got {:?}", other),
        }
    }

    #[test]
    fn image_diff_bad_json_is_remote_error() {
        let url = serve(Router::new().route("/images/:image/diff", get(|| async { "not json" })));

        let err = differ(&url).image_diff("a", "b").unwrap_err();
        assert!(matches!(err, PackageDiffError::RemoteService(_)));
    }

    #[test]
    fn image_diff_times_out() {
        let url = serve(Router::new().route(
            "/images/:image/diff",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        ));

        let config = RemoteServiceConfig::new("desktop", url).with_timeout(Duration::from_millis(200));
        let err = DifferClient::new(config).unwrap().image_diff("a", "b").unwrap_err();
        assert!(matches!(err, PackageDiffError::RemoteService(_)));
    }

    #[test]
    fn unreachable_service_is_remote_error() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let err = differ(&format!("http://{addr}")).image_diff("a", "b").unwrap_err();
        assert!(matches!(err, PackageDiffError::RemoteService(_)));
    }

    #[test]
    fn package_url_template() {
        let config = RepositoryConfig::new("https://repo.example/api/pkg/{packageName}");
        assert_eq!(config.package_url_for("vim"), "https://repo.example/api/pkg/vim");
    }

    fn repository(url: &str) -> RepositoryClient {
        RepositoryClient::new(RepositoryConfig::new(format!("{url}/api/pkg/{{packageName}}"))).unwrap()
    }

    #[test]
    fn repository_lookup_reads_version() {
        let url = serve(Router::new().route(
            "/api/pkg/:name",
            get(|Path(name): Path<String>| async move {
                Json(json!({"name": name, "version": "3.7.0-1", "section": "shells"}))
            }),
        ));

        let info = repository(&url).lookup("fish").unwrap();
        assert_eq!(info.version, "3.7.0-1");
        assert_eq!(info.name.as_deref(), Some("fish"));
    }

    #[test]
    fn repository_missing_version_is_lookup_error() {
        let url = serve(
            Router::new()
                .route("/api/pkg/nover", get(|| async { Json(json!({"name": "nover"})) }))
                .route("/api/pkg/numeric", get(|| async { Json(json!({"version": 3})) }))
                .route("/api/pkg/blank", get(|| async { Json(json!({"version": ""})) })),
        );
        let client = repository(&url);

        for name in ["nover", "numeric", "blank"] {
            match client.lookup(name).unwrap_err() {
                PackageDiffError::RepositoryLookup { package, .. } => assert_eq!(package, name),
                other => panic!("expected RepositoryLookup, got {:?}", other),
            }
        }
    }

    #[test]
    fn repository_404_is_lookup_error() {
        let url = serve(Router::new());
        let err = repository(&url).lookup("ghost").unwrap_err();
        match err {
            PackageDiffError::RepositoryLookup { package, reason } => {
                assert_eq!(package, "ghost");
                assert!(reason.contains("404"));
            }
            other => panic!("expected RepositoryLookup, got {:?}", other),
        }
    }
}
