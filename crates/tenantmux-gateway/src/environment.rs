//! Environment descriptors attached to every greeting.
//!
//! Version and hostname are resolved once, on the first reply. Metadata
//! values are cached only once a lookup succeeds; a key that failed is asked
//! again on the next reply. Every lookup is best effort: a failure leaves the
//! field empty (or the default version) and is never surfaced to the caller.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::OnceCell;

pub const DEFAULT_VERSION: &str = "v1.0.0";
pub const DEFAULT_METADATA_URL: &str = "http://metadata/computeMetadata/v1/";

const ZONE: &str = "instance/zone";
const NODE_NAME: &str = "instance/hostname";
const REGION: &str = "instance/attributes/cluster-location";
const CLUSTER_NAME: &str = "instance/attributes/cluster-name";
const PROJECT: &str = "project/project-id";

/// Key/value lookup against instance metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// `None` when the key is unknown or the source is unreachable.
    async fn get(&self, path: &str) -> Option<String>;
}

/// GCE-style metadata server (`Metadata-Flavor: Google`).
pub struct CloudMetadata {
    client: reqwest::Client,
    base_url: String,
}

impl CloudMetadata {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl MetadataSource for CloudMetadata {
    async fn get(&self, path: &str) -> Option<String> {
        let url = format!("{}{}", self.base_url, path);
        let resp = match self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(%url, error = %e, "metadata lookup failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            tracing::debug!(%url, status = %resp.status(), "metadata lookup not found");
            return None;
        }
        let body = resp.bytes().await.ok()?;
        Some(String::from_utf8_lossy(&body).trim().to_string())
    }
}

/// Used when metadata lookups are disabled.
pub struct NoMetadata;

#[async_trait]
impl MetadataSource for NoMetadata {
    async fn get(&self, _path: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub version: String,
    pub hostname: String,
    pub zone: String,
    pub nodename: String,
    pub region: String,
    pub clustername: String,
    pub project: String,
}

/// Version and hostname, read once per process.
#[derive(Debug, Clone)]
struct LocalInfo {
    version: String,
    hostname: String,
}

/// Builds [`EnvironmentInfo`] for replies, caching what it can.
pub struct EnvironmentProbe {
    source: Arc<dyn MetadataSource>,
    version_file: PathBuf,
    local: OnceCell<LocalInfo>,
    metadata: DashMap<&'static str, String>,
}

impl EnvironmentProbe {
    pub fn new(source: Arc<dyn MetadataSource>, version_file: impl Into<PathBuf>) -> Self {
        Self {
            source,
            version_file: version_file.into(),
            local: OnceCell::new(),
            metadata: DashMap::new(),
        }
    }

    pub async fn info(&self) -> EnvironmentInfo {
        let local = self.local.get_or_init(|| self.resolve_local()).await;

        let (zone, nodename, region, clustername, project) = tokio::join!(
            self.lookup(ZONE),
            self.lookup(NODE_NAME),
            self.lookup(REGION),
            self.lookup(CLUSTER_NAME),
            self.lookup(PROJECT),
        );

        EnvironmentInfo {
            version: local.version.clone(),
            hostname: local.hostname.clone(),
            zone,
            nodename,
            region,
            clustername,
            project,
        }
    }

    async fn lookup(&self, path: &'static str) -> String {
        if let Some(v) = self.metadata.get(path) {
            return v.clone();
        }
        match self.source.get(path).await {
            Some(v) => {
                tracing::debug!(path, value = %v, "metadata resolved");
                self.metadata.insert(path, v.clone());
                v
            }
            None => String::new(),
        }
    }

    async fn resolve_local(&self) -> LocalInfo {
        let version = match tokio::fs::read_to_string(&self.version_file).await {
            Ok(v) => v.trim().to_string(),
            Err(e) => {
                tracing::warn!(path = %self.version_file.display(), error = %e, version = DEFAULT_VERSION, "unable to open version file, using default version");
                DEFAULT_VERSION.to_string()
            }
        };

        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::info!(%version, %hostname, "environment resolved");
        LocalInfo { version, hostname }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MapSource {
        values: Mutex<HashMap<&'static str, &'static str>>,
        calls: AtomicUsize,
    }

    impl MapSource {
        fn new(values: HashMap<&'static str, &'static str>) -> Self {
            Self { values: Mutex::new(values), calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl MetadataSource for MapSource {
        async fn get(&self, path: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.values.lock().unwrap().get(path).map(|v| v.to_string())
        }
    }

    #[tokio::test]
    async fn missing_version_file_uses_default() {
        let probe = EnvironmentProbe::new(Arc::new(NoMetadata), "/nonexistent/version.txt");
        let info = probe.info().await;
        assert_eq!(info.version, DEFAULT_VERSION);
        assert!(info.zone.is_empty());
    }

    #[tokio::test]
    async fn resolved_values_are_cached() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "v2.3.4").unwrap();

        let src = Arc::new(MapSource::new(HashMap::from([
            (ZONE, "zone-a"),
            (NODE_NAME, "node-1"),
            (REGION, "europe-west1"),
            (CLUSTER_NAME, "c1"),
            (PROJECT, "proj-1"),
        ])));
        let probe = EnvironmentProbe::new(src.clone(), f.path());

        let first = probe.info().await;
        let second = probe.info().await;
        assert_eq!(first, second);
        assert_eq!(first.version, "v2.3.4");
        assert_eq!(first.zone, "zone-a");
        assert_eq!(first.project, "proj-1");
        assert_eq!(src.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn failed_lookup_is_retried_on_next_reply() {
        let src = Arc::new(MapSource::new(HashMap::from([(ZONE, "zone-a")])));
        let probe = EnvironmentProbe::new(src.clone(), "/nonexistent/version.txt");

        let first = probe.info().await;
        assert_eq!(first.zone, "zone-a");
        assert!(first.region.is_empty());
        assert_eq!(src.calls.load(Ordering::SeqCst), 5);

        src.values.lock().unwrap().insert(REGION, "europe-west1");

        let second = probe.info().await;
        assert_eq!(second.zone, "zone-a");
        assert_eq!(second.region, "europe-west1");
        // zone was cached; region, nodename, clustername, project asked again
        assert_eq!(src.calls.load(Ordering::SeqCst), 9);

        let third = probe.info().await;
        assert_eq!(third.region, "europe-west1");
        assert_eq!(src.calls.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let m = CloudMetadata::new("http://metadata/computeMetadata/v1", Duration::from_millis(10)).unwrap();
        assert_eq!(m.base_url, DEFAULT_METADATA_URL);
    }
}
