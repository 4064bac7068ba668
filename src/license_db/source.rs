use std::path::PathBuf;

use async_trait::async_trait;

use super::table::LicenseTable;
use super::LicenseDbError;

/// Where the license table comes from. `Ok(None)` means the source does not
/// exist, which is an expected state rather than an error.
#[async_trait]
pub trait LicenseSource: Send + Sync {
    async fn load(&self) -> Result<Option<LicenseTable>, LicenseDbError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// Table stored as a local JSON file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LicenseSource for FileSource {
    async fn load(&self) -> Result<Option<LicenseTable>, LicenseDbError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LicenseDbError::Read(
                    self.path.display().to_string(),
                    e.to_string(),
                ))
            }
        };
        LicenseTable::from_json(&json).map(Some)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Table served over HTTP. A 404 is reported as an absent source.
pub struct HttpSource {
    url: String,
    version: Option<String>,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            version: None,
            client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured client (proxies, timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Append `?v=<version>` so intermediaries never serve a stale table.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }
}

#[async_trait]
impl LicenseSource for HttpSource {
    async fn load(&self) -> Result<Option<LicenseTable>, LicenseDbError> {
        let mut request = self
            .client
            .get(&self.url)
            .header(reqwest::header::CACHE_CONTROL, "no-store");
        if let Some(version) = &self.version {
            request = request.query(&[("v", version)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LicenseDbError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        LicenseTable::from_json(&body).map(Some)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer one request with `status` and `body`; the task yields the raw
    /// request head.
    async fn serve_once(status: u16, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/db/license_to_actives.json", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&head).to_lowercase()
        });

        (url, server)
    }

    fn http_source(url: &str) -> HttpSource {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpSource::new(url).with_client(client)
    }

    #[tokio::test]
    async fn http_source_reads_table_without_caching() {
        let (url, server) = serve_once(200, r#"{"012345": ["aspirin"]}"#).await;

        let table = http_source(&url).with_version("7").load().await.unwrap().unwrap();
        assert_eq!(table.len(), 1);

        let request = server.await.unwrap();
        assert!(request.starts_with("get /db/license_to_actives.json?v=7 "));
        assert!(request.contains("cache-control: no-store"));
    }

    #[tokio::test]
    async fn http_source_not_found_is_absent() {
        let (url, server) = serve_once(404, "").await;
        assert!(http_source(&url).load().await.unwrap().is_none());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn http_source_server_error_is_failure() {
        let (url, server) = serve_once(500, "oops").await;
        assert!(matches!(
            http_source(&url).load().await,
            Err(LicenseDbError::Status(500))
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn file_source_missing_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("license_to_actives.json"));
        assert!(source.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_source_reads_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license_to_actives.json");
        std::fs::write(&path, r#"{"012345": ["aspirin"]}"#).unwrap();

        let table = FileSource::new(&path).load().await.unwrap().unwrap();
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn file_source_bad_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license_to_actives.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            FileSource::new(&path).load().await,
            Err(LicenseDbError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn file_source_directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FileSource::new(dir.path()).load().await,
            Err(LicenseDbError::Read(_, _))
        ));
    }
}
