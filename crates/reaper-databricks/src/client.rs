use async_trait::async_trait;
use reaper_core::{ApiResponse, ControllerConfig, Credential, ManagementApi, ReaperError, Result};
use tracing::debug;
use url::Url;

const CATALOGS_PATH: &[&str] = &["api", "2.1", "unity-catalog", "catalogs"];
const WAREHOUSES_PATH: &[&str] = &["api", "2.0", "sql", "warehouses"];

/// Databricks workspace client for the two destructive calls the reaper
/// needs.
pub struct DatabricksClient {
    http: reqwest::Client,
    base_url: Url,
    token: Credential,
}

impl DatabricksClient {
    pub fn new(config: &ControllerConfig) -> Result<Self> {
        let base_url = parse_host(&config.host)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ReaperError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token: config.credential.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, prefix: &[&str], last: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ReaperError::config(format!("invalid host URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(prefix)
            .push(last);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(self.token.expose())
            .header("Accept", "application/json")
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<ApiResponse> {
        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ReaperError::transport(format!("request timed out: {e}"))
            } else {
                ReaperError::transport(format!("failed to connect to workspace: {e}"))
            }
        })?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl ManagementApi for DatabricksClient {
    async fn delete_catalog(&self, name: &str, force: bool) -> Result<ApiResponse> {
        let url = self.endpoint(CATALOGS_PATH, name)?;
        debug!(url = %url, force, "DELETE catalog");
        let req = self
            .request(reqwest::Method::DELETE, url)
            .query(&[("force", force)]);
        self.send(req).await
    }

    async fn delete_warehouse(&self, id: &str) -> Result<ApiResponse> {
        let url = self.endpoint(WAREHOUSES_PATH, id)?;
        debug!(url = %url, "DELETE warehouse");
        self.send(self.request(reqwest::Method::DELETE, url)).await
    }
}

/// Accept `adb-1.azuredatabricks.net` as well as full URLs; bare hosts get
/// `https://`.
fn parse_host(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(ReaperError::config("Databricks host must not be empty"));
    }
    let full = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    Url::parse(&full).map_err(|e| ReaperError::config(format!("invalid Databricks host \"{host}\": {e}")))
}
