//! HTTP access to a WMTS service.
//!
//! Key features:
//! - Capabilities fetched and parsed once at connect time
//! - Exponential backoff retry on transient failures
//! - OWS exception bodies surfaced as service exceptions

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use wmts_common::{WmtsError, WmtsResult};
use wmts_protocol::{capabilities_url, parse_exception_report, Capabilities, Layer};

/// Anything that can GET raw bytes for a tile (or any other resource)
/// relative to a WMTS service.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// The service URL requests fall back to when capabilities carry no
    /// operation endpoints.
    fn service_url(&self) -> &str;

    async fn fetch_bytes(&self, url: &str) -> WmtsResult<Bytes>;
}

/// Configuration for the WMTS client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP request timeout
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,
    /// Initial retry delay (doubles each retry)
    pub initial_retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(10),
            user_agent: format!("wmts-viewer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A connected WMTS service.
pub struct WmtsClient {
    http: Client,
    config: ClientConfig,
    service_url: String,
    capabilities: Capabilities,
}

impl WmtsClient {
    /// Fetch and parse the service's capabilities.
    #[instrument(skip(config))]
    pub async fn connect(service_url: &str, config: ClientConfig) -> WmtsResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| WmtsError::RequestFailed(format!("failed to create HTTP client: {}", e)))?;

        let url = capabilities_url(service_url)?;
        let body = get_with_retry(&http, &config, &url).await?;
        let xml = String::from_utf8_lossy(&body);
        let capabilities = Capabilities::parse(&xml)?;

        info!(
            layers = capabilities.contents().len(),
            tile_matrix_sets = capabilities.tile_matrix_sets().len(),
            title = capabilities.service_title.as_deref().unwrap_or("-"),
            "Connected to WMTS service"
        );

        Ok(Self {
            http,
            config,
            service_url: service_url.to_string(),
            capabilities,
        })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Layers keyed by identifier.
    pub fn contents(&self) -> &BTreeMap<String, Layer> {
        self.capabilities.contents()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl TileSource for WmtsClient {
    fn service_url(&self) -> &str {
        &self.service_url
    }

    async fn fetch_bytes(&self, url: &str) -> WmtsResult<Bytes> {
        get_with_retry(&self.http, &self.config, url).await
    }
}

/// GET with exponential backoff on transient errors.
#[instrument(skip(http, config))]
pub async fn get_with_retry(http: &Client, config: &ClientConfig, url: &str) -> WmtsResult<Bytes> {
    let mut retry_count = 0;
    let mut delay = config.initial_retry_delay;

    loop {
        match get_once(http, url).await {
            Ok(body) => return Ok(body),
            Err(e) if e.is_transient() && retry_count < config.max_retries => {
                retry_count += 1;
                warn!(
                    error = %e,
                    retry = retry_count,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, config.max_retry_delay);
            }
            Err(e) => return Err(e),
        }
    }
}

async fn get_once(http: &Client, url: &str) -> WmtsResult<Bytes> {
    let response = http.get(url).send().await.map_err(map_reqwest_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;

    debug!(status = status.as_u16(), bytes = body.len(), "Response received");

    // Services answer errors with an XML report, sometimes even under 200
    if body.first() == Some(&b'<') {
        if let Some(ex) = parse_exception_report(&String::from_utf8_lossy(&body)) {
            return Err(ex.into());
        }
    }

    if !status.is_success() {
        return Err(WmtsError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(body)
}

fn map_reqwest_error(e: reqwest::Error) -> WmtsError {
    if e.is_timeout() {
        WmtsError::Timeout
    } else if e.is_connect() || e.is_body() {
        WmtsError::HttpError(e.to_string())
    } else {
        WmtsError::RequestFailed(e.to_string())
    }
}
