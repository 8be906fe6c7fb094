use crate::core::config::FetchConfig;
use crate::{MapError, Result};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;

/// Shared blocking HTTP client with a custom User-Agent so that tile servers
/// don't reject the request. Building the client once avoids the cost of TLS
/// and connection pool setup for every tile.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("mapstitch/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            Client::new()
        })
});

/// Anything that can turn a tile URL into response bytes.
///
/// Implemented by [`HttpTransport`] for real requests, and by any
/// `Fn(&str) -> Result<Vec<u8>>` closure for offline use.
pub trait TileTransport: Send + Sync {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

impl<F> TileTransport for F
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self(url)
    }
}

/// Synchronous HTTP(S) transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Transport on the shared client.
    pub fn new() -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
        }
    }

    /// Transport with the configured user agent and timeout.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| MapError::invalid(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TileTransport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| MapError::fetch(url, e))?;
        if !resp.status().is_success() {
            return Err(MapError::fetch(url, format!("HTTP {}", resp.status())));
        }
        let bytes = resp.bytes().map_err(|e| MapError::fetch(url, e))?;
        Ok(bytes.to_vec())
    }
}
