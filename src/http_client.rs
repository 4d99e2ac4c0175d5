//! HTTP transport for listing pages, descriptors and manifests.
//!
//! The engine only talks to the network through [`Transport`], so tests
//! (and embedders with their own HTTP stack) can swap it out.
//!
//! [`HttpTransport`] features:
//! - Connection pooling with keep-alive
//! - HTTP/2, TLS 1.3 via rustls
//! - Brotli, Zstd, Gzip compression (auto-negotiated)
//! - Charset-aware text decoding
//! - One lazily built client per proxy URL

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{ChannelError, Result};

const USER_AGENT: &str = concat!("retrokanal/", env!("CARGO_PKG_VERSION"));

/// Fetches raw resources. Any failure is a [`ChannelError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, optionally through `proxy`, sending `headers`.
    async fn fetch_bytes(
        &self,
        url: &str,
        proxy: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<u8>>;

    /// Fetch `url` as text. The default decodes the bytes as lossy UTF-8.
    async fn fetch_text(
        &self,
        url: &str,
        proxy: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<String> {
        let bytes = self.fetch_bytes(url, proxy, headers).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
    proxied: RwLock<HashMap<String, Client>>,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Self::build_client(None)?,
            proxied: RwLock::new(HashMap::new()),
        })
    }

    fn build_client(proxy: Option<&str>) -> Result<Client> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            // Keep connections alive for reuse across listing pages
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(proxy) = proxy {
            let proxy = Proxy::all(proxy).map_err(|e| ChannelError::Config(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(|e| ChannelError::Config(e.to_string()))
    }

    async fn client_for(&self, proxy: Option<&str>) -> Result<Client> {
        let Some(proxy) = proxy else {
            return Ok(self.client.clone());
        };

        if let Some(client) = self.proxied.read().await.get(proxy) {
            return Ok(client.clone());
        }

        let client = Self::build_client(Some(proxy))?;
        self.proxied
            .write()
            .await
            .insert(proxy.to_string(), client.clone());
        Ok(client)
    }

    async fn send(
        &self,
        url: &str,
        proxy: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<reqwest::Response> {
        let client = self.client_for(proxy).await?;
        let mut req = client.get(url);
        for (k, v) in headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ChannelError::transport(url, e))?;

        debug!(status = %resp.status(), version = ?resp.version(), "Response received");

        if !resp.status().is_success() {
            return Err(ChannelError::transport(url, resp.status()));
        }
        Ok(resp)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, headers), fields(url = %url))]
    async fn fetch_bytes(
        &self,
        url: &str,
        proxy: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<u8>> {
        let resp = self.send(url, proxy, headers).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ChannelError::transport(url, e))?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, headers), fields(url = %url))]
    async fn fetch_text(
        &self,
        url: &str,
        proxy: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<String> {
        let resp = self.send(url, proxy, headers).await?;
        resp.text()
            .await
            .map_err(|e| ChannelError::transport(url, e))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport for unit tests.

    use std::sync::Mutex;

    use super::*;

    /// Serves canned bodies by URL; unknown URLs fail like a 404.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        bodies: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<(String, HashMap<String, String>)>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.as_bytes().to_vec());
            self
        }

        /// URLs requested so far, in order.
        pub(crate) fn requested(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }

        /// Headers sent with the first request for `url`.
        pub(crate) fn headers_for(&self, url: &str) -> Option<HashMap<String, String>> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .find(|(u, _)| u == url)
                .map(|(_, h)| h.clone())
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn fetch_bytes(
            &self,
            url: &str,
            _proxy: Option<&str>,
            headers: &HashMap<String, String>,
        ) -> Result<Vec<u8>> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), headers.clone()));
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| ChannelError::transport(url, "404 Not Found"))
        }
    }
}
