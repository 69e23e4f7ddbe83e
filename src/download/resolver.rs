//! Remote resolver — exchanges a Streamtape link for a direct download URL.
//!
//! The Streamtape API hands out links in two steps:
//!   `GET /file/dlticket?file=<id>&login=<user>&key=<pass>` → ticket + wait_time
//!   (wait `wait_time` seconds)
//!   `GET /file/dl?file=<id>&ticket=<ticket>` → direct URL
//!
//! Direct URLs are short-lived and single-use, so nothing here is cached.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::core::config::{self, ResolverCredentials};
use crate::core::validation::SourceLink;
use crate::download::error::ResolveError;

/// A direct, time-limited download URL for one request.
#[derive(Debug, Clone)]
pub struct ResolvedDownload {
    pub direct_url: Url,
    /// File name reported by the provider, if any
    pub name: Option<String>,
    /// Size reported by the provider; informational only
    pub reported_size: Option<u64>,
}

/// Turns a validated source link into a fetchable URL.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, link: &SourceLink) -> Result<ResolvedDownload, ResolveError>;
}

/// Envelope every Streamtape API response is wrapped in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: u16,
    #[serde(default)]
    msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TicketResult {
    ticket: String,
    #[serde(default)]
    wait_time: u64,
}

#[derive(Debug, Deserialize)]
struct LinkResult {
    url: String,
    name: Option<String>,
    size: Option<u64>,
}

/// Production resolver backed by the Streamtape HTTP API.
pub struct StreamtapeResolver {
    client: Client,
    credentials: ResolverCredentials,
    wait_cap: Duration,
}

impl StreamtapeResolver {
    pub fn new(credentials: ResolverCredentials) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .user_agent(concat!("tapebot/", env!("CARGO_PKG_VERSION")))
            .timeout(config::resolver::timeout())
            .build()
            .map_err(ResolveError::transport)?;

        Ok(Self {
            client,
            credentials,
            wait_cap: config::resolver::ticket_wait_cap(),
        })
    }

    /// Overrides the cap on the ticket wait (tests use zero).
    pub fn with_wait_cap(mut self, wait_cap: Duration) -> Self {
        self.wait_cap = wait_cap;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, ResolveError> {
        self.credentials
            .base_url
            .join(path)
            .map_err(|e| ResolveError::Malformed(format!("bad resolver base URL: {}", e)))
    }

    async fn call<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ResolveError> {
        let url = self.endpoint(path)?;
        let response: ApiResponse<T> = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(ResolveError::transport)?
            .json()
            .await
            .map_err(ResolveError::transport)?;

        if response.status != 200 {
            return Err(ResolveError::Rejected {
                status: response.status,
                msg: response.msg,
            });
        }

        response
            .result
            .ok_or_else(|| ResolveError::Malformed(format!("{} returned no result", path)))
    }
}

#[async_trait]
impl LinkResolver for StreamtapeResolver {
    async fn resolve(&self, link: &SourceLink) -> Result<ResolvedDownload, ResolveError> {
        let file = link.video_id();
        log::info!("Resolving Streamtape file {}", file);

        let ticket: TicketResult = self
            .call(
                "file/dlticket",
                &[
                    ("file", file),
                    ("login", self.credentials.username.as_str()),
                    ("key", self.credentials.password.expose_secret()),
                ],
            )
            .await?;

        let wait = Duration::from_secs(ticket.wait_time).min(self.wait_cap);
        if !wait.is_zero() {
            log::debug!("Waiting {:?} before redeeming ticket for {}", wait, file);
            tokio::time::sleep(wait).await;
        }

        let link_result: LinkResult = self
            .call("file/dl", &[("file", file), ("ticket", ticket.ticket.as_str())])
            .await?;

        let direct_url = Url::parse(&link_result.url)
            .map_err(|e| ResolveError::Malformed(format!("invalid direct URL {:?}: {}", link_result.url, e)))?;

        log::info!(
            "Resolved {} → {} ({:?} bytes reported)",
            file,
            direct_url.host_str().unwrap_or("?"),
            link_result.size
        );

        Ok(ResolvedDownload {
            direct_url,
            name: link_result.name,
            reported_size: link_result.size,
        })
    }
}
