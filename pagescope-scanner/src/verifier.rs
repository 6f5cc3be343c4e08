use crate::error::{Result, ScanError};
use crate::result::{
    CONNECTION_REFUSED_LABEL, DNS_FAILURE_LABEL, GENERIC_NETWORK_LABEL, LinkCategory, LinkStatus,
    TIMEOUT_LABEL, TOO_MANY_REDIRECTS_LABEL, VerificationOutcome,
};
use futures::future::join_all;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Fixed configuration shared by every check in an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub timeout_secs: u64,
    /// Only the status line matters; stop reading the body after this many bytes.
    pub max_body_bytes: usize,
    pub max_redirects: usize,
    /// Maximum number of checks in flight for one call to `verify_all`.
    pub concurrency: usize,
    pub user_agent: String,
    pub headers: BTreeMap<String, String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        );
        headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());

        Self {
            timeout_secs: 10,
            max_body_bytes: 2048,
            max_redirects: 5,
            concurrency: 16,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers,
        }
    }
}

impl VerifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Why a check did not end in an accepted status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// A response arrived but its status is outside the accepted window.
    Rejected(u16),
    Timeout,
    DnsResolution,
    ConnectionRefused,
    /// Reset, aborted, EOF and other low-level socket trouble.
    Network,
    TooManyRedirects,
    /// A transport fault we have no dedicated label for.
    Transport(String),
    /// The request was never sent.
    Setup(String),
}

impl Fault {
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_builder() {
            return Fault::Setup(error_chain(error));
        }
        if error.is_timeout() {
            return Fault::Timeout;
        }
        if error.is_redirect() {
            return Fault::TooManyRedirects;
        }
        if let Some(status) = error.status() {
            return Fault::Rejected(status.as_u16());
        }
        if is_dns_failure(error) {
            return Fault::DnsResolution;
        }
        if let Some(kind) = io_error_kind(error) {
            match kind {
                io::ErrorKind::TimedOut => return Fault::Timeout,
                io::ErrorKind::ConnectionRefused => return Fault::ConnectionRefused,
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
                | io::ErrorKind::AddrNotAvailable => return Fault::Network,
                _ => {}
            }
        }
        if error.is_connect() || error.is_body() || is_closed_early(error) {
            return Fault::Network;
        }
        Fault::Transport(error_chain(error))
    }
}

/// Statuses in [200, 500) complete the transaction; everything else is a
/// rejected response that still carries its status.
pub fn accept_status(status: u16) -> std::result::Result<u16, Fault> {
    if (200..500).contains(&status) {
        Ok(status)
    } else {
        Err(Fault::Rejected(status))
    }
}

/// The one place a status code is mapped to a category, whichever path it
/// arrived through.
pub fn categorize_status(status: u16) -> LinkCategory {
    match status {
        200..=399 => LinkCategory::Reachable,
        400..=499 => LinkCategory::ClientError,
        500.. => LinkCategory::ServerError,
        _ => LinkCategory::UnknownError,
    }
}

pub fn classify(settled: std::result::Result<u16, Fault>) -> (LinkStatus, LinkCategory) {
    match settled {
        Ok(status) | Err(Fault::Rejected(status)) => {
            (LinkStatus::Code(status), categorize_status(status))
        }
        Err(Fault::Timeout) => (LinkStatus::label(TIMEOUT_LABEL), LinkCategory::NetworkIssue),
        Err(Fault::DnsResolution) => {
            (LinkStatus::label(DNS_FAILURE_LABEL), LinkCategory::NetworkIssue)
        }
        Err(Fault::ConnectionRefused) => (
            LinkStatus::label(CONNECTION_REFUSED_LABEL),
            LinkCategory::NetworkIssue,
        ),
        Err(Fault::Network) => (
            LinkStatus::label(GENERIC_NETWORK_LABEL),
            LinkCategory::NetworkIssue,
        ),
        Err(Fault::TooManyRedirects) => (
            LinkStatus::label(TOO_MANY_REDIRECTS_LABEL),
            LinkCategory::NetworkIssue,
        ),
        Err(Fault::Transport(message)) => (LinkStatus::Label(message), LinkCategory::NetworkIssue),
        Err(Fault::Setup(message)) => (LinkStatus::Label(message), LinkCategory::RequestSetupError),
    }
}

fn is_dns_failure(error: &reqwest::Error) -> bool {
    let chain = error_chain(error).to_lowercase();
    chain.contains("dns error") || chain.contains("failed to lookup address")
}

/// The peer hung up before a complete response arrived.
fn is_closed_early(error: &reqwest::Error) -> bool {
    let chain = error_chain(error).to_lowercase();
    chain.contains("connection closed before message completed")
        || chain.contains("incomplete message")
        || chain.contains("operation was canceled")
}

fn io_error_kind(error: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = err.source();
    }
    None
}

fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}

/// Checks link reachability over one shared client. The client (and its
/// keep-alive pool) is built once and never reconfigured afterwards.
#[derive(Debug, Clone)]
pub struct LinkVerifier {
    client: Client,
    config: Arc<VerifierConfig>,
}

impl LinkVerifier {
    pub fn new(config: VerifierConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ScanError::InvalidHeader(format!("{}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ScanError::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .pool_max_idle_per_host(config.concurrency.max(1))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// One outcome per target, in target order. Every check settles on its
    /// own; a failing or panicking check never cancels the others. Dropping
    /// the returned future cancels every check still queued or in flight.
    pub async fn verify_all(&self, targets: Vec<String>) -> Vec<VerificationOutcome> {
        if targets.is_empty() {
            return Vec::new();
        }

        let concurrency = self.config.concurrency.max(1);
        info!(
            "Verifying {} unique link(s), at most {} at a time",
            targets.len(),
            concurrency
        );
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(concurrency));

        let handles: Vec<JoinHandle<VerificationOutcome>> = targets
            .iter()
            .cloned()
            .map(|url| {
                let client = self.client.clone();
                let semaphore = semaphore.clone();
                let max_body_bytes = self.config.max_body_bytes;
                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.ok();
                    verify_one(&client, url, max_body_bytes).await
                })
            })
            .collect();
        let _abort = AbortOnDrop(handles.iter().map(JoinHandle::abort_handle).collect());
        let settled = join_all(handles).await;

        let outcomes: Vec<VerificationOutcome> = targets
            .into_iter()
            .zip(settled)
            .map(|(url, joined)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Verification task for {} failed: {}", url, e);
                    VerificationOutcome::new(
                        url,
                        LinkStatus::Label(e.to_string()),
                        LinkCategory::UnknownError,
                    )
                }
            })
            .collect();

        let broken = outcomes.iter().filter(|o| o.is_broken()).count();
        info!(
            "Verified {} link(s) in {:?}, {} broken",
            outcomes.len(),
            start.elapsed(),
            broken
        );
        outcomes
    }

    pub async fn verify(&self, url: &str) -> VerificationOutcome {
        verify_one(&self.client, url.to_string(), self.config.max_body_bytes).await
    }
}

/// Aborts every spawned check when `verify_all` is dropped before it settles.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

async fn verify_one(client: &Client, url: String, max_body_bytes: usize) -> VerificationOutcome {
    debug!("Checking {}", url);
    let settled = match client.get(&url).send().await {
        Ok(response) => {
            let status = drain_capped(response, max_body_bytes).await;
            accept_status(status)
        }
        Err(e) => {
            debug!("Request to {} failed: {}", url, e);
            Err(Fault::from_reqwest(&e))
        }
    };

    let (status, category) = classify(settled);
    debug!("{} -> {} ({})", url, status, category);
    VerificationOutcome::new(url, status, category)
}

/// Reads at most `max_bytes` of the body, then drops the response. A body
/// error after the status line arrived does not change the verdict.
async fn drain_capped(mut response: reqwest::Response, max_bytes: usize) -> u16 {
    let status = response.status().as_u16();
    let mut read = 0usize;
    while read < max_bytes {
        match response.chunk().await {
            Ok(Some(chunk)) => read += chunk.len(),
            Ok(None) => break,
            Err(e) => {
                debug!("Body read for {} stopped early: {}", response.url(), e);
                break;
            }
        }
    }
    status
}
