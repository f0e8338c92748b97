//! OAuth access tokens for the Cloud Run API.
//!
//! On Cloud Run (or any GCE-backed runtime) the token comes from the
//! instance metadata server and is cached until shortly before it expires.
//! For local development a fixed token can be supplied instead.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::CloudError;

/// Default metadata server token endpoint.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Token response from the metadata server.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Source of bearer tokens for outbound API calls.
#[derive(Debug)]
pub struct AccessTokenProvider {
    source: TokenSource,
}

#[derive(Debug)]
enum TokenSource {
    /// A fixed token, never refreshed.
    Static(String),
    /// Tokens fetched from the instance metadata server.
    MetadataServer {
        client: reqwest::Client,
        url: String,
        cache: Mutex<Option<CachedToken>>,
    },
}

impl AccessTokenProvider {
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(token.into()),
        }
    }

    /// Metadata server provider at the default endpoint.
    pub fn metadata_server(client: reqwest::Client) -> Self {
        Self::metadata_server_at(client, METADATA_TOKEN_URL)
    }

    /// Metadata server provider at a custom endpoint.
    pub fn metadata_server_at(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            source: TokenSource::MetadataServer {
                client,
                url: url.into(),
                cache: Mutex::new(None),
            },
        }
    }

    /// Return a valid access token, fetching a fresh one when needed.
    pub async fn token(&self) -> Result<String, CloudError> {
        match &self.source {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::MetadataServer { client, url, cache } => {
                let mut cached = cache.lock().await;
                if let Some(token) = cached.as_ref() {
                    if Instant::now() < token.refresh_at {
                        return Ok(token.value.clone());
                    }
                }

                let fresh = fetch_metadata_token(client, url).await?;
                let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
                tracing::debug!(
                    expires_in = fresh.expires_in,
                    "Fetched access token from metadata server"
                );
                *cached = Some(CachedToken {
                    value: fresh.access_token.clone(),
                    refresh_at: Instant::now() + lifetime,
                });
                Ok(fresh.access_token)
            }
        }
    }
}

async fn fetch_metadata_token(
    client: &reqwest::Client,
    url: &str,
) -> Result<TokenResponse, CloudError> {
    let response = client
        .get(url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| CloudError::Token(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(CloudError::Token(format!(
            "metadata server returned {}: {body}",
            status.as_u16()
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| CloudError::Token(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    /// Fake metadata server handing out `token-1`, `token-2`, ... with a
    /// fixed `expires_in`. Requests without `Metadata-Flavor: Google` are
    /// refused the way the real server refuses them.
    struct FakeMetadata {
        expires_in: u64,
        hits: AtomicUsize,
    }

    async fn fake_token(
        State(server): State<Arc<FakeMetadata>>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, StatusCode> {
        if headers.get("metadata-flavor").and_then(|v| v.to_str().ok()) != Some("Google") {
            return Err(StatusCode::FORBIDDEN);
        }
        let n = server.hits.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Json(json!({
            "access_token": format!("token-{n}"),
            "expires_in": server.expires_in,
            "token_type": "Bearer",
        })))
    }

    async fn serve_metadata(expires_in: u64) -> (Arc<FakeMetadata>, String) {
        let server = Arc::new(FakeMetadata {
            expires_in,
            hits: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/token", get(fake_token))
            .with_state(Arc::clone(&server));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (server, format!("http://{addr}/token"))
    }

    #[tokio::test]
    async fn fixed_token_is_returned_as_is() {
        let provider = AccessTokenProvider::fixed("ya29.local");
        assert_eq!(provider.token().await.unwrap(), "ya29.local");
    }

    #[tokio::test]
    async fn unreachable_metadata_server_is_token_error() {
        let provider = AccessTokenProvider::metadata_server_at(
            reqwest::Client::new(),
            "http://127.0.0.1:9/token",
        );
        let err = provider.token().await.unwrap_err();
        assert!(matches!(err, CloudError::Token(_)));
    }

    #[tokio::test]
    async fn metadata_token_is_cached_until_near_expiry() {
        let (server, url) = serve_metadata(3599).await;
        let provider = AccessTokenProvider::metadata_server_at(reqwest::Client::new(), url);

        assert_eq!(provider.token().await.unwrap(), "token-1");
        assert_eq!(provider.token().await.unwrap(), "token-1");
        assert_eq!(server.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_inside_expiry_margin_is_refetched() {
        let (server, url) = serve_metadata(60).await;
        let provider = AccessTokenProvider::metadata_server_at(reqwest::Client::new(), url);

        assert_eq!(provider.token().await.unwrap(), "token-1");
        assert_eq!(provider.token().await.unwrap(), "token-2");
        assert_eq!(server.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn metadata_error_status_is_token_error() {
        let (server, url) = serve_metadata(3599).await;
        let missing = url.replace("/token", "/missing");
        let provider = AccessTokenProvider::metadata_server_at(reqwest::Client::new(), missing);

        let err = provider.token().await.unwrap_err();
        assert!(matches!(err, CloudError::Token(ref msg) if msg.contains("404")));
        assert_eq!(server.hits.load(Ordering::SeqCst), 0);
    }
}
