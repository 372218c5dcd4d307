//! Application-only OAuth2 for the Reddit API.
//!
//! Reddit issues bearer tokens to script apps through the client credentials
//! grant. The token is cached until shortly before it expires and dropped
//! whenever the API answers 401.

use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    TokenResponse, TokenUrl,
};
use redscrape_core::{CoreError, RedditApiError};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const REDDIT_AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are refreshed this long before Reddit would reject them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CachedToken {
    secret: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Debug)]
pub struct AppOnlyAuth {
    oauth_client: BasicClient,
    http_client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl AppOnlyAuth {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        token_url: &str,
        http_client: Client,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTHORIZE_URL.to_string()).map_err(|e| {
            CoreError::Internal {
                message: format!("Invalid authorize URL: {}", e),
            }
        })?;
        let token_url = TokenUrl::new(token_url.to_string()).map_err(|e| CoreError::InvalidInput {
            message: format!("Invalid token URL {}: {}", token_url, e),
        })?;

        let oauth_client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::BasicAuth);

        Ok(Self {
            oauth_client,
            http_client,
            token: Mutex::new(None),
        })
    }

    /// Returns a valid bearer token, exchanging credentials when the cached
    /// one is missing or about to expire.
    pub async fn access_token(&self) -> Result<String, CoreError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.secret.clone());
        }

        debug!("Requesting application-only access token");
        let http_client = self.http_client.clone();
        let response = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(|request| send_token_request(http_client, request))
            .await
            .map_err(map_token_error)?;

        let token = cache_entry(&response);
        info!(
            "Obtained Reddit access token valid for {:?}",
            token.expires_at.saturating_duration_since(Instant::now())
        );
        let secret = token.secret.clone();
        *cached = Some(token);
        Ok(secret)
    }

    /// Forgets the cached token so the next call performs a fresh exchange.
    pub async fn invalidate(&self) {
        let mut cached = self.token.lock().await;
        if cached.take().is_some() {
            debug!("Discarded cached access token");
        }
    }
}

fn cache_entry(response: &BasicTokenResponse) -> CachedToken {
    let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
    CachedToken {
        secret: response.access_token().secret().clone(),
        expires_at: Instant::now() + lifetime,
    }
}

fn map_token_error(
    error: RequestTokenError<reqwest::Error, BasicErrorResponse>,
) -> CoreError {
    let reddit_error = match error {
        RequestTokenError::Request(e) if e.is_timeout() => RedditApiError::RequestTimeout,
        RequestTokenError::Request(e) => RedditApiError::AuthenticationFailed {
            reason: format!("token request failed: {}", e),
        },
        RequestTokenError::ServerResponse(response) => RedditApiError::AuthenticationFailed {
            reason: response.to_string(),
        },
        RequestTokenError::Parse(e, _) => RedditApiError::AuthenticationFailed {
            reason: format!("unreadable token response: {}", e),
        },
        RequestTokenError::Other(message) => RedditApiError::AuthenticationFailed { reason: message },
    };
    CoreError::RedditApi(reddit_error)
}

/// Sends the token request through the shared client so it carries the
/// configured user agent and timeout.
async fn send_token_request(
    http_client: Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let mut builder = http_client
        .request(request.method, request.url.as_str())
        .body(request.body);
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }

    let response = builder.send().await?;
    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
