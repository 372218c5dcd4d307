use crate::auth::{AppOnlyAuth, REDDIT_TOKEN_URL};
use crate::models::{CommentThing, MoreChildrenResponse, PostListingResponse, ThreadResponse};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::retry::{RetryConfig, RetryExecutor};
use redscrape_core::config::AppConfig;
use redscrape_core::{CoreError, RedditApiError};
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Largest page Reddit serves for listings.
pub const LISTING_PAGE_SIZE: u32 = 100;
/// `/api/morechildren` accepts at most this many ids per call.
pub const MORE_CHILDREN_BATCH: usize = 100;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const SLOW_PERMIT_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub user_agent: String,
    pub timeout: Duration,
    pub api_base: String,
    pub token_url: String,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
}

impl ClientSettings {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(30),
            api_base: REDDIT_API_BASE.to_string(),
            token_url: REDDIT_TOKEN_URL.to_string(),
            rate_limit: RateLimitConfig::reddit_oauth(),
            retry: RetryConfig::reddit(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: config.request_timeout,
            ..Self::new(config.reddit_user_agent.clone())
        }
    }

    /// Points both the API and the token endpoint at `base`. Used against
    /// local mock servers.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.api_base = base.to_string();
        self.token_url = format!("{}/api/v1/access_token", base);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// What a request is about, so a 404 can name the missing thing.
#[derive(Debug, Clone)]
pub enum Resource {
    Subreddit(String),
    Post(String),
    Other(String),
}

impl Resource {
    fn not_found(&self) -> RedditApiError {
        match self {
            Resource::Subreddit(name) => RedditApiError::SubredditNotFound {
                subreddit: name.clone(),
            },
            Resource::Post(id) => RedditApiError::PostNotFound {
                post_id: id.clone(),
            },
            Resource::Other(endpoint) => RedditApiError::InvalidResponse {
                details: format!("{} not found", endpoint),
            },
        }
    }

    fn describe(&self) -> String {
        match self {
            Resource::Subreddit(name) => format!("r/{}", name),
            Resource::Post(id) => format!("post {}", id),
            Resource::Other(endpoint) => endpoint.clone(),
        }
    }
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    auth: AppOnlyAuth,
    rate_limiter: RateLimiter,
    retry: RetryExecutor,
    api_base: String,
}

impl RedditApiClient {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        settings: ClientSettings,
    ) -> Result<Self, CoreError> {
        // Reddit redirects unknown subreddits to search; keep the 3xx visible.
        let http_client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout)
            .redirect(Policy::none())
            .build()?;

        let auth = AppOnlyAuth::new(
            client_id,
            client_secret,
            &settings.token_url,
            http_client.clone(),
        )?;

        Ok(Self {
            http_client,
            auth,
            rate_limiter: RateLimiter::new(settings.rate_limit),
            retry: RetryExecutor::new(settings.retry),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        Self::new(
            &config.reddit_client_id,
            &config.reddit_client_secret,
            ClientSettings::from_config(config),
        )
    }

    /// GETs `endpoint` and decodes the JSON body, retrying transient failures.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        resource: &Resource,
    ) -> Result<T, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);
        let url = url.as_str();
        self.retry
            .execute(endpoint, move || self.send_once(url, params, resource))
            .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
        resource: &Resource,
    ) -> Result<T, CoreError> {
        let permit = self
            .rate_limiter
            .acquire_permit()
            .await
            .ok_or_else(|| CoreError::Internal {
                message: "rate limiter closed".to_string(),
            })?;
        if permit.queue_wait_time >= SLOW_PERMIT_WAIT {
            debug!("Waited {:?} for a request slot", permit.queue_wait_time);
        }
        let budget = self.rate_limiter.get_rate_limit_status().await;
        if budget.is_near_limit() {
            debug!(
                "Request budget {:.0}% used, {} of {} tokens left",
                budget.utilization_percentage(),
                budget.available_tokens,
                budget.max_tokens
            );
        }
        let token = self.auth.access_token().await?;

        debug!("GET {} {:?}", url, params);
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for {}: {}", url, e);
                transport_error(e)
            })?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await.map_err(transport_error)?;
            return serde_json::from_slice(&body).map_err(|e| {
                error!("Failed to parse response from {}: {}", url, e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("unexpected payload for {}: {}", resource.describe(), e),
                })
            });
        }

        warn!("Request failed with status {} for {}", status, url);
        if status == StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
        }
        Err(CoreError::RedditApi(status_error(
            status,
            response.headers(),
            resource,
        )))
    }

    /// One page of `/r/{subreddit}/new`, newest first.
    pub async fn fetch_new_page(
        &self,
        subreddit: &str,
        after: Option<&str>,
    ) -> Result<PostListingResponse, CoreError> {
        let endpoint = format!("/r/{}/new", subreddit);
        let mut params = vec![
            ("limit", LISTING_PAGE_SIZE.to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor.to_string()));
        }

        let listing: PostListingResponse = self
            .get_json(&endpoint, &params, &Resource::Subreddit(subreddit.to_string()))
            .await?;

        info!(
            "Retrieved {} posts from r/{} (after: {:?})",
            listing.data.children.len(),
            subreddit,
            after
        );
        Ok(listing)
    }

    /// A submission and its comment tree. `focus_comment` narrows the tree
    /// to one comment and its replies.
    pub async fn fetch_comments(
        &self,
        article: &str,
        focus_comment: Option<&str>,
    ) -> Result<ThreadResponse, CoreError> {
        let endpoint = format!("/comments/{}", article);
        let mut params = vec![("raw_json", "1".to_string())];
        if let Some(comment) = focus_comment {
            params.push(("comment", comment.to_string()));
        }

        self.get_json(&endpoint, &params, &Resource::Post(article.to_string()))
            .await
    }

    /// Expands up to [`MORE_CHILDREN_BATCH`] collapsed comment ids.
    pub async fn fetch_more_children(
        &self,
        link_id: &str,
        ids: &[String],
    ) -> Result<Vec<CommentThing>, CoreError> {
        let params = vec![
            ("api_type", "json".to_string()),
            ("link_id", link_id.to_string()),
            ("children", ids.join(",")),
            ("raw_json", "1".to_string()),
        ];

        let response: MoreChildrenResponse = self
            .get_json(
                "/api/morechildren",
                &params,
                &Resource::Other("/api/morechildren".to_string()),
            )
            .await?;

        if !response.json.errors.is_empty() {
            return Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("morechildren errors: {:?}", response.json.errors),
            }));
        }

        let things = response.json.data.map(|data| data.things).unwrap_or_default();
        debug!("Expanded {} of {} collapsed comments", things.len(), ids.len());
        Ok(things)
    }
}

fn transport_error(error: reqwest::Error) -> CoreError {
    if error.is_timeout() {
        CoreError::RedditApi(RedditApiError::RequestTimeout)
    } else {
        CoreError::Network(error)
    }
}

fn status_error(status: StatusCode, headers: &HeaderMap, resource: &Resource) -> RedditApiError {
    match status {
        StatusCode::UNAUTHORIZED => RedditApiError::InvalidToken,
        StatusCode::FORBIDDEN => RedditApiError::Forbidden {
            resource: resource.describe(),
        },
        StatusCode::NOT_FOUND => resource.not_found(),
        StatusCode::TOO_MANY_REQUESTS => RedditApiError::RateLimitExceeded {
            retry_after: retry_after_secs(headers),
        },
        s if s.is_redirection() => resource.not_found(),
        s if s.is_server_error() => RedditApiError::ServerError {
            status_code: s.as_u16(),
        },
        s => RedditApiError::InvalidResponse {
            details: format!("unexpected status {} for {}", s, resource.describe()),
        },
    }
}

/// Seconds to wait after a 429, from `Retry-After` or Reddit's own
/// `x-ratelimit-reset`.
fn retry_after_secs(headers: &HeaderMap) -> u64 {
    ["retry-after", "x-ratelimit-reset"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.trim().parse::<f64>().ok())
        .map(|secs| secs.ceil().max(0.0) as u64)
        .next()
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
