//! X/Twitter platform implementation
//!
//! Reads go through the v2 API. The follow-relationship lookup uses the v1.1
//! `friendships/show` endpoint, which has no v2 equivalent. All requests are
//! signed with the user's OAuth 1.0a credentials.
//!
//! When the platform answers 429 the client sleeps until the advertised reset
//! time and retries, so callers simply see a slow call.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TwitterCredentials;
use crate::error::{PlatformError, Result};
use crate::platforms::oauth::OAuthSigner;
use crate::platforms::{
    posts_request_size, FollowOutcome, RelationshipCheck, SocialPlatform, LIKERS_PER_PAGE,
};
use crate::types::{Identity, Liker, LikerPage, PageCursor, PostId, UserId};

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RATE_LIMIT_WAITS: usize = 3;
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);

/// Platform client for X/Twitter
pub struct TwitterClient {
    client: reqwest::Client,
    signer: OAuthSigner,
    base_url: String,
    max_rate_limit_wait: Duration,
}

// Wire types

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default)]
    errors: Vec<ApiProblem>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    username: String,
    #[serde(default)]
    protected: bool,
    #[serde(default)]
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FriendshipResponse {
    relationship: Friendship,
}

#[derive(Debug, Deserialize)]
struct Friendship {
    source: FriendshipSide,
}

#[derive(Debug, Deserialize)]
struct FriendshipSide {
    following: bool,
}

#[derive(Debug, Serialize)]
struct FollowRequest<'a> {
    target_user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FollowData {
    following: bool,
    #[serde(default)]
    pending_follow: bool,
}

impl TwitterClient {
    pub fn new(credentials: TwitterCredentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("likefollow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            signer: OAuthSigner::new(credentials),
            base_url: DEFAULT_API_BASE.to_string(),
            max_rate_limit_wait: DEFAULT_RATE_LIMIT_WAIT,
        })
    }

    /// Point the client at a different API host (e.g. a local stub)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Cap how long a single rate-limit wait may last
    pub fn with_max_rate_limit_wait(mut self, wait: Duration) -> Self {
        self.max_rate_limit_wait = wait;
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> std::result::Result<T, PlatformError> {
        self.request(Method::GET, path, params, None::<&()>).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<T, PlatformError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    async fn request<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&B>,
    ) -> std::result::Result<T, PlatformError> {
        let url = format!("{}{}", self.base_url, path);
        let mut waits = 0;

        loop {
            // Fresh nonce and timestamp on every attempt
            let authorization = self.signer.authorization(method.as_str(), &url, params)?;
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header(AUTHORIZATION, authorization)
                .query(params);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(|e| PlatformError::Network(format!("{} {}: {}", method, path, e)))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && waits < MAX_RATE_LIMIT_WAITS {
                let wait = rate_limit_wait(
                    response.headers(),
                    chrono::Utc::now().timestamp(),
                    self.max_rate_limit_wait,
                );
                waits += 1;
                warn!(
                    "Rate limited on {}; waiting {}s before retry {}/{}",
                    path,
                    wait.as_secs(),
                    waits,
                    MAX_RATE_LIMIT_WAITS
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            let text = response
                .text()
                .await
                .map_err(|e| PlatformError::Network(format!("{} {}: {}", method, path, e)))?;

            if !status.is_success() {
                return Err(error_for_status(status.as_u16(), &text));
            }

            return serde_json::from_str(&text)
                .map_err(|e| PlatformError::Decode(format!("{}: {}", path, e)));
        }
    }
}

/// How long to wait after a 429, from the `x-rate-limit-reset` epoch header
fn rate_limit_wait(headers: &HeaderMap, now: i64, max: Duration) -> Duration {
    let reset = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok());

    match reset {
        Some(reset) => {
            let secs = (reset - now).max(0) as u64 + 1;
            Duration::from_secs(secs).min(max)
        }
        None => max,
    }
}

fn error_for_status(status: u16, body: &str) -> PlatformError {
    let message = truncate(body.trim(), 200);
    match status {
        401 => PlatformError::Authentication(message),
        429 => PlatformError::RateLimit(message),
        _ => PlatformError::Api { status, message },
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn describe_problems(problems: &[ApiProblem]) -> String {
    let parts: Vec<String> = problems
        .iter()
        .filter_map(|p| {
            p.detail
                .clone()
                .or_else(|| p.message.clone())
                .or_else(|| p.title.clone())
        })
        .collect();
    if parts.is_empty() {
        "no data in response".to_string()
    } else {
        parts.join("; ")
    }
}

fn identity_from(envelope: Envelope<ApiUser>) -> std::result::Result<Identity, PlatformError> {
    match envelope.data {
        Some(user) => Ok(Identity {
            id: UserId::new(user.id),
            handle: user.username,
        }),
        None => Err(PlatformError::Authentication(format!(
            "Could not resolve own user ID: {}",
            describe_problems(&envelope.errors)
        ))),
    }
}

fn posts_from(envelope: Envelope<Vec<ApiTweet>>, limit: usize) -> Vec<PostId> {
    envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .take(limit)
        .map(|tweet| PostId::new(tweet.id))
        .collect()
}

fn liker_page_from(envelope: Envelope<Vec<ApiUser>>) -> LikerPage {
    let likers = envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|user| Liker {
            id: UserId::new(user.id),
            handle: user.username,
            protected: user.protected,
            verified: user.verified,
        })
        .collect();
    let next = envelope
        .meta
        .and_then(|meta| meta.next_token)
        .filter(|token| !token.is_empty())
        .map(PageCursor::new);

    LikerPage { likers, next }
}

fn follow_outcome_from(envelope: Envelope<FollowData>) -> FollowOutcome {
    match envelope.data {
        Some(data) if data.following || data.pending_follow => FollowOutcome::Followed {
            pending: data.pending_follow && !data.following,
        },
        Some(_) => FollowOutcome::Failed(PlatformError::Api {
            status: 200,
            message: "follow was not applied".to_string(),
        }),
        None => FollowOutcome::Failed(PlatformError::Api {
            status: 200,
            message: describe_problems(&envelope.errors),
        }),
    }
}

#[async_trait]
impl SocialPlatform for TwitterClient {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn resolve_identity(&self) -> Result<Identity> {
        let envelope: Envelope<ApiUser> =
            self.get("/2/users/me", &[]).await.map_err(|e| match e {
                // Missing read permission on the app surfaces as 403 here
                PlatformError::Api { status: 403, message } => {
                    PlatformError::Authentication(message)
                }
                other => other,
            })?;
        let identity = identity_from(envelope)?;
        debug!("Resolved identity @{} ({})", identity.handle, identity.id);
        Ok(identity)
    }

    async fn recent_posts(&self, owner: &UserId, limit: usize) -> Result<Vec<PostId>> {
        let max_results = posts_request_size(limit).to_string();
        let path = format!("/2/users/{}/tweets", owner);
        let envelope: Envelope<Vec<ApiTweet>> = self
            .get(
                &path,
                &[
                    ("max_results", max_results.as_str()),
                    ("exclude", "replies,retweets"),
                    ("tweet.fields", "id"),
                ],
            )
            .await?;

        Ok(posts_from(envelope, limit))
    }

    async fn likers_page(
        &self,
        post: &PostId,
        cursor: Option<&PageCursor>,
    ) -> Result<LikerPage> {
        let max_results = LIKERS_PER_PAGE.to_string();
        let path = format!("/2/tweets/{}/liking_users", post);
        let mut params = vec![
            ("max_results", max_results.as_str()),
            ("user.fields", "id,username,protected,verified"),
        ];
        if let Some(cursor) = cursor {
            params.push(("pagination_token", cursor.as_str()));
        }

        let envelope: Envelope<Vec<ApiUser>> = self.get(&path, &params).await?;
        Ok(liker_page_from(envelope))
    }

    async fn relationship(&self, source: &UserId, target: &UserId) -> RelationshipCheck {
        let result: std::result::Result<FriendshipResponse, _> = self
            .get(
                "/1.1/friendships/show.json",
                &[("source_id", source.as_str()), ("target_id", target.as_str())],
            )
            .await;

        match result {
            Ok(response) if response.relationship.source.following => RelationshipCheck::Following,
            Ok(_) => RelationshipCheck::NotFollowing,
            Err(e) => RelationshipCheck::Unknown(e),
        }
    }

    async fn follow(&self, source: &UserId, target: &UserId) -> FollowOutcome {
        let path = format!("/2/users/{}/following", source);
        let body = FollowRequest {
            target_user_id: target.as_str(),
        };

        match self.post::<Envelope<FollowData>, _>(&path, &body).await {
            Ok(envelope) => follow_outcome_from(envelope),
            Err(e) => FollowOutcome::Failed(e),
        }
    }
}
