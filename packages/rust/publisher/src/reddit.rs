//! Reddit client for a "script" type OAuth app.
//!
//! Logs in with the password grant, then submits self posts and sets their
//! link flair through the OAuth API host.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use releasebot_shared::{RedditConfig, ReleaseBotError, Result};

use crate::Publisher;

/// Timeout for every Reddit API request.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// `POST /api/v1/access_token`. Reddit answers bad credentials with a 200 and an `error` field.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// `{"json": {...}}` envelope returned by `api_type=json` endpoints.
#[derive(Debug, Deserialize)]
struct JsonEnvelope<T> {
    json: ApiJson<T>,
}

#[derive(Debug, Deserialize)]
struct ApiJson<T> {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

// ---------------------------------------------------------------------------
// RedditClient
// ---------------------------------------------------------------------------

/// Authenticated Reddit API client.
pub struct RedditClient {
    http: Client,
    api_url: String,
    token: String,
}

impl RedditClient {
    /// Obtain an access token for the configured script app and account.
    #[instrument(skip_all, fields(username = %config.username, client_id = %config.client_id))]
    pub async fn login(config: &RedditConfig) -> Result<Self> {
        let user_agent = format!(
            "releasebot/{} (by /u/{})",
            env!("CARGO_PKG_VERSION"),
            config.username
        );
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ReleaseBotError::Publish(format!("failed to build HTTP client: {e}")))?;

        let token_url = endpoint(&config.auth_url, "/api/v1/access_token");
        let response = http
            .post(&token_url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", config.username.as_str()),
                ("password", config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ReleaseBotError::Publish(format!("{token_url}: {e}")))?;

        let token: TokenResponse = read_json(response, &token_url).await?;
        let access_token = match (token.access_token, token.error) {
            (Some(access_token), None) => access_token,
            (_, Some(error)) => {
                return Err(ReleaseBotError::Publish(format!("login rejected: {error}")));
            }
            (None, None) => {
                return Err(ReleaseBotError::Publish(
                    "login response carried no access token".into(),
                ));
            }
        };

        info!("logged in to Reddit");
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: access_token,
        })
    }

    /// Submit a self (text) post and return its id (without the `t3_` prefix).
    pub async fn submit_self_post(&self, subreddit: &str, title: &str, text: &str) -> Result<String> {
        let url = endpoint(&self.api_url, "/api/submit");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .form(&[
                ("api_type", "json"),
                ("kind", "self"),
                ("sr", subreddit),
                ("title", title),
                ("text", text),
                ("sendreplies", "false"),
            ])
            .send()
            .await
            .map_err(|e| ReleaseBotError::Publish(format!("{url}: {e}")))?;

        let envelope: JsonEnvelope<SubmitData> = read_json(response, &url).await?;
        check_api_errors(&envelope.json.errors, "submit")?;

        let data = envelope
            .json
            .data
            .ok_or_else(|| ReleaseBotError::Publish("submit response carried no data".into()))?;

        debug!(id = %data.id, url = ?data.url, "submission created");
        Ok(data.id)
    }

    /// Set the link flair text of post `post_id`.
    pub async fn select_flair(&self, subreddit: &str, post_id: &str, text: &str) -> Result<()> {
        let url = endpoint(&self.api_url, &format!("/r/{subreddit}/api/selectflair"));
        let link = format!("t3_{post_id}");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .form(&[("api_type", "json"), ("link", link.as_str()), ("text", text)])
            .send()
            .await
            .map_err(|e| ReleaseBotError::Publish(format!("{url}: {e}")))?;

        let envelope: JsonEnvelope<serde_json::Value> = read_json(response, &url).await?;
        check_api_errors(&envelope.json.errors, "selectflair")
    }
}

/// Join an API base URL and a path.
fn endpoint(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

/// Fail on non-2xx, otherwise decode the JSON body.
async fn read_json<T: serde::de::DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ReleaseBotError::Publish(format!("{url}: HTTP {status}")));
    }

    response
        .json()
        .await
        .map_err(|e| ReleaseBotError::Publish(format!("{url}: unexpected response body: {e}")))
}

fn check_api_errors(errors: &[serde_json::Value], call: &str) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    Err(ReleaseBotError::Publish(format!(
        "{call} rejected: {}",
        rendered.join(", ")
    )))
}

// ---------------------------------------------------------------------------
// RedditPublisher
// ---------------------------------------------------------------------------

/// [`Publisher`] posting to one subreddit.
pub struct RedditPublisher {
    client: RedditClient,
    subreddit: String,
}

impl RedditPublisher {
    pub fn new(client: RedditClient, subreddit: impl Into<String>) -> Self {
        Self {
            client,
            subreddit: subreddit.into(),
        }
    }
}

impl Publisher for RedditPublisher {
    /// Submit, then flair. A flair failure is only logged: the post exists at
    /// that point and must count as published.
    async fn submit(&self, title: &str, body: &str, flair: &str) -> Result<String> {
        let id = self
            .client
            .submit_self_post(&self.subreddit, title, body)
            .await?;
        info!(%id, subreddit = %self.subreddit, "posted to Reddit");

        match self.client.select_flair(&self.subreddit, &id, flair).await {
            Ok(()) => debug!(%id, flair, "flair set"),
            Err(e) => warn!(%id, flair, error = %e, "failed to set flair"),
        }

        Ok(id)
    }
}
