use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{Value, json};

use crate::{
    api::{context::ApiContext, envelope::unwrap_envelope},
    error::{CoreError, Result},
    types::SessionData,
};

pub const METHOD_SESSION_DETAILS: &str = "surgical_training.api.session.get_session_details";
pub const METHOD_ADD_COMMENT: &str = "surgical_training.api.comment.add_comment";
pub const METHOD_UPDATE_COMMENT: &str = "surgical_training.api.comment.update_comment";
pub const METHOD_DELETE_COMMENT: &str = "surgical_training.api.comment.delete_comment";

/// Reads are idempotent and may retry; mutations never do.
const READ_RETRY_ATTEMPTS: u32 = 3;
const READ_RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Payload for a new comment submission.
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub video_title: String,
    pub timestamp: f64,
    pub comment_text: String,
    pub duration: Option<f64>,
    pub comment_type: Option<String>,
}

/// The session/comment surface of the platform API. The controller depends
/// on this trait, not on a concrete transport, so tests drive it with an
/// in-memory fake.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn get_session_details(&self, session_name: &str) -> Result<SessionData>;
    async fn add_comment(&self, session_name: &str, comment: &NewComment) -> Result<()>;
    async fn update_comment_text(&self, comment_name: &str, comment_text: &str) -> Result<()>;
    async fn update_comment_duration(&self, comment_name: &str, duration: f64) -> Result<()>;
    async fn delete_comment(&self, comment_name: &str) -> Result<()>;
}

/// reqwest-backed [`SessionApi`] against a live deployment.
pub struct PlatformClient {
    context: ApiContext,
    http: reqwest::Client,
}

impl PlatformClient {
    pub fn new(context: ApiContext) -> Self {
        Self {
            context,
            http: reqwest::Client::new(),
        }
    }

    pub fn context(&self) -> &ApiContext {
        &self.context
    }

    async fn call(&self, method: &'static str, payload: Value) -> Result<Value> {
        let mut request = self
            .http
            .post(self.context.method_url(method))
            .header("Accept", "application/json")
            .json(&payload);
        if let Some(token) = self.context.api_token() {
            request = request.header("Authorization", format!("token {token}"));
        }

        let body = request.send().await?.json::<Value>().await?;
        unwrap_envelope(method, body)
    }
}

#[async_trait]
impl SessionApi for PlatformClient {
    async fn get_session_details(&self, session_name: &str) -> Result<SessionData> {
        let payload = json!({ "session_name": session_name });

        let mut delay = READ_RETRY_BASE_DELAY;
        let mut last_error = None;
        for attempt in 1..=READ_RETRY_ATTEMPTS {
            match self.call(METHOD_SESSION_DETAILS, payload.clone()).await {
                Ok(data) => return Ok(serde_json::from_value(data)?),
                // Transport failures are worth retrying; API-level rejections
                // (bad session, no access) are not.
                Err(CoreError::HttpError(err)) => {
                    warn!("session fetch attempt {attempt}/{READ_RETRY_ATTEMPTS} failed: {err}");
                    last_error = Some(CoreError::HttpError(err));
                    if attempt < READ_RETRY_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Err(last_error.unwrap_or(CoreError::Api {
            method: METHOD_SESSION_DETAILS,
            reason: "retries exhausted".to_string(),
        }))
    }

    async fn add_comment(&self, session_name: &str, comment: &NewComment) -> Result<()> {
        let mut payload = json!({
            "session": session_name,
            "video_title": comment.video_title,
            "timestamp": comment.timestamp,
            "comment_text": comment.comment_text,
        });
        if let Some(duration) = comment.duration {
            payload["duration"] = json!(duration);
        }
        if let Some(comment_type) = &comment.comment_type {
            payload["comment_type"] = json!(comment_type);
        }

        debug!(
            "adding comment to {:?} at {:.2}s",
            comment.video_title, comment.timestamp
        );
        self.call(METHOD_ADD_COMMENT, payload).await.map(|_| ())
    }

    async fn update_comment_text(&self, comment_name: &str, comment_text: &str) -> Result<()> {
        let payload = json!({
            "comment_name": comment_name,
            "comment_text": comment_text,
        });
        self.call(METHOD_UPDATE_COMMENT, payload).await.map(|_| ())
    }

    async fn update_comment_duration(&self, comment_name: &str, duration: f64) -> Result<()> {
        let payload = json!({
            "comment_name": comment_name,
            "duration": duration,
        });
        self.call(METHOD_UPDATE_COMMENT, payload).await.map(|_| ())
    }

    async fn delete_comment(&self, comment_name: &str) -> Result<()> {
        let payload = json!({ "comment_name": comment_name });
        self.call(METHOD_DELETE_COMMENT, payload).await.map(|_| ())
    }
}
