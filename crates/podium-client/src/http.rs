//! HTTP debate backend

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use podium_core::{ArgumentKind, DebateConfig, ScoreResult};

use crate::backend::{
    BackendError, ByteStream, DebateBackend, DebateRecord, Feedback, UserStats,
};
use crate::config::ClientConfig;

/// Debate creation request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateRequest<'a> {
    title: &'a str,
    topic: &'a str,
    ai_stance: &'a str,
    /// Whole minutes
    duration: u32,
    difficulty: &'static str,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ArgumentBody<'a> {
    content: &'a str,
    #[serde(rename = "type")]
    kind: ArgumentKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum DebateUpdate<'a> {
    UserArgument(ArgumentBody<'a>),
    AiArgument(ArgumentBody<'a>),
}

#[derive(Debug, Serialize)]
struct RespondRequest<'a> {
    content: &'a str,
}

/// Error body returned by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Some endpoints wrap their payload in `{ "data": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

/// Debate backend reached over HTTP
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
    request_timeout: std::time::Duration,
}

impl HttpBackend {
    /// Create a backend client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        config
            .validate()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            session_cookie: config.session_cookie.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// Create against a backend root with default settings
    pub fn with_url(api_url: &str) -> Result<Self, BackendError> {
        Self::new(&ClientConfig::default().with_api_url(api_url))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.session_cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    /// Send a call whose whole response is awaited
    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        check_status(response).await
    }

    /// Send a call whose body is consumed as a stream; no overall timeout
    async fn send_streaming(&self, builder: RequestBuilder) -> Result<ByteStream, BackendError> {
        let response = builder
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        let response = check_status(response).await?;

        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| BackendError::StreamInterrupted(e.to_string()))
        });
        Ok(stream.boxed())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(envelope.into_inner())
    }

    async fn update_debate(
        &self,
        debate_id: &str,
        update: DebateUpdate<'_>,
    ) -> Result<(), BackendError> {
        let path = format!("/debates/{debate_id}");
        self.send(self.request(Method::PATCH, &path).json(&update))
            .await?;
        Ok(())
    }
}

/// Turn a non-success response into an error carrying the backend's message
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                body
            }
        });

    warn!(status = status.as_u16(), %message, "Backend call failed");
    Err(BackendError::RequestFailed {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DebateBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn initiate(&self, config: &DebateConfig) -> Result<ByteStream, BackendError> {
        debug!(topic = %config.topic, "Initiating debate");
        let body = InitiateRequest {
            title: &config.title,
            topic: &config.topic,
            ai_stance: &config.ai_stance,
            duration: config.duration_minutes(),
            difficulty: "intermediate",
            tags: Vec::new(),
        };
        self.send_streaming(self.request(Method::POST, "/debates/initiate").json(&body))
            .await
    }

    async fn submit_argument(&self, debate_id: &str, content: &str) -> Result<(), BackendError> {
        self.update_debate(
            debate_id,
            DebateUpdate::UserArgument(ArgumentBody {
                content,
                kind: ArgumentKind::Rebuttal,
            }),
        )
        .await
    }

    async fn save_ai_argument(
        &self,
        debate_id: &str,
        content: &str,
        kind: ArgumentKind,
    ) -> Result<(), BackendError> {
        self.update_debate(
            debate_id,
            DebateUpdate::AiArgument(ArgumentBody { content, kind }),
        )
        .await
    }

    async fn respond(&self, debate_id: &str, content: &str) -> Result<ByteStream, BackendError> {
        let path = format!("/debates/{debate_id}/respond");
        self.send_streaming(
            self.request(Method::POST, &path)
                .json(&RespondRequest { content }),
        )
        .await
    }

    async fn complete(&self, debate_id: &str) -> Result<(), BackendError> {
        let path = format!("/debates/{debate_id}/complete");
        self.send(self.request(Method::POST, &path)).await?;
        Ok(())
    }

    async fn get_scores(&self, debate_id: &str) -> Result<ScoreResult, BackendError> {
        self.get_json(&format!("/debates/{debate_id}/scores")).await
    }

    async fn get_debate(&self, debate_id: &str) -> Result<DebateRecord, BackendError> {
        self.get_json(&format!("/debates/{debate_id}")).await
    }

    async fn get_feedback(&self, debate_id: &str) -> Result<Feedback, BackendError> {
        self.get_json(&format!("/debates/{debate_id}/feedback")).await
    }

    async fn get_user_stats(&self) -> Result<UserStats, BackendError> {
        self.get_json("/debates/stats").await
    }
}
