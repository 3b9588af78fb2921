mod config;
pub mod wire;

use async_trait::async_trait;
use edusync_core::model::{Assessment, AssessmentId, AssessmentResult, SubmittedAnswer};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::gateway::{AssessmentGateway, GatewayError};

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, HttpGatewayConfig, RetryPolicy,
};
use wire::{AssessmentRecord, ErrorBody, SubmissionRecord};

/// `AssessmentGateway` over the EduSync REST API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: HttpGatewayConfig,
    bearer_token: Option<String>,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.bearer_token.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// # Errors
    ///
    /// Returns `GatewayError::Network` if the HTTP client cannot be built.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self {
            client,
            config,
            bearer_token: None,
        })
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    #[must_use]
    pub fn config(&self) -> &HttpGatewayConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/json");
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_once(&self, id: &AssessmentId) -> Result<Assessment, GatewayError> {
        let segment = id.to_string();
        let url = self.config.endpoint(["Assessments", segment.as_str()])?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let record: AssessmentRecord = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(record.into_assessment()?)
    }
}

#[async_trait]
impl AssessmentGateway for HttpGateway {
    async fn fetch_assessment(&self, id: &AssessmentId) -> Result<Assessment, GatewayError> {
        let retry = self.config.retry;
        let mut attempt = 0;
        loop {
            match self.fetch_once(id).await {
                Err(err) if err.is_retryable() && attempt < retry.max_retries => {
                    attempt += 1;
                    let delay = retry.delay_for(attempt);
                    warn!(assessment_id = %id, attempt, ?delay, error = %err, "retrying assessment fetch");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    // Not retried: a replayed POST could record a second attempt.
    async fn submit_assessment(
        &self,
        id: &AssessmentId,
        answers: &[SubmittedAnswer],
    ) -> Result<AssessmentResult, GatewayError> {
        let url = self.config.endpoint(["Results", "results"])?;
        let body = SubmissionRecord {
            assessment_id: id,
            answers,
        };
        debug!(assessment_id = %id, answered = answers.len(), "posting submission");

        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }
}

async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(ErrorBody::into_message);
    Err(status_error(status, message))
}

/// Map a non-success status to the gateway taxonomy.
#[must_use]
pub fn status_error(status: StatusCode, message: Option<String>) -> GatewayError {
    match status {
        StatusCode::NOT_FOUND => GatewayError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => GatewayError::Validation(
            message.unwrap_or_else(|| status.canonical_reason().unwrap_or("bad request").to_owned()),
        ),
        other => GatewayError::Status(other.as_u16()),
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::Decode(err.to_string())
    } else if err.is_timeout() {
        GatewayError::Network("request timed out".to_owned())
    } else {
        GatewayError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses() {
        assert_eq!(status_error(StatusCode::NOT_FOUND, None), GatewayError::NotFound);
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, None),
            GatewayError::Unauthorized
        );
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, Some("answers required".into())),
            GatewayError::Validation("answers required".into())
        );
        assert_eq!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, None),
            GatewayError::Validation("Unprocessable Entity".into())
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, None),
            GatewayError::Status(502)
        );
    }

    #[test]
    fn debug_hides_token() {
        let gateway = HttpGateway::new(HttpGatewayConfig::default())
            .unwrap()
            .with_bearer_token(Some("secret-token".into()));
        let rendered = format!("{gateway:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("authenticated: true"));
    }
}
