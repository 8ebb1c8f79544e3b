//! Client for the generation backend's two webhook operations.
//!
//! - `POST {base}/generate` with `{ "prompt" }`
//! - `POST {base}/edit` with `{ "prompt", "image": { "data", "mimeType" } }`
//!
//! Both answer `{ "imageData": "<base64 png>" }` on success.

use std::time::Duration;

use reqwest::Response;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use super::executor::{RequestExecutor, RequestFailure};
use crate::core::config::AppConfig;
use crate::core::models::{
    EditRequest, GenerateRequest, GeneratedImage, ImageResponse, SanitizedPrompt, UploadedImage,
};
use crate::errors::AppError;

/// Longest slice of an error body kept for diagnostics.
const MAX_DIAGNOSTIC_BODY_CHARS: usize = 512;

/// Upper bound on how long a non-2xx body is waited for.
const DIAGNOSTIC_BODY_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct WebhookClient {
    base_url: String,
    executor: RequestExecutor,
    timeout: Duration,
}

impl WebhookClient {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self::with_executor(
            &config.webhook_base_url,
            RequestExecutor::new(config.timeout, config.environment),
            config.timeout,
        )
    }

    #[must_use]
    pub fn with_executor(base_url: &str, executor: RequestExecutor, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            executor,
            timeout,
        }
    }

    #[must_use]
    pub fn endpoint(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// # Errors
    ///
    /// Returns a classified [`AppError`] for any transport, status or payload
    /// failure.
    pub async fn generate(&self, prompt: &SanitizedPrompt) -> Result<GeneratedImage, AppError> {
        #[cfg(feature = "debug-logs")]
        info!("generate request: prompt of {} chars", prompt.as_str().chars().count());

        self.post_for_image("generate", &GenerateRequest { prompt })
            .await
            .map_err(|failure| self.executor.report(failure, "generate"))
    }

    /// # Errors
    ///
    /// Returns a classified [`AppError`] for any transport, status or payload
    /// failure.
    pub async fn edit(
        &self,
        prompt: &SanitizedPrompt,
        image: &UploadedImage,
    ) -> Result<GeneratedImage, AppError> {
        #[cfg(feature = "debug-logs")]
        info!(
            "edit request: prompt of {} chars, {} image of {} base64 chars",
            prompt.as_str().chars().count(),
            image.mime_type(),
            image.data().len()
        );

        self.post_for_image("edit", &EditRequest { prompt, image })
            .await
            .map_err(|failure| self.executor.report(failure, "edit"))
    }

    async fn post_for_image<B: Serialize>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<GeneratedImage, RequestFailure> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let url = self.endpoint(operation);

        let response = self.executor.execute(&url, body, self.timeout).await?;
        let status = response.status();

        if !status.is_success() {
            let wait_until = deadline.min(Instant::now() + DIAGNOSTIC_BODY_WAIT);
            return Err(RequestFailure::Status {
                status: status.as_u16(),
                body: diagnostic_body(response, wait_until).await,
            });
        }

        // the body read shares the deadline armed for the request
        let text = match tokio::time::timeout_at(deadline, response.text()).await {
            Ok(text) => text?,
            Err(_) => return Err(RequestFailure::TimedOut { after: self.timeout }),
        };

        let parsed: ImageResponse = serde_json::from_str(&text).map_err(|e| {
            RequestFailure::Other(format!("failed to parse webhook response: {e}"))
        })?;

        let base64_png = parsed
            .image_data
            .filter(|data| !data.is_empty())
            .ok_or(RequestFailure::MissingImageData)?;

        info!(
            "{} succeeded in {}ms",
            operation,
            started.elapsed().as_millis()
        );
        Ok(GeneratedImage { base64_png })
    }
}

/// Best-effort read of an error body for logs. Whatever arrived before
/// `wait_until`, a read error or the end of the body is kept; nothing here fails.
async fn diagnostic_body(mut response: Response, wait_until: Instant) -> String {
    let mut bytes = Vec::new();
    // 4 bytes covers the widest UTF-8 character
    let max_bytes = MAX_DIAGNOSTIC_BODY_CHARS * 4;

    while bytes.len() < max_bytes {
        match tokio::time::timeout_at(wait_until, response.chunk()).await {
            Ok(Ok(Some(chunk))) => bytes.extend_from_slice(&chunk),
            Ok(Ok(None)) => break,
            Ok(Err(e)) => {
                debug!("Error body read failed: {}", e);
                break;
            }
            Err(_) => {
                debug!("Error body incomplete after wait, keeping {} bytes", bytes.len());
                break;
            }
        }
    }

    String::from_utf8_lossy(&bytes)
        .chars()
        .take(MAX_DIAGNOSTIC_BODY_CHARS)
        .collect()
}
