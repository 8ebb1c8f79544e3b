//! Submission orchestration.
//!
//! Local validation and the rate-limit check always complete before the
//! network call is issued, and a rejected or throttled submission never
//! reaches the network.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::client::WebhookClient;
use crate::core::config::AppConfig;
use crate::core::models::{
    GeneratedImage, RateLimitConfig, RateLimitDecision, SanitizedPrompt, UploadedImage,
};
use crate::errors::{AppError, ConfigError, ErrorCode};
use crate::rate_limit::RateLimiter;
use crate::validation::{FileValidator, PromptValidator, UploadSource, encode_upload};

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Input failed local validation.
    #[error("{0}")]
    Rejected(AppError),

    #[error("Too many requests. Please wait {retry_after_seconds} seconds before trying again.")]
    RateLimited { retry_after_seconds: u64 },

    /// The backend call failed.
    #[error("{0}")]
    Failed(AppError),
}

impl SubmissionError {
    /// Stable machine-readable code for display layers.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            SubmissionError::Rejected(err) | SubmissionError::Failed(err) => err.code(),
            SubmissionError::RateLimited { .. } => ErrorCode::RateLimited,
        }
    }

    #[must_use]
    pub fn app_error(&self) -> Option<&AppError> {
        match self {
            SubmissionError::Rejected(err) | SubmissionError::Failed(err) => Some(err),
            SubmissionError::RateLimited { .. } => None,
        }
    }
}

pub struct Gateway {
    prompt_validator: PromptValidator,
    file_validator: FileValidator,
    limiter: Arc<RateLimiter>,
    client: WebhookClient,
}

impl Gateway {
    /// # Errors
    ///
    /// Returns an error if the configured rate-limit policy is not positive.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let policy = RateLimitConfig::new(config.rate_limit_max_requests, config.rate_limit_window)?;
        Ok(Self::with_parts(
            WebhookClient::new(config),
            Arc::new(RateLimiter::new(policy)),
        ))
    }

    #[must_use]
    pub fn with_parts(client: WebhookClient, limiter: Arc<RateLimiter>) -> Self {
        Self {
            prompt_validator: PromptValidator::new(),
            file_validator: FileValidator::new(),
            limiter,
            client,
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// # Errors
    ///
    /// See [`SubmissionError`].
    pub async fn submit_generate(&self, raw_prompt: &str) -> Result<GeneratedImage, SubmissionError> {
        let prompt = self.admit(raw_prompt)?;

        info!("Submitting generate request");
        self.client
            .generate(&prompt)
            .await
            .map_err(SubmissionError::Failed)
    }

    /// # Errors
    ///
    /// See [`SubmissionError`].
    pub async fn submit_edit(
        &self,
        raw_prompt: &str,
        upload: &dyn UploadSource,
    ) -> Result<GeneratedImage, SubmissionError> {
        let image = encode_upload(&self.file_validator, upload)
            .await
            .map_err(SubmissionError::Rejected)?;
        self.submit_encoded_edit(raw_prompt, &image).await
    }

    /// Edit with an upload the caller already validated and encoded through
    /// [`encode_upload`], for callers that also keep the raw bytes.
    ///
    /// # Errors
    ///
    /// See [`SubmissionError`].
    pub async fn submit_encoded_edit(
        &self,
        raw_prompt: &str,
        image: &UploadedImage,
    ) -> Result<GeneratedImage, SubmissionError> {
        let prompt = self.admit(raw_prompt)?;

        info!("Submitting edit request with {} upload", image.mime_type());
        self.client
            .edit(&prompt, image)
            .await
            .map_err(SubmissionError::Failed)
    }

    /// Clears rate-limit history at a session boundary such as sign-out.
    pub fn reset_session(&self) {
        self.limiter.reset();
    }

    /// Prompt validation followed by the rate-limit check.
    fn admit(&self, raw_prompt: &str) -> Result<SanitizedPrompt, SubmissionError> {
        let prompt = self
            .prompt_validator
            .validate(raw_prompt)
            .into_result()
            .map_err(SubmissionError::Rejected)?;

        match self.limiter.check_and_record() {
            RateLimitDecision::Allowed => Ok(prompt),
            RateLimitDecision::Denied {
                retry_after_seconds,
            } => {
                warn!("Submission throttled, retry after {}s", retry_after_seconds);
                Err(SubmissionError::RateLimited {
                    retry_after_seconds,
                })
            }
        }
    }
}
