use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, ConfigError};

// ============================================================================
// Validation outcomes
// ============================================================================

/// Outcome of validating one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileValidationResult {
    Valid,
    Invalid(String),
}

impl FileValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, FileValidationResult::Valid)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            FileValidationResult::Valid => None,
            FileValidationResult::Invalid(reason) => Some(reason.as_str()),
        }
    }

    /// # Errors
    ///
    /// Returns a `VALIDATION_ERROR` carrying the rejection reason.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            FileValidationResult::Valid => Ok(()),
            FileValidationResult::Invalid(reason) => Err(AppError::validation(reason)),
        }
    }
}

/// Prompt text that passed validation. Only this form is sent downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SanitizedPrompt(String);

impl SanitizedPrompt {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of validating prompt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptValidationResult {
    Valid(SanitizedPrompt),
    Invalid(String),
}

impl PromptValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, PromptValidationResult::Valid(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            PromptValidationResult::Valid(_) => None,
            PromptValidationResult::Invalid(reason) => Some(reason.as_str()),
        }
    }

    #[must_use]
    pub fn sanitized(&self) -> Option<&str> {
        match self {
            PromptValidationResult::Valid(prompt) => Some(prompt.as_str()),
            PromptValidationResult::Invalid(_) => None,
        }
    }

    /// # Errors
    ///
    /// Returns a `VALIDATION_ERROR` carrying the rejection reason.
    pub fn into_result(self) -> Result<SanitizedPrompt, AppError> {
        match self {
            PromptValidationResult::Valid(prompt) => Ok(prompt),
            PromptValidationResult::Invalid(reason) => Err(AppError::validation(reason)),
        }
    }
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Policy for one limiter instance. Both bounds are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    max_requests: u32,
    window: Duration,
}

impl RateLimitConfig {
    /// # Errors
    ///
    /// Returns an error if `max_requests` is zero or `window` is empty.
    pub fn new(max_requests: u32, window: Duration) -> Result<Self, ConfigError> {
        if max_requests == 0 {
            return Err(ConfigError::Invalid {
                name: "max_requests",
                reason: "must be greater than zero".to_string(),
            });
        }
        if window.is_zero() {
            return Err(ConfigError::Invalid {
                name: "window",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            max_requests,
            window,
        })
    }

    #[must_use]
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Denied { retry_after_seconds: u64 },
}

impl RateLimitDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }

    #[must_use]
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            RateLimitDecision::Allowed => None,
            RateLimitDecision::Denied {
                retry_after_seconds,
            } => Some(*retry_after_seconds),
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Raw content of an upload that passed validation.
///
/// Obtained only through [`crate::validation::file::read_validated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ValidatedUpload {
    pub(crate) fn new(bytes: Vec<u8>, mime_type: String) -> Self {
        Self { bytes, mime_type }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A validated, base64-encoded upload ready for transport.
///
/// Obtained only through [`crate::validation::file::encode_validated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    data: String,
    mime_type: String,
}

impl UploadedImage {
    pub(crate) fn new(data: String, mime_type: String) -> Self {
        Self { data, mime_type }
    }

    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Body of `POST {base}/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a SanitizedPrompt,
}

/// Body of `POST {base}/edit`.
#[derive(Debug, Serialize)]
pub struct EditRequest<'a> {
    pub prompt: &'a SanitizedPrompt,
    pub image: &'a UploadedImage,
}

/// Success body of both backend operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Image returned by the backend, as base64 PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub base64_png: String,
}

impl GeneratedImage {
    /// `data:` URL suitable for an `<img src>` or similar display surface.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.base64_png)
    }
}
