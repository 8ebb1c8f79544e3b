//! Normalized failures surfaced by the gateway.
//!
//! Every failure leaving the crate is an [`AppError`]: a safe message for the
//! person at the keyboard, a diagnostic message for logs, and a stable
//! [`ErrorCode`] that display layers use for localization.

use std::fmt;

use thiserror::Error;

/// Closed failure taxonomy. The string forms are stable and machine-readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationError,
    NetworkError,
    TimeoutError,
    WebhookError,
    NoImageData,
    UnknownError,
    /// Admission denied by the local rate limiter. Raised by the gateway before
    /// any request exists, so the request classifier never produces it.
    RateLimited,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::TimeoutError => "TIMEOUT_ERROR",
            ErrorCode::WebhookError => "WEBHOOK_ERROR",
            ErrorCode::NoImageData => "NO_IMAGE_DATA",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
        }
    }

    /// Fixed user-facing text for the code. Never includes request details.
    #[must_use]
    pub fn canonical_message(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "The request could not be accepted.",
            ErrorCode::NetworkError => {
                "Network error. Please check your connection and try again."
            }
            ErrorCode::TimeoutError => "Request timed out. Please try again.",
            ErrorCode::WebhookError => "The image service failed. Please try again later.",
            ErrorCode::NoImageData => "The image service returned no image. Please try again.",
            ErrorCode::UnknownError => "An unexpected error occurred. Please try again.",
            ErrorCode::RateLimited => "Too many requests. Please wait before trying again.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure.
///
/// `Display` renders only the user message, so formatting an `AppError` into
/// anything user-visible cannot leak diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{user_message}")]
pub struct AppError {
    user_message: String,
    internal_message: String,
    code: ErrorCode,
    status_code: Option<u16>,
}

impl AppError {
    /// Builds an error whose user message is the code's canonical text.
    pub fn new(code: ErrorCode, internal_message: impl Into<String>) -> Self {
        Self {
            user_message: code.canonical_message().to_string(),
            internal_message: internal_message.into(),
            code,
            status_code: None,
        }
    }

    /// A locally detected rejection. The reason is already safe to show, so it
    /// is used for both messages.
    pub fn validation(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            user_message: reason.clone(),
            internal_message: reason,
            code: ErrorCode::ValidationError,
            status_code: None,
        }
    }

    /// Non-2xx response from the backend.
    pub fn webhook(status_code: u16, internal_message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::new(ErrorCode::WebhookError, internal_message)
        }
    }

    /// Replaces the user message, unless the replacement would expose the
    /// internal message. In that case the canonical message is kept.
    ///
    /// Validation errors are exempt: their internal message is the same safe
    /// reason already shown to the user.
    #[must_use]
    pub fn with_user_message(mut self, user_message: impl Into<String>) -> Self {
        let user_message = user_message.into();
        let internal = self.internal_message.trim();
        let leaks = self.code != ErrorCode::ValidationError
            && !internal.is_empty()
            && user_message.contains(internal);

        self.user_message = if leaks {
            self.code.canonical_message().to_string()
        } else {
            user_message
        };
        self
    }

    #[must_use]
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    #[must_use]
    pub fn internal_message(&self) -> &str {
        &self.internal_message
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.code == ErrorCode::ValidationError
    }
}

/// Failures while loading process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
