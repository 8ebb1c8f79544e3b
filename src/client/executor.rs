//! Timeout-bounded HTTP execution and failure classification.
//!
//! Every call is raced against a timer armed when the call starts. If the
//! timer wins, the in-flight request future is dropped (aborting the
//! connection) and the failure is a `TIMEOUT_ERROR`, whatever the backend
//! would eventually have done.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, error};

use crate::core::config::{DEFAULT_TIMEOUT_MS, Environment};
use crate::errors::{AppError, ErrorCode};

/// Raw failure observed at the request boundary, before classification.
#[derive(Debug)]
pub enum RequestFailure {
    /// Already classified upstream; passed through unchanged.
    Classified(AppError),
    /// The response arrived but its status is outside 2xx.
    Status { status: u16, body: String },
    /// The response arrived but carried no `imageData`.
    MissingImageData,
    /// The cancellation timer fired first.
    TimedOut { after: Duration },
    /// Transport-level error from the HTTP stack.
    Transport(reqwest::Error),
    /// Anything else.
    Other(String),
}

impl From<reqwest::Error> for RequestFailure {
    fn from(error: reqwest::Error) -> Self {
        RequestFailure::Transport(error)
    }
}

/// Maps a raw failure onto the closed taxonomy. First match wins.
///
/// `context` names the operation for diagnostics and never reaches the
/// user message.
#[must_use]
pub fn classify(failure: RequestFailure, context: &str) -> AppError {
    match failure {
        RequestFailure::Classified(err) => err,
        RequestFailure::Status { status, body } => AppError::webhook(
            status,
            format!("[{context}] webhook responded with status {status}: {body}"),
        ),
        RequestFailure::MissingImageData => AppError::new(
            ErrorCode::NoImageData,
            format!("[{context}] no image data found in the webhook response"),
        ),
        RequestFailure::TimedOut { after } => AppError::new(
            ErrorCode::TimeoutError,
            format!("[{context}] fetch aborted after {}ms", after.as_millis()),
        ),
        RequestFailure::Transport(e) if e.is_timeout() => AppError::new(
            ErrorCode::TimeoutError,
            format!("[{context}] transport timeout: {e}"),
        ),
        RequestFailure::Transport(e) if e.is_connect() || e.is_request() => AppError::new(
            ErrorCode::NetworkError,
            format!("[{context}] network failure: {e}"),
        ),
        RequestFailure::Transport(e) => AppError::new(
            ErrorCode::UnknownError,
            format!("[{context}] unexpected transport error: {e}"),
        ),
        RequestFailure::Other(message) => {
            AppError::new(ErrorCode::UnknownError, format!("[{context}] {message}"))
        }
    }
}

/// Issues JSON POSTs with an enforced deadline.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    default_timeout: Duration,
    environment: Environment,
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
            Environment::default(),
        )
    }
}

impl RequestExecutor {
    #[must_use]
    pub fn new(default_timeout: Duration, environment: Environment) -> Self {
        Self {
            client: Client::new(),
            default_timeout,
            environment,
        }
    }

    #[must_use]
    pub fn with_client(client: Client, default_timeout: Duration, environment: Environment) -> Self {
        Self {
            client,
            default_timeout,
            environment,
        }
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// POSTs `body` as JSON to `url`, bounded by `timeout`.
    ///
    /// Returns the response whatever its status; status checks belong to the
    /// caller, which knows the expected payload.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailure::TimedOut` if the deadline passes before the
    /// response head arrives, or `RequestFailure::Transport` on a transport
    /// error.
    pub async fn execute<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Response, RequestFailure> {
        debug!("POST {} (timeout {}ms)", url, timeout.as_millis());

        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send();

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RequestFailure::TimedOut { after: timeout }),
        }
    }

    /// Classifies `failure` and records the diagnostic. The internal message
    /// is only logged outside production.
    #[must_use]
    pub fn report(&self, failure: RequestFailure, context: &str) -> AppError {
        let err = classify(failure, context);
        if self.environment.is_production() {
            error!(code = err.code().as_str(), status = ?err.status_code(), "{} failed", context);
        } else {
            error!(
                code = err.code().as_str(),
                status = ?err.status_code(),
                internal = err.internal_message(),
                "{} failed",
                context
            );
        }
        err
    }
}
