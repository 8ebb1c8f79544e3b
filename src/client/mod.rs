//! Network side: timeout-bounded execution and the webhook operations.

pub mod executor;
pub mod webhook;

pub use executor::{RequestExecutor, RequestFailure, classify};
pub use webhook::WebhookClient;
