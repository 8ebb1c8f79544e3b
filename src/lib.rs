/// ImaginAI gateway - validates prompts and image uploads, throttles
/// submissions, and exchanges them with a remote image generation webhook.
///
/// # Architecture
///
/// The crate is the decision core behind an image generation front end:
/// - `validation` checks uploads (extension, declared type, size, magic
///   number) and prompts (length, control characters, injection patterns)
/// - `rate_limit` applies a sliding-window log per logical action
/// - `client` issues timeout-bounded webhook calls and classifies failures
///   into a closed taxonomy (`errors::ErrorCode`)
/// - `gateway` sequences the above so no invalid or throttled input ever
///   reaches the network
///
/// # Example
///
/// ```no_run
/// use imaginai::core::config::AppConfig;
/// use imaginai::gateway::Gateway;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     imaginai::setup_logging();
///
///     let config = AppConfig::new("https://hooks.example.com/webhook")?;
///     let gateway = Gateway::new(&config)?;
///
///     match gateway.submit_generate("a lighthouse in a storm").await {
///         Ok(image) => println!("{} base64 chars", image.base64_png.len()),
///         Err(e) => eprintln!("{}: {}", e.code(), e),
///     }
///
///     Ok(())
/// }
/// ```
pub mod client;
pub mod core;
pub mod errors;
pub mod gateway;
pub mod preview;
pub mod rate_limit;
pub mod validation;

/// Configure structured JSON logging.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; only the first subscriber is installed.
///
/// # Example
///
/// ```
/// imaginai::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
