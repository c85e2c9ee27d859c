use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Stdout plus a daily rolling file under `./logs`. Keep the returned guard alive in `main`,
/// dropping it stops the file writer.
pub fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = rolling::daily("./logs", "aura.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stdout);

    // no ANSI escapes in the file
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

/// Runs `task` once, then up to `retries` more times while it fails, sleeping `delay` between
/// attempts. Returns the last error when every attempt fails.
pub async fn retry<T, Fut, F>(mut task: F, retries: u32, delay: Duration) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match task().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                attempt += 1;
                tracing::warn!("Attempt {attempt} of {} failed: {e:#}", retries.saturating_add(1));
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
