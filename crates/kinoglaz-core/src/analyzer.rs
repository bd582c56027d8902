use std::{future::Future, time::Duration};

use async_trait::async_trait;
use rand::Rng;

use crate::{
    error::{FailureClass, KinoglazError, Result},
    prompts::PromptKind,
    types::{ChunkDescriptor, VideoPayload},
};

/// Maximum retries after the initial attempt for rate-limited calls.
pub const MAX_RETRIES: u32 = 5;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(1800);
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Options shared by every analysis backend.
#[derive(Clone, Debug, Default)]
pub struct AnalyzerOptions {
    /// Model override; falls back to the provider's default.
    pub model: Option<String>,
    pub prompt_kind: PromptKind,
    /// Ask the model for an embedded key-frame block.
    pub key_frames: bool,
}

/// A multimodal backend able to describe video content.
#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Describe one chunk of a longer video.
    async fn analyze_chunk(
        &self,
        payload: &VideoPayload,
        chunk: &ChunkDescriptor,
    ) -> Result<String>;

    /// Describe a video that fits in a single request.
    async fn analyze_whole(&self, payload: &VideoPayload) -> Result<String>;

    /// Merge per-chunk analyses into one text. Called only when there is
    /// more than one of them.
    async fn combine(&self, analyses: &[String]) -> Result<String>;

    /// How a failed call should be treated by the retry layer.
    fn classify_failure(&self, error: &KinoglazError) -> FailureClass;
}

/// Run `op`, backing off and retrying while its failure classifies as
/// rate limiting. Any other failure returns at once. Delays grow as
/// `2^attempt` seconds, scaled by a jitter factor in `[0.5, 1.5)`.
pub async fn retry_with_backoff<T, C, F, Fut>(classify: C, mut op: F) -> Result<T>
where
    C: Fn(&KinoglazError) -> FailureClass,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= MAX_RETRIES || classify(&error) != FailureClass::RateLimited {
                    return Err(error);
                }
                let base = 2u64.pow(attempt) as f64;
                let jitter = rand::rng().random_range(0.5..1.5);
                let delay = Duration::from_secs_f64(base * jitter);
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_seconds = delay.as_secs_f64(),
                    %error,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Baseline classification for the HTTP backends: explicit 429s are rate
/// limiting, transport timeouts and connection drops are transient,
/// everything else is fatal.
pub(crate) fn classify_http_failure(error: &KinoglazError) -> FailureClass {
    match error {
        KinoglazError::AnalysisFailed { status: 429, .. } => FailureClass::RateLimited,
        KinoglazError::HttpError(e) if e.status().map(|s| s.as_u16()) == Some(429) => {
            FailureClass::RateLimited
        }
        KinoglazError::HttpError(e) if e.is_timeout() || e.is_connect() => FailureClass::Transient,
        _ => FailureClass::Fatal,
    }
}

pub(crate) fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn rate_limited() -> KinoglazError {
        KinoglazError::AnalysisFailed {
            backend: "test",
            status: 429,
            message: "slow down".into(),
        }
    }

    fn fatal() -> KinoglazError {
        KinoglazError::AnalysisFailed {
            backend: "test",
            status: 400,
            message: "bad request".into(),
        }
    }

    #[test]
    fn classification_separates_rate_limits_from_fatal() {
        assert_eq!(
            classify_http_failure(&rate_limited()),
            FailureClass::RateLimited
        );
        assert_eq!(classify_http_failure(&fatal()), FailureClass::Fatal);
        assert_eq!(
            classify_http_failure(&KinoglazError::MissingApiKey {
                env_var: "X".into()
            }),
            FailureClass::Fatal
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limits_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(classify_http_failure, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_the_retry_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(classify_http_failure, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn fatal_failures_return_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(classify_http_failure, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(fatal()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn total_backoff_stays_within_jitter_bounds() {
        let start = tokio::time::Instant::now();
        let result: Result<()> = retry_with_backoff(classify_http_failure, || async {
            Err(rate_limited())
        })
        .await;
        assert!(result.is_err());

        // bases 1 + 2 + 4 + 8 + 16 = 31 seconds before jitter
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs_f64(31.0 * 0.5));
        assert!(elapsed < Duration::from_secs_f64(31.0 * 1.5));
    }
}
