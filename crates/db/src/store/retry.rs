//! Timeout and retry policy for store calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use colloquy_common::config::StoreConfig;
use colloquy_common::{AppError, AppResult};

use super::{Document, DocumentStore};

/// Retry configuration with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call.
    pub max_retries: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
    /// Deadline for a single store call.
    pub timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
            timeout: Duration::from_secs(5),
        }
    }
}

impl From<&StoreConfig> for RetryConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            multiplier: 2.0,
            timeout: config.timeout(),
        }
    }
}

impl RetryConfig {
    /// Calculate delay for the given attempt number (0-indexed).
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt >= self.max_retries {
            return self.max_delay;
        }

        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let delay = Duration::from_secs_f64(delay_secs);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }

    /// Check if we should retry after the given number of attempts.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Store decorator enforcing [`RetryConfig`] on every call.
///
/// A call that exceeds the timeout is abandoned and reported as
/// [`AppError::StoreUnavailable`]. Only `StoreUnavailable` is retried.
pub struct RetryingStore<D: Document> {
    inner: Arc<dyn DocumentStore<D>>,
    config: RetryConfig,
}

impl<D: Document> Clone for RetryingStore<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}

impl<D: Document> RetryingStore<D> {
    /// Wrap a store.
    #[must_use]
    pub fn new(inner: Arc<dyn DocumentStore<D>>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    async fn run<T, F, Fut>(&self, op: &'static str, mut call: F) -> AppResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.config.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(AppError::StoreUnavailable(format!(
                    "{} {op} timed out after {:?}",
                    D::COLLECTION,
                    self.config.timeout
                ))),
            };

            match result {
                Err(e) if e.is_retryable() && self.config.should_retry(attempt) => {
                    let delay = self.config.delay_for_attempt(attempt);
                    tracing::warn!(
                        error = %e,
                        collection = D::COLLECTION,
                        op,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Store call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl<D: Document> DocumentStore<D> for RetryingStore<D> {
    async fn get(&self, id: &str) -> AppResult<Option<D>> {
        self.run("get", || self.inner.get(id)).await
    }

    async fn query(&self, filter: &D::Filter) -> AppResult<Vec<D>> {
        self.run("query", || self.inner.query(filter)).await
    }

    async fn put(&self, doc: D) -> AppResult<()> {
        self.run("put", || self.inner.put(doc.clone())).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.run("delete", || self.inner.delete(id)).await
    }
}
