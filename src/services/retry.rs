use std::future::Future;
use std::time::Duration;

use crate::error::AppResult;

/// Ограниченное число попыток с экспоненциальной задержкой между ними
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Задержка после неудачной попытки `attempt` (нумерация с 1): 1s, 2s, 4s, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay * 2u32.pow(exponent)
    }
}

/// Выполняет `operation`, повторяя временные ошибки (`AppError::is_transient`).
/// Постоянные ошибки возвращаются сразу, после последней попытки не ждём.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, name: &str, mut operation: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying: {}",
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!(operation = name, attempts = attempt, "Retries exhausted: {}", e);
                }
                return Err(e);
            }
        }
    }
}
