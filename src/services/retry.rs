//! # 지수 백오프 재시도
//!
//! KV 저장소 쓰기처럼 일시적으로 실패할 수 있는 작업을 몇 번 더 시도합니다.
//! 대기 시간은 `base`, `base * 2`, `base * 4` ... 순으로 늘어납니다.

use std::future::Future;
use std::time::Duration;

/// 기본 시도 횟수
pub const DEFAULT_ATTEMPTS: u32 = 3;
/// 첫 재시도 전 대기 시간
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(50);

/// `op`를 최대 `attempts`번 실행합니다. 마지막 에러를 그대로 반환합니다.
pub async fn with_backoff<T, E, F, Fut>(
    label: &str,
    attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut delay = base_delay;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    label,
                    attempt,
                    attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
