//! 有界轮询
//!
//! 等待页面渲染、等待下载落盘都用这里的指数退避轮询，不做固定时长的盲等。

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

/// 轮询参数
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// 总超时
    pub timeout: Duration,
    /// 首次等待间隔
    pub initial_delay: Duration,
    /// 间隔上限
    pub max_delay: Duration,
}

impl PollPolicy {
    pub fn new(timeout_ms: u64, initial_ms: u64, max_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            initial_delay: Duration::from_millis(initial_ms.max(1)),
            max_delay: Duration::from_millis(max_ms.max(initial_ms.max(1))),
        }
    }
}

/// 反复调用 `probe`，直到返回 `Some` 或超时
///
/// 每次失败后等待时间翻倍，直到 `max_delay`。超时返回 `None`。
/// 至少会调用一次 `probe`。
pub async fn poll_until<T, F, Fut>(policy: PollPolicy, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut delay = policy.initial_delay;
    let mut attempt = 0usize;

    loop {
        attempt += 1;
        if let Some(value) = probe().await {
            debug!("轮询第 {} 次成功", attempt);
            return Some(value);
        }

        let now = Instant::now();
        if now >= deadline {
            debug!("轮询 {} 次后超时", attempt);
            return None;
        }

        sleep(delay.min(deadline - now)).await;
        delay = (delay * 2).min(policy.max_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = poll_until(PollPolicy::new(10_000, 10, 100), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                (n == 4).then_some(n)
            }
        })
        .await;

        assert_eq!(result, Some(4));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out() {
        let result: Option<()> = poll_until(PollPolicy::new(500, 10, 80), || async { None }).await;
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_probes_at_least_once_with_zero_timeout() {
        let result = poll_until(PollPolicy::new(0, 10, 10), || async { Some(1) }).await;
        assert_eq!(result, Some(1));
    }
}
