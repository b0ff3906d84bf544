//! 后台任务管理
//!
//! 统一管理后台任务的启动和关闭。目前只有定时任务：
//! - `code_purge` - 清理过期验证码

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::VerificationCodeStore;

/// 验证码清理周期
pub const CODE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

struct RegisteredTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// tasks.spawn("code_purge", purge_codes_loop(codes, interval, tasks.shutdown_token()));
/// tasks.shutdown().await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 取消令牌（任务内部监听 shutdown 信号）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务，panic 会被捕获并记录
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let wrapped = async move {
            if let Err(panic_info) = AssertUnwindSafe(future).catch_unwind().await {
                let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                tracing::error!(task = %name, panic = %panic_msg, "Background task panicked");
            }
        };

        let handle = tokio::spawn(wrapped);
        tracing::debug!(task = %name, "Registered background task");
        self.tasks.push(RegisteredTask { name, handle });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 发出取消信号并等待所有任务结束
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.handle.await {
                tracing::warn!(task = %task.name, error = %e, "Background task join failed");
            }
        }
        tracing::info!("Background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

/// 定期清理过期验证码，直到收到取消信号
pub async fn purge_codes_loop(
    codes: Arc<dyn VerificationCodeStore>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let removed = codes.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "Purged expired verification codes");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCodeStore;

    #[tokio::test]
    async fn test_purge_loop_stops_on_shutdown() {
        let store = Arc::new(MemoryCodeStore::new());
        store.issue("13800138000", Duration::ZERO).await;
        store.issue("13900139000", Duration::from_secs(300)).await;

        let mut tasks = BackgroundTasks::new();
        let codes: Arc<dyn VerificationCodeStore> = store.clone();
        tasks.spawn(
            "code_purge",
            purge_codes_loop(codes, Duration::from_millis(10), tasks.shutdown_token()),
        );
        assert_eq!(tasks.len(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        tasks.shutdown().await;

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let mut tasks = BackgroundTasks::new();
        tasks.spawn("boom", async { panic!("boom") });
        tasks.shutdown().await;
    }
}
