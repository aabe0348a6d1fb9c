//! Lifecycle controller
//!
//! Owns every background task. `startup` spawns the publishers with child
//! tokens of one root token; `shutdown` cancels the root and joins every
//! handle before reporting `Stopped`, so no task outlives the server.

use std::future::Future;

use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::domain::LifecycleError;

use super::publisher::PublisherTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
}

/// Outcome of a completed shutdown
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Tasks that exited cleanly
    pub stopped: Vec<&'static str>,
    /// Tasks whose join failed (panic or abort), with the reason
    pub failed: Vec<(&'static str, String)>,
}

pub struct LifecycleController {
    state: Mutex<LifecycleState>,
    token: CancellationToken,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl LifecycleController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LifecycleState::Idle),
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Token cancelled when shutdown begins, for collaborators that should
    /// wind down with the controller
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Idle → Running, spawning every publisher
    pub async fn startup(&self, publishers: Vec<PublisherTask>) -> Result<(), LifecycleError> {
        let mut state = self.state.lock().await;
        if *state != LifecycleState::Idle {
            tracing::error!("startup called in state {:?}", *state);
            return Err(LifecycleError::AlreadyStarted);
        }

        let mut tasks = self.tasks.lock().await;
        for publisher in publishers {
            let name = publisher.name();
            let handle = tokio::spawn(publisher.run(self.token.child_token()));
            tasks.push((name, handle));
        }
        *state = LifecycleState::Running;

        tracing::info!("Lifecycle started with {} background tasks", tasks.len());
        Ok(())
    }

    /// Track an additional background task; only allowed while Running
    pub async fn spawn<F, Fut>(&self, name: &'static str, task: F) -> Result<(), LifecycleError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let state = self.state.lock().await;
        match *state {
            LifecycleState::Running => {
                let handle = tokio::spawn(task(self.token.child_token()));
                self.tasks.lock().await.push((name, handle));
                tracing::debug!("Background task '{}' spawned", name);
                Ok(())
            }
            LifecycleState::Idle => Err(LifecycleError::NotRunning),
            LifecycleState::ShuttingDown | LifecycleState::Stopped => {
                Err(LifecycleError::AlreadyShutDown)
            }
        }
    }

    /// Running → ShuttingDown → Stopped.
    ///
    /// Individual task failures are collected into the report, not
    /// propagated. Calling this before startup or a second time is a
    /// lifecycle bug and is reported as an error.
    pub async fn shutdown(&self) -> Result<ShutdownReport, LifecycleError> {
        {
            let mut state = self.state.lock().await;
            match *state {
                LifecycleState::Running => *state = LifecycleState::ShuttingDown,
                LifecycleState::Idle => {
                    tracing::error!("shutdown called before startup");
                    return Err(LifecycleError::NotRunning);
                }
                LifecycleState::ShuttingDown | LifecycleState::Stopped => {
                    tracing::error!("shutdown called more than once (state: {:?})", *state);
                    return Err(LifecycleError::AlreadyShutDown);
                }
            }
        }

        tracing::info!("Shutting down background tasks...");
        self.token.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        let mut report = ShutdownReport::default();
        for (name, handle) in tasks {
            match handle.await {
                Ok(()) => report.stopped.push(name),
                Err(e) => {
                    tracing::warn!("Background task '{}' terminated abnormally: {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        *self.state.lock().await = LifecycleState::Stopped;
        tracing::info!(
            "All background tasks stopped ({} clean, {} failed)",
            report.stopped.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        domain::{Connection, ConnectionId},
        infrastructure::ConnectionRegistry,
        usecase::publisher::{FAST_INTERVAL, SLOW_INTERVAL},
    };
    use kairo_shared::time::{Clock, SystemClock};
    use tokio::sync::mpsc;

    async fn setup() -> (
        LifecycleController,
        Vec<PublisherTask>,
        mpsc::UnboundedReceiver<String>,
    ) {
        let registry = Arc::new(ConnectionRegistry::new("realtime"));
        let (tx, rx) = mpsc::unbounded_channel();
        registry
            .register(Connection::new(ConnectionId::generate(), tx, SystemClock.now()))
            .await
            .unwrap();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let publishers = vec![
            PublisherTask::system_stats(FAST_INTERVAL, vec![registry.clone()], clock.clone()),
            PublisherTask::sensor_data(SLOW_INTERVAL, vec![registry], clock),
        ];
        (LifecycleController::new(), publishers, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> usize {
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_runs_publishers() {
        // テスト項目: startup 後は Running になり、配信が始まる
        // given (前提条件):
        let (controller, publishers, mut rx) = setup().await;

        // when (操作):
        controller.startup(publishers).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        // then (期待する結果):
        assert_eq!(controller.state().await, LifecycleState::Running);
        assert!(drain(&mut rx) >= 4);
        controller.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_all_publishers() {
        // テスト項目: shutdown から戻った後は 1 周期以上待っても配信されない
        // given (前提条件):
        let (controller, publishers, mut rx) = setup().await;
        controller.startup(publishers).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2200)).await;

        // when (操作):
        let report = controller.shutdown().await.unwrap();
        drain(&mut rx);
        tokio::time::sleep(SLOW_INTERVAL * 2).await;

        // then (期待する結果):
        assert_eq!(controller.state().await, LifecycleState::Stopped);
        assert_eq!(report.stopped.len(), 2);
        assert!(report.stopped.contains(&"system_stats"));
        assert!(report.stopped.contains(&"sensor_data"));
        assert!(report.failed.is_empty());
        assert_eq!(drain(&mut rx), 0);
    }

    #[tokio::test]
    async fn test_startup_twice_fails() {
        // テスト項目: 二重の startup はエラーになる
        // given (前提条件):
        let (controller, publishers, _rx) = setup().await;
        controller.startup(publishers).await.unwrap();

        // when (操作):
        let result = controller.startup(Vec::new()).await;

        // then (期待する結果):
        assert_eq!(result, Err(LifecycleError::AlreadyStarted));
        controller.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_before_startup_fails() {
        // テスト項目: startup 前の shutdown はエラーになり、状態は Idle のまま
        // given (前提条件):
        let controller = LifecycleController::new();

        // when (操作):
        let result = controller.shutdown().await;

        // then (期待する結果):
        assert!(matches!(result, Err(LifecycleError::NotRunning)));
        assert_eq!(controller.state().await, LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_shutdown_twice_fails() {
        // テスト項目: 二度目の shutdown はエラーになる
        // given (前提条件):
        let (controller, publishers, _rx) = setup().await;
        controller.startup(publishers).await.unwrap();
        controller.shutdown().await.unwrap();

        // when (操作):
        let result = controller.shutdown().await;

        // then (期待する結果):
        assert!(matches!(result, Err(LifecycleError::AlreadyShutDown)));
        assert_eq!(controller.state().await, LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_collects_task_failures() {
        // テスト項目: タスクの異常終了は ShutdownReport に集約され、shutdown は成功する
        // given (前提条件):
        let controller = LifecycleController::new();
        controller.startup(Vec::new()).await.unwrap();
        controller
            .spawn("exploding", |token| async move {
                token.cancelled().await;
                panic!("cleanup failed");
            })
            .await
            .unwrap();
        controller
            .spawn("well-behaved", |token| async move {
                token.cancelled().await;
            })
            .await
            .unwrap();

        // when (操作):
        let report = controller.shutdown().await.unwrap();

        // then (期待する結果):
        assert_eq!(report.stopped, vec!["well-behaved"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "exploding");
        assert_eq!(controller.state().await, LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_token_fires_on_shutdown() {
        // テスト項目: shutdown_token は shutdown 開始時にキャンセルされる
        // given (前提条件):
        let controller = LifecycleController::new();
        let token = controller.shutdown_token();
        controller.startup(Vec::new()).await.unwrap();
        assert!(!token.is_cancelled());

        // when (操作):
        controller.shutdown().await.unwrap();

        // then (期待する結果):
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_spawn_requires_running() {
        // テスト項目: Running 以外の状態ではタスクを追加できない
        // given (前提条件):
        let controller = LifecycleController::new();

        // when (操作):
        let before = controller.spawn("early", |_token| async {}).await;
        controller.startup(Vec::new()).await.unwrap();
        controller.shutdown().await.unwrap();
        let after = controller.spawn("late", |_token| async {}).await;

        // then (期待する結果):
        assert_eq!(before, Err(LifecycleError::NotRunning));
        assert_eq!(after, Err(LifecycleError::AlreadyShutDown));
    }
}
