//! 通知执行策略
//!
//! 决定同一通知的多个监听器如何执行、失败如何上报：
//! - 顺序执行：`StopOnError`（默认，快速失败）、`ContinueOnError`（全部执行后聚合失败）；
//! - 并行执行（每个监听器一个 tokio 任务）：`ParallelWhenAll`、`ParallelWhenAny`、`ParallelNoWait`。
//!   在 tokio 运行时之外调用时返回 `PipelineError::RuntimeUnavailable`，不会 panic。
//!
//! 每个监听器的调用都包裹在通知中间件链中。
//!
use crate::chain;
use crate::middleware::NotifyNext;
use crate::registry::{ListenerEntry, Registry};
use conduit_core::{AggregateError, AnyNotification, Notification, PipelineError};
use futures_util::future;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStrategy {
    /// 依次执行；首个失败立即返回该错误，其后的监听器不再执行
    #[default]
    StopOnError,
    /// 依次执行全部监听器；失败收集为 [`AggregateError`]
    ContinueOnError,
    /// 并行执行并等待全部完成；失败收集为 [`AggregateError`]
    ParallelWhenAll,
    /// 并行执行，任一完成即返回；此前已结束任务的失败收集为 [`AggregateError`]，
    /// 其余任务在后台继续运行
    ParallelWhenAny,
    /// 并行执行且立即返回；失败只能记录日志
    ParallelNoWait,
}

impl NotificationStrategy {
    /// 与配置文件中一致的名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::StopOnError => "stop_on_error",
            Self::ContinueOnError => "continue_on_error",
            Self::ParallelWhenAll => "parallel_when_all",
            Self::ParallelWhenAny => "parallel_when_any",
            Self::ParallelNoWait => "parallel_no_wait",
        }
    }
}

/// 在通知中间件链中执行单个监听器
pub(crate) async fn deliver(
    registry: &Registry,
    listener: &ListenerEntry,
    notification: &dyn AnyNotification,
) -> anyhow::Result<()> {
    let terminal = NotifyNext::new(move || listener.listen(notification));
    chain::compose_notification(registry.notification_middlewares(), notification, terminal)
        .run()
        .await
}

pub(crate) async fn run<N: Notification>(
    strategy: NotificationStrategy,
    registry: &Arc<Registry>,
    listeners: Vec<ListenerEntry>,
    notification: Arc<N>,
) -> anyhow::Result<()> {
    match strategy {
        NotificationStrategy::StopOnError => {
            for listener in &listeners {
                if let Err(err) = deliver(registry, listener, &*notification).await {
                    warn!(
                        notification = N::NAME,
                        listener = listener.name(),
                        error = %err,
                        "listener failed, remaining listeners skipped"
                    );
                    return Err(err);
                }
            }
            Ok(())
        }
        NotificationStrategy::ContinueOnError => {
            let mut errors = Vec::new();
            for listener in &listeners {
                if let Err(err) = deliver(registry, listener, &*notification).await {
                    warn!(notification = N::NAME, listener = listener.name(), error = %err, "listener failed");
                    errors.push(err);
                }
            }
            aggregate(errors)
        }
        NotificationStrategy::ParallelWhenAll => {
            let runtime = current_runtime(strategy)?;
            let mut errors = Vec::new();
            for handle in spawn_all(&runtime, registry, listeners, notification) {
                collect(handle.await, &mut errors);
            }
            aggregate(errors)
        }
        NotificationStrategy::ParallelWhenAny => {
            let runtime = current_runtime(strategy)?;
            let handles = spawn_all(&runtime, registry, listeners, notification);
            if handles.is_empty() {
                return Ok(());
            }

            let mut errors = Vec::new();
            let (first, _index, remaining) = future::select_all(handles).await;
            collect(first, &mut errors);
            for handle in remaining {
                if handle.is_finished() {
                    collect(handle.await, &mut errors);
                }
            }
            aggregate(errors)
        }
        NotificationStrategy::ParallelNoWait => {
            let runtime = current_runtime(strategy)?;
            for listener in listeners {
                let registry = registry.clone();
                let notification = notification.clone();
                runtime.spawn(async move {
                    if let Err(err) = deliver(&registry, &listener, &*notification).await {
                        warn!(
                            notification = N::NAME,
                            listener = listener.name(),
                            error = %err,
                            "detached listener failed"
                        );
                    }
                });
            }
            Ok(())
        }
    }
}

/// 并行策略只能在 tokio 运行时内执行
fn current_runtime(strategy: NotificationStrategy) -> Result<Handle, PipelineError> {
    Handle::try_current().map_err(|_| PipelineError::RuntimeUnavailable {
        strategy: strategy.name(),
    })
}

fn spawn_all<N: Notification>(
    runtime: &Handle,
    registry: &Arc<Registry>,
    listeners: Vec<ListenerEntry>,
    notification: Arc<N>,
) -> Vec<JoinHandle<anyhow::Result<()>>> {
    listeners
        .into_iter()
        .map(|listener| {
            let registry = registry.clone();
            let notification = notification.clone();
            runtime.spawn(async move {
                let result = deliver(&registry, &listener, &*notification).await;
                if let Err(err) = &result {
                    warn!(notification = N::NAME, listener = listener.name(), error = %err, "listener failed");
                }
                result
            })
        })
        .collect()
}

fn collect(
    joined: Result<anyhow::Result<()>, JoinError>,
    errors: &mut Vec<anyhow::Error>,
) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(err)) => errors.push(err),
        Err(join_err) => errors.push(join_err.into()),
    }
}

fn aggregate(errors: Vec<anyhow::Error>) -> anyhow::Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AggregateError::new(errors).into())
    }
}
