//! 日志中间件
//!
//! 以 `tracing` 事件记录每次命令处理与监听器调用的名称、耗时与结果，
//! 结果与错误原样向外传递。
//!
use crate::middleware::{Middleware, Next, NotificationMiddleware, NotifyNext, Output};
use async_trait::async_trait;
use conduit_core::{AnyNotification, BoxCommand};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn invoke(&self, command: BoxCommand, next: Next<'_>) -> anyhow::Result<Output> {
        let name = command.command_name();
        let started = Instant::now();

        let out = next.run(command).await;
        let elapsed = started.elapsed();
        match &out {
            Ok(_) => debug!(command = name, ?elapsed, "command handled"),
            Err(err) => warn!(command = name, ?elapsed, error = %err, "command failed"),
        }

        out
    }
}

#[async_trait]
impl NotificationMiddleware for LoggingMiddleware {
    async fn invoke(
        &self,
        notification: &dyn AnyNotification,
        next: NotifyNext<'_>,
    ) -> anyhow::Result<()> {
        let name = notification.notification_name();
        let started = Instant::now();

        let out = next.run().await;
        let elapsed = started.elapsed();
        match &out {
            Ok(()) => debug!(notification = name, ?elapsed, "listener finished"),
            Err(err) => warn!(notification = name, ?elapsed, error = %err, "listener failed"),
        }

        out
    }
}
