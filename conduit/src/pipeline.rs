//! 进程内管道（Pipeline）
//!
//! `Dispatcher` 的默认实现：
//! - 按命令的精确类型解析处理器，解析失败时不执行任何中间件；
//! - 每次分发构建一条新的中间件链，处理器位于最内层；
//! - 在链的最外层把类型擦除的结果还原为 `C::Output`；
//! - 通知按配置的 [`NotificationStrategy`](crate::strategy::NotificationStrategy) 分发。
//!
use crate::chain;
use crate::config::PipelineConfig;
use crate::dispatcher::Dispatcher;
use crate::middleware::Next;
use crate::registry::Registry;
use crate::strategy;
use async_trait::async_trait;
use bon::Builder;
use conduit_core::{Command, Notification, PipelineError};
use std::any::type_name;
use std::sync::Arc;
use tracing::debug;

#[derive(Builder, Clone)]
pub struct Pipeline {
    #[builder(into)]
    registry: Arc<Registry>,
    #[builder(default)]
    config: PipelineConfig,
}

impl Pipeline {
    /// 使用默认配置创建管道
    pub fn new(registry: impl Into<Arc<Registry>>) -> Self {
        Self::builder().registry(registry).build()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub(crate) fn shares_registry_with(&self, other: &Pipeline) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }

    pub(crate) async fn notify_shared<N: Notification>(
        &self,
        notification: Arc<N>,
    ) -> anyhow::Result<()> {
        let listeners = self.registry.resolve_listeners(&*notification);
        if listeners.is_empty() {
            debug!(notification = N::NAME, "no listeners registered, notification dropped");
            return Ok(());
        }

        let strategy = self.config.notification_strategy;
        debug!(
            notification = N::NAME,
            listeners = listeners.len(),
            ?strategy,
            "dispatching notification"
        );

        strategy::run(strategy, &self.registry, listeners, notification).await
    }
}

#[async_trait]
impl Dispatcher for Pipeline {
    async fn send<C: Command>(&self, command: C) -> anyhow::Result<C::Output> {
        let handler = self.registry.resolve_handler(&command)?;
        debug!(command = C::NAME, handler = handler.name(), "dispatching command");

        let terminal = Next::new(move |command| handler.handle(command));
        let out = chain::compose(self.registry.middlewares(), terminal)
            .run(Box::new(command))
            .await?;

        out.downcast::<C::Output>().map_err(|out| {
            PipelineError::TypeMismatch {
                expected: type_name::<C::Output>(),
                found: out.type_name(),
            }
            .into()
        })
    }

    async fn notify<N: Notification>(&self, notification: N) -> anyhow::Result<()> {
        self.notify_shared(Arc::new(notification)).await
    }
}
