//! 路由分发器（RoutingPipeline）
//!
//! 按谓词把命令路由到不同的 [`Pipeline`]，例如读写分离、按租户拆分注册表：
//! - `send`：交给首个谓词接受该命令的路由，均不接受时返回 `RouteNotFound`；
//! - `notify`：按路由顺序投递给每个不同的管道（按注册表去重），遇到首个失败即返回。
//!
use crate::dispatcher::Dispatcher;
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use conduit_core::{AnyCommand, Command, Notification, PipelineError};
use std::sync::Arc;
use tracing::debug;

type RoutePredicate = Arc<dyn Fn(&dyn AnyCommand) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Route {
    predicate: RoutePredicate,
    pipeline: Pipeline,
}

impl Route {
    pub fn new<F>(predicate: F, pipeline: Pipeline) -> Self
    where
        F: Fn(&dyn AnyCommand) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            pipeline,
        }
    }

    /// 只接受命令类型 `C` 的路由
    pub fn command<C: Command>(pipeline: Pipeline) -> Self {
        Self::new(|command: &dyn AnyCommand| command.as_any().is::<C>(), pipeline)
    }

    pub fn accepts(&self, command: &dyn AnyCommand) -> bool {
        (self.predicate)(command)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

/// 按路由谓词在多个管道间分发
///
/// 通知以注册表为单位去重：多个管道共享同一个 `Arc<Registry>` 时，同一批监听器只执行一次，
/// 使用路由顺序中首个该注册表管道的 [`PipelineConfig`](crate::config::PipelineConfig)，
/// 后续管道的通知策略不参与通知分发（命令分发仍使用各自的管道）。
#[derive(Clone, Default)]
pub struct RoutingPipeline {
    routes: Vec<Route>,
}

impl RoutingPipeline {
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
        }
    }

    /// 追加路由；先追加者优先匹配
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    fn distinct_pipelines(&self) -> Vec<&Pipeline> {
        let mut distinct: Vec<&Pipeline> = Vec::new();
        for route in &self.routes {
            if !distinct.iter().any(|p| p.shares_registry_with(&route.pipeline)) {
                distinct.push(&route.pipeline);
            }
        }
        distinct
    }
}

#[async_trait]
impl Dispatcher for RoutingPipeline {
    async fn send<C: Command>(&self, command: C) -> anyhow::Result<C::Output> {
        let view: &dyn AnyCommand = &command;
        let Some(route) = self.routes.iter().find(|route| route.accepts(view)) else {
            return Err(PipelineError::RouteNotFound { command: C::NAME }.into());
        };
        debug!(command = C::NAME, "command routed");

        route.pipeline.send(command).await
    }

    async fn notify<N: Notification>(&self, notification: N) -> anyhow::Result<()> {
        let notification = Arc::new(notification);
        for pipeline in self.distinct_pipelines() {
            pipeline.notify_shared(notification.clone()).await?;
        }
        Ok(())
    }
}
