use async_trait::async_trait;
use conduit_core::{Command, Notification};

/// 分发器（Dispatcher）
///
/// 应用其余部分唯一需要依赖的入口：
/// - `send`：把命令交给其唯一处理器（外层包裹中间件链），返回强类型结果；
/// - `notify`：把通知广播给所有监听器。
///
/// 处理器、中间件与监听器返回的错误原样透传；引擎自身的失败为
/// [`PipelineError`](conduit_core::PipelineError)，可通过 `downcast_ref` 取回。
/// 该 trait 带有泛型方法，通常以具体实现类型注入使用。
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send<C: Command>(&self, command: C) -> anyhow::Result<C::Output>;

    async fn notify<N: Notification>(&self, notification: N) -> anyhow::Result<()>;
}
