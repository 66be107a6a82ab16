use crate::command::Command;
use async_trait::async_trait;

/// 命令处理器
///
/// 处理器返回的错误原样透传给调用方，引擎不做包装。
#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    async fn handle(&self, command: C) -> anyhow::Result<C::Output>;

    /// 是否接手该命令实例
    ///
    /// 仅在同一命令类型注册了多个候选处理器时才有实际意义（见 `Registry::register_candidate`）；
    /// 独占处理器返回 `false` 时分发结果为 `HandlerNotFound`。
    fn matches(&self, _command: &C) -> bool {
        true
    }
}
