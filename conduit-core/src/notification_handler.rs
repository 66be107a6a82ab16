use crate::notification::Notification;
use async_trait::async_trait;

/// 通知监听器
#[async_trait]
pub trait NotificationHandler<N>: Send + Sync
where
    N: Notification,
{
    async fn handle(&self, notification: &N) -> anyhow::Result<()>;

    /// 返回 `false` 时跳过该通知实例
    fn matches(&self, _notification: &N) -> bool {
        true
    }
}
