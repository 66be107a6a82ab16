//! 以消息为主语的分发写法
//!
//! `command.execute(&dispatcher)` 等价于 `dispatcher.send(command)`，
//! `notification.send(&dispatcher)` 等价于 `dispatcher.notify(notification)`。
//!
use crate::dispatcher::Dispatcher;
use async_trait::async_trait;
use conduit_core::{Command, Notification};

#[async_trait]
pub trait CommandExt: Command + Sized {
    async fn execute<D: Dispatcher>(self, dispatcher: &D) -> anyhow::Result<Self::Output>;
}

#[async_trait]
impl<C: Command> CommandExt for C {
    async fn execute<D: Dispatcher>(self, dispatcher: &D) -> anyhow::Result<C::Output> {
        dispatcher.send(self).await
    }
}

#[async_trait]
pub trait NotificationExt: Notification + Sized {
    async fn send<D: Dispatcher>(self, dispatcher: &D) -> anyhow::Result<()>;
}

#[async_trait]
impl<N: Notification> NotificationExt for N {
    async fn send<D: Dispatcher>(self, dispatcher: &D) -> anyhow::Result<()> {
        dispatcher.notify(self).await
    }
}
