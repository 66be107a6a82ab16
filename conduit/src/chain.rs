//! 中间件链构建
//!
//! 自右向左折叠：以处理器调用作为最内层，从最后注册的中间件开始逐层包裹，
//! 因此最先注册的中间件最先执行，也最后看到结果（洋葱模型）。
//! 每次分发都构建一条新链，只借用共享且不可变的中间件列表。
//!
use crate::middleware::{Middleware, Next, NotificationMiddleware, NotifyNext};
use conduit_core::AnyNotification;
use std::sync::Arc;

pub(crate) fn compose<'a>(middlewares: &'a [Arc<dyn Middleware>], terminal: Next<'a>) -> Next<'a> {
    middlewares.iter().rev().fold(terminal, |next, middleware| {
        Next::new(move |command| middleware.invoke(command, next))
    })
}

pub(crate) fn compose_notification<'a>(
    middlewares: &'a [Arc<dyn NotificationMiddleware>],
    notification: &'a dyn AnyNotification,
    terminal: NotifyNext<'a>,
) -> NotifyNext<'a> {
    middlewares.iter().rev().fold(terminal, |next, middleware| {
        NotifyNext::new(move || middleware.invoke(notification, next))
    })
}
