//! 中间件（Middleware）
//!
//! 横切关注点（日志、校验、事务、重试、缓存等）以中间件形式包裹在处理器外层：
//! - [`Middleware`]：包裹命令处理器，可查看/替换命令、短路、改写结果或错误；
//! - [`NotificationMiddleware`]：包裹每一次监听器调用；
//! - [`Next`] / [`NotifyNext`]：链中的下一环，按值消费，因此至多执行一次。
//!
//! 中间件与具体命令类型无关，命令与结果均以类型擦除形式传递，需要时再向下转型。
//!
use async_trait::async_trait;
use conduit_core::{AnyNotification, BoxCommand};
use futures_util::future::BoxFuture;
use std::any::{Any, type_name};
use std::fmt;

/// 类型擦除后的命令结果
///
/// 由分发器在链的最外层还原为 `C::Output`；类型不符时返回 `PipelineError::TypeMismatch`。
pub struct Output {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Output {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// 产生该结果的具体类型名
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// 还原为具体类型；失败时原样交还
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let Self { value, type_name } = self;
        match value.downcast::<T>() {
            Ok(v) => Ok(*v),
            Err(value) => Err(Self { value, type_name }),
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

type NextFn<'a> =
    Box<dyn FnOnce(BoxCommand) -> BoxFuture<'a, anyhow::Result<Output>> + Send + 'a>;

/// 命令链中的下一环（内层中间件或最终的处理器）
pub struct Next<'a> {
    inner: NextFn<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: FnOnce(BoxCommand) -> BoxFuture<'a, anyhow::Result<Output>> + Send + 'a,
    {
        Self { inner: Box::new(f) }
    }

    /// 继续执行内层链路
    ///
    /// 传入的命令可以是收到的原命令，也可以是替换后的同类型命令；
    /// 换成其他类型会在处理器处得到 `TypeMismatch`。
    pub fn run(self, command: BoxCommand) -> BoxFuture<'a, anyhow::Result<Output>> {
        (self.inner)(command)
    }
}

/// 命令中间件
///
/// 所有已注册的中间件都会参与每一次 `send`；对不关心的命令直接调用 `next.run(command)` 透传即可。
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn invoke(&self, command: BoxCommand, next: Next<'_>) -> anyhow::Result<Output>;
}

type NotifyFn<'a> = Box<dyn FnOnce() -> BoxFuture<'a, anyhow::Result<()>> + Send + 'a>;

/// 通知链中的下一环（内层中间件或监听器本身）
pub struct NotifyNext<'a> {
    inner: NotifyFn<'a>,
}

impl<'a> NotifyNext<'a> {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'a, anyhow::Result<()>> + Send + 'a,
    {
        Self { inner: Box::new(f) }
    }

    pub fn run(self) -> BoxFuture<'a, anyhow::Result<()>> {
        (self.inner)()
    }
}

/// 通知中间件：包裹每一个监听器的调用
#[async_trait]
pub trait NotificationMiddleware: Send + Sync {
    async fn invoke(
        &self,
        notification: &dyn AnyNotification,
        next: NotifyNext<'_>,
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_downcasts_to_original_type() {
        let out = Output::new(42_u32);

        assert!(out.is::<u32>());
        assert_eq!(out.downcast_ref::<u32>(), Some(&42));
        assert_eq!(out.downcast::<u32>().unwrap(), 42);
    }

    #[test]
    fn output_failed_downcast_hands_value_back() {
        let out = Output::new(String::from("cached"));

        let out = out.downcast::<u32>().unwrap_err();
        assert_eq!(out.type_name(), type_name::<String>());
        assert_eq!(out.downcast::<String>().unwrap(), "cached");
    }
}
