use std::any::Any;

/// 通知（Notification）
///
/// 广播型的不可变事实，可有零个或多个监听器，不返回结果。
/// 以运行时类型（`TypeId`）作为身份。
pub trait Notification: Send + Sync + 'static {
    /// 通知的稳定名称（用于日志与错误信息）
    const NAME: &'static str;
}

/// 类型擦除后的通知视图，供通知中间件使用。所有 [`Notification`] 自动实现。
pub trait AnyNotification: Any + Send + Sync {
    fn notification_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

impl<N: Notification> AnyNotification for N {
    fn notification_name(&self) -> &'static str {
        N::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn AnyNotification {
    pub fn is<N: Notification>(&self) -> bool {
        self.as_any().is::<N>()
    }

    pub fn downcast_ref<N: Notification>(&self) -> Option<&N> {
        self.as_any().downcast_ref::<N>()
    }
}
