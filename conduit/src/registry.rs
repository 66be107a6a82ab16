//! 处理器注册表（Registry）
//!
//! 以 `TypeId` 为键保存：
//! - 命令 → 唯一处理器（或显式声明的候选处理器组）；
//! - 通知 → 按注册顺序排列的监听器；
//! - 全局有序的命令中间件与通知中间件列表。
//!
//! 注册阶段通过 `&mut self` 完成，之后移入 `Pipeline` 内的 `Arc<Registry>` 冻结为只读，
//! 并发分发无需加锁。
//!
use crate::middleware::{Middleware, NotificationMiddleware, Output};
use conduit_core::{
    AnyCommand, AnyNotification, BoxCommand, Command, CommandHandler, Notification,
    NotificationHandler, PipelineError, PipelineResult,
};
use futures_util::future::BoxFuture;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::debug;

type HandleFn = Arc<dyn Fn(BoxCommand) -> BoxFuture<'static, anyhow::Result<Output>> + Send + Sync>;

type CommandMatchFn = Arc<dyn Fn(&dyn AnyCommand) -> bool + Send + Sync>;

type ListenFn = Arc<
    dyn for<'a> Fn(&'a dyn AnyNotification) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync,
>;

type NotificationMatchFn = Arc<dyn Fn(&dyn AnyNotification) -> bool + Send + Sync>;

/// 已解析出的命令处理器（类型擦除）
#[derive(Clone)]
pub struct HandlerEntry {
    name: &'static str,
    handle: HandleFn,
    matches: CommandMatchFn,
}

impl HandlerEntry {
    fn new<C, H>(handler: Arc<H>) -> Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handle: HandleFn = {
            let handler = handler.clone();

            Arc::new(move |command: BoxCommand| {
                let handler = handler.clone();

                Box::pin(async move {
                    // 中间件替换成其他类型的命令时才会失败
                    let found = command.command_name();
                    match command.into_any().downcast::<C>() {
                        Ok(command) => handler.handle(*command).await.map(Output::new),
                        Err(_) => Err(PipelineError::TypeMismatch {
                            expected: C::NAME,
                            found,
                        }
                        .into()),
                    }
                })
            })
        };

        let matches: CommandMatchFn = Arc::new(move |command: &dyn AnyCommand| {
            command
                .as_any()
                .downcast_ref::<C>()
                .is_some_and(|command| handler.matches(command))
        });

        Self {
            name: type_name::<H>(),
            handle,
            matches,
        }
    }

    /// 处理器的具体类型名
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn handle(&self, command: BoxCommand) -> BoxFuture<'static, anyhow::Result<Output>> {
        (self.handle)(command)
    }
}

/// 已解析出的通知监听器（类型擦除）
#[derive(Clone)]
pub struct ListenerEntry {
    name: &'static str,
    listen: ListenFn,
    matches: NotificationMatchFn,
}

impl ListenerEntry {
    fn new<N, L>(listener: Arc<L>) -> Self
    where
        N: Notification,
        L: NotificationHandler<N> + 'static,
    {
        let listen: ListenFn = {
            let listener = listener.clone();

            Arc::new(move |notification| {
                let listener = listener.clone();

                Box::pin(async move {
                    match notification.as_any().downcast_ref::<N>() {
                        Some(n) => listener.handle(n).await,
                        None => Err(PipelineError::TypeMismatch {
                            expected: N::NAME,
                            found: notification.notification_name(),
                        }
                        .into()),
                    }
                })
            })
        };

        let matches: NotificationMatchFn = Arc::new(move |notification: &dyn AnyNotification| {
            notification
                .as_any()
                .downcast_ref::<N>()
                .is_some_and(|n| listener.matches(n))
        });

        Self {
            name: type_name::<L>(),
            listen,
            matches,
        }
    }

    /// 监听器的具体类型名
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn listen<'a>(
        &self,
        notification: &'a dyn AnyNotification,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        (self.listen)(notification)
    }
}

struct HandlerSlot {
    command: &'static str,
    // 独占注册（register_handler）不允许再追加候选
    exclusive: bool,
    entries: Vec<HandlerEntry>,
}

struct ListenerSlot {
    notification: &'static str,
    entries: Vec<ListenerEntry>,
}

/// 处理器/监听器/中间件注册表
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<TypeId, HandlerSlot>,
    listeners: HashMap<TypeId, ListenerSlot>,
    middlewares: Vec<Arc<dyn Middleware>>,
    notification_middlewares: Vec<Arc<dyn NotificationMiddleware>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器
    ///
    /// 同一命令类型（精确类型）已有处理器时返回 `DuplicateHandler`，在启动阶段暴露配置错误。
    pub fn register_handler<C, H>(&mut self, handler: Arc<H>) -> PipelineResult<()>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let key = TypeId::of::<C>();

        if self.handlers.contains_key(&key) {
            return Err(PipelineError::DuplicateHandler { command: C::NAME });
        }

        let entry = HandlerEntry::new::<C, H>(handler);
        debug!(command = C::NAME, handler = entry.name(), "command handler registered");

        self.handlers.insert(
            key,
            HandlerSlot {
                command: C::NAME,
                exclusive: true,
                entries: vec![entry],
            },
        );

        Ok(())
    }

    /// 为同一命令类型注册多个候选处理器之一
    ///
    /// 分发时逐个调用 `CommandHandler::matches`：恰好一个匹配则由其处理，
    /// 无匹配返回 `HandlerNotFound`，多个匹配返回 `AmbiguousHandler`。
    /// 与 [`register_handler`](Self::register_handler) 混用于同一命令类型时返回 `DuplicateHandler`。
    pub fn register_candidate<C, H>(&mut self, handler: Arc<H>) -> PipelineResult<()>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let entry = HandlerEntry::new::<C, H>(handler);
        let name = entry.name();

        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(slot) if slot.get().exclusive => {
                return Err(PipelineError::DuplicateHandler { command: C::NAME });
            }
            Entry::Occupied(mut slot) => slot.get_mut().entries.push(entry),
            Entry::Vacant(slot) => {
                slot.insert(HandlerSlot {
                    command: C::NAME,
                    exclusive: false,
                    entries: vec![entry],
                });
            }
        }

        debug!(command = C::NAME, handler = name, "candidate command handler registered");
        Ok(())
    }

    /// 追加通知监听器；同一通知类型可有任意多个
    pub fn register_listener<N, L>(&mut self, listener: Arc<L>) -> &mut Self
    where
        N: Notification,
        L: NotificationHandler<N> + 'static,
    {
        let entry = ListenerEntry::new::<N, L>(listener);
        debug!(notification = N::NAME, listener = entry.name(), "listener registered");

        self.listeners
            .entry(TypeId::of::<N>())
            .or_insert_with(|| ListenerSlot {
                notification: N::NAME,
                entries: Vec::new(),
            })
            .entries
            .push(entry);

        self
    }

    /// 追加命令中间件；先注册者位于链的最外层
    pub fn register_middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// 追加通知中间件；先注册者位于链的最外层
    pub fn register_notification_middleware(
        &mut self,
        middleware: Arc<dyn NotificationMiddleware>,
    ) -> &mut Self {
        self.notification_middlewares.push(middleware);
        self
    }

    /// 解析命令实例对应的唯一处理器
    pub fn resolve_handler<C: Command>(&self, command: &C) -> PipelineResult<HandlerEntry> {
        let Some(slot) = self.handlers.get(&TypeId::of::<C>()) else {
            return Err(PipelineError::HandlerNotFound { command: C::NAME });
        };

        let view: &dyn AnyCommand = command;
        let matching: Vec<&HandlerEntry> =
            slot.entries.iter().filter(|e| (e.matches)(view)).collect();

        match matching.as_slice() {
            [] => Err(PipelineError::HandlerNotFound { command: C::NAME }),
            [only] => Ok((*only).clone()),
            many => Err(PipelineError::AmbiguousHandler {
                command: C::NAME,
                handlers: many.iter().map(|e| e.name()).collect(),
            }),
        }
    }

    /// 解析通知实例的监听器（按注册顺序）；无监听器时返回空列表
    pub fn resolve_listeners<N: Notification>(&self, notification: &N) -> Vec<ListenerEntry> {
        let Some(slot) = self.listeners.get(&TypeId::of::<N>()) else {
            return Vec::new();
        };

        let view: &dyn AnyNotification = notification;
        slot.entries
            .iter()
            .filter(|e| (e.matches)(view))
            .cloned()
            .collect()
    }

    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    pub fn notification_middlewares(&self) -> &[Arc<dyn NotificationMiddleware>] {
        &self.notification_middlewares
    }

    /// 获取已注册的命令名列表（只读视图）
    pub fn registered_commands(&self) -> Vec<&'static str> {
        self.handlers.values().map(|slot| slot.command).collect()
    }

    /// 获取已注册监听器的通知名列表（只读视图）
    pub fn registered_notifications(&self) -> Vec<&'static str> {
        self.listeners.values().map(|slot| slot.notification).collect()
    }
}
