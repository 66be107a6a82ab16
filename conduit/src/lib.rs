//! 进程内中介者引擎（conduit）
//!
//! 调用方只依赖 [`Dispatcher`]，发出强类型的命令与通知，而不持有处理它们的对象：
//! - 注册表（`registry`）按运行时类型解析命令的唯一处理器与通知的全部监听器；
//! - 中间件（`middleware`）与链构建（`chain`）把横切关注点按注册顺序包裹在处理器外层；
//! - 管道（`pipeline`）是默认分发器，路由分发器（`routing`）在多个管道间按谓词选择；
//! - 通知按配置的执行策略（`strategy`）分发，默认快速失败。
//!
//! 典型用法：
//! 1. 定义命令/通知（可使用 `#[derive(Command)]`、`#[derive(Notification)]`）及其处理器；
//! 2. 在启动阶段填充 [`Registry`]，注册冲突会立即以 `DuplicateHandler` 报错；
//! 3. 以注册表构建 [`Pipeline`]，此后注册表只读，可在任意并发调用方之间共享；
//! 4. 通过 `send` / `notify` 分发，或以消息为主语写作 `command.execute(&pipeline)`。
//!
mod chain;
pub mod config;
pub mod dispatcher;
pub mod ext;
pub mod logging;
pub mod middleware;
pub mod pipeline;
pub mod registry;
pub mod routing;
pub mod strategy;

pub use conduit_core::{
    AggregateError, AnyCommand, AnyNotification, BoxCommand, Command, CommandHandler,
    Notification, NotificationHandler, PipelineError, PipelineResult,
};
pub use conduit_macros::{Command, Notification};

pub use config::PipelineConfig;
pub use dispatcher::Dispatcher;
pub use ext::{CommandExt, NotificationExt};
pub use logging::LoggingMiddleware;
pub use middleware::{Middleware, Next, NotificationMiddleware, NotifyNext, Output};
pub use pipeline::Pipeline;
pub use registry::Registry;
pub use routing::{Route, RoutingPipeline};
pub use strategy::NotificationStrategy;

// 允许在本 crate 内部通过 ::conduit 进行自引用，
// 以便派生宏在本 crate 的单元测试中也能解析到 ::conduit 路径。
extern crate self as conduit;
