//! 中介者契约基础库（conduit-core）
//!
//! 定义请求分发引擎两端共享的最小抽象：
//! - 命令（`command`）：恰好一个处理器，返回强类型结果；
//! - 通知（`notification`）：零个或多个监听器，无返回值；
//! - 处理器契约（`command_handler` / `notification_handler`）；
//! - 统一错误（`error`）：解析/注册失败与聚合失败。
//!
//! 本 crate 不包含注册表与管道实现，便于业务代码只依赖契约而不依赖引擎。
//!
pub mod command;
pub mod command_handler;
pub mod error;
pub mod notification;
pub mod notification_handler;

pub use command::{AnyCommand, BoxCommand, Command};
pub use command_handler::CommandHandler;
pub use error::{AggregateError, PipelineError, PipelineResult};
pub use notification::{AnyNotification, Notification};
pub use notification_handler::NotificationHandler;
