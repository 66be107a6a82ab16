//! 引擎统一错误定义
//!
//! 只覆盖引擎自身产生的失败：处理器解析、注册冲突、路由、并行策略的运行时与类型擦除还原。
//! 处理器与中间件的业务错误以 `anyhow::Error` 原样透传，不在此列。
//!
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("handler not found: command={command}")]
    HandlerNotFound { command: &'static str },

    #[error("handler already registered: command={command}")]
    DuplicateHandler { command: &'static str },

    #[error(
        "ambiguous handler: command={command}, matched {} handlers ({})",
        .handlers.len(),
        .handlers.join(", ")
    )]
    AmbiguousHandler {
        command: &'static str,
        handlers: Vec<&'static str>,
    },

    #[error("route not found: command={command}")]
    RouteNotFound { command: &'static str },

    #[error("no tokio runtime available for notification strategy {strategy}")]
    RuntimeUnavailable { strategy: &'static str },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// 注册与解析阶段的 Result 类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;

/// 聚合错误：收集型通知策略下多个监听器的失败
#[derive(Debug, Error)]
#[error("{} error(s)", .errors.len())]
pub struct AggregateError {
    errors: Vec<anyhow::Error>,
}

impl AggregateError {
    pub fn new(errors: Vec<anyhow::Error>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<anyhow::Error> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
