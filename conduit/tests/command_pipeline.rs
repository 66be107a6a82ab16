use async_trait::async_trait;
use conduit::{
    BoxCommand, Command, CommandHandler, Dispatcher, LoggingMiddleware, Middleware, Next, Output,
    Pipeline, PipelineError, Registry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

type Trace = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone, Command)]
#[command(output = String)]
struct Greet {
    name: String,
}

#[derive(Default)]
struct GreetHandler {
    calls: Arc<AtomicUsize>,
    trace: Trace,
}

#[async_trait]
impl CommandHandler<Greet> for GreetHandler {
    async fn handle(&self, command: Greet) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.trace.lock().unwrap().push("handler".into());
        Ok(format!("hello, {}", command.name))
    }
}

#[derive(Debug, Command)]
struct Unhandled;

#[derive(Debug, thiserror::Error)]
#[error("rejected: {0}")]
struct Rejected(&'static str);

#[derive(Debug, Command)]
#[command(output = u32)]
struct Withdraw {
    amount: u32,
}

struct WithdrawHandler;

#[async_trait]
impl CommandHandler<Withdraw> for WithdrawHandler {
    async fn handle(&self, command: Withdraw) -> anyhow::Result<u32> {
        if command.amount > 100 {
            return Err(Rejected("insufficient funds").into());
        }
        Ok(100 - command.amount)
    }
}

#[derive(Debug, Command)]
#[command(output = &'static str)]
struct Pay {
    method: &'static str,
}

struct CardPay;
struct WalletPay;
struct AnyPay;

#[async_trait]
impl CommandHandler<Pay> for CardPay {
    async fn handle(&self, _command: Pay) -> anyhow::Result<&'static str> {
        Ok("card")
    }

    fn matches(&self, command: &Pay) -> bool {
        command.method == "card"
    }
}

#[async_trait]
impl CommandHandler<Pay> for WalletPay {
    async fn handle(&self, _command: Pay) -> anyhow::Result<&'static str> {
        Ok("wallet")
    }

    fn matches(&self, command: &Pay) -> bool {
        command.method == "wallet"
    }
}

#[async_trait]
impl CommandHandler<Pay> for AnyPay {
    async fn handle(&self, _command: Pay) -> anyhow::Result<&'static str> {
        Ok("any")
    }
}

/// 在 next 前后各记录一次
struct LogAround {
    id: &'static str,
    trace: Trace,
    calls: Arc<AtomicUsize>,
}

impl LogAround {
    fn new(id: &'static str, trace: &Trace) -> Self {
        Self {
            id,
            trace: trace.clone(),
            calls: Arc::default(),
        }
    }
}

#[async_trait]
impl Middleware for LogAround {
    async fn invoke(&self, command: BoxCommand, next: Next<'_>) -> anyhow::Result<Output> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.trace.lock().unwrap().push(format!("before {}", self.id));
        let out = next.run(command).await;
        self.trace.lock().unwrap().push(format!("after {}", self.id));
        out
    }
}

/// 命中 Greet 时直接返回缓存结果，不再调用内层
struct GreetCache;

#[async_trait]
impl Middleware for GreetCache {
    async fn invoke(&self, command: BoxCommand, next: Next<'_>) -> anyhow::Result<Output> {
        if command.is::<Greet>() {
            return Ok(Output::new(String::from("cached")));
        }
        next.run(command).await
    }
}

/// 在进入处理器前改写命令
struct Shout;

#[async_trait]
impl Middleware for Shout {
    async fn invoke(&self, mut command: BoxCommand, next: Next<'_>) -> anyhow::Result<Output> {
        if let Some(greet) = command.downcast_mut::<Greet>() {
            greet.name = greet.name.to_uppercase();
        }
        next.run(command).await
    }
}

/// 把结果替换成错误的类型
struct WrongResult;

#[async_trait]
impl Middleware for WrongResult {
    async fn invoke(&self, _command: BoxCommand, _next: Next<'_>) -> anyhow::Result<Output> {
        Ok(Output::new(42_u8))
    }
}

/// 把处理器错误转换为兜底结果
struct Fallback;

#[async_trait]
impl Middleware for Fallback {
    async fn invoke(&self, command: BoxCommand, next: Next<'_>) -> anyhow::Result<Output> {
        match next.run(command).await {
            Err(err) if err.is::<Rejected>() => Ok(Output::new(0_u32)),
            other => other,
        }
    }
}

fn greet(name: &str) -> Greet {
    Greet { name: name.into() }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn send_invokes_the_single_handler_exactly_once() {
    let handler = Arc::new(GreetHandler::default());
    let mut registry = Registry::new();
    registry
        .register_handler::<Greet, _>(handler.clone())
        .unwrap();
    let pipeline = Pipeline::new(registry);

    let out = pipeline.send(greet("alice")).await.unwrap();

    assert_eq!(out, "hello, alice");
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn middlewares_wrap_handler_in_onion_order() {
    let trace = Trace::default();
    let a = Arc::new(LogAround::new("A", &trace));
    let b = Arc::new(LogAround::new("B", &trace));

    let mut registry = Registry::new();
    registry
        .register_handler::<Greet, _>(Arc::new(GreetHandler {
            trace: trace.clone(),
            ..Default::default()
        }))
        .unwrap();
    registry
        .register_middleware(a.clone())
        .register_middleware(b.clone());
    let pipeline = Pipeline::new(registry);

    pipeline.send(greet("bob")).await.unwrap();

    assert_eq!(
        *trace.lock().unwrap(),
        ["before A", "before B", "handler", "after B", "after A"]
    );
    assert_eq!(a.calls.load(Ordering::SeqCst), 1);
    assert_eq!(b.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn short_circuit_skips_inner_middlewares_and_handler() {
    let trace = Trace::default();
    let outer = Arc::new(LogAround::new("outer", &trace));
    let inner = Arc::new(LogAround::new("inner", &trace));
    let handler = Arc::new(GreetHandler {
        trace: trace.clone(),
        ..Default::default()
    });

    let mut registry = Registry::new();
    registry
        .register_handler::<Greet, _>(handler.clone())
        .unwrap();
    registry
        .register_middleware(outer.clone())
        .register_middleware(Arc::new(GreetCache))
        .register_middleware(inner.clone());
    let pipeline = Pipeline::new(registry);

    let out = pipeline.send(greet("carol")).await.unwrap();

    assert_eq!(out, "cached");
    assert_eq!(*trace.lock().unwrap(), ["before outer", "after outer"]);
    assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_handler_fails_before_any_middleware() {
    let trace = Trace::default();
    let spy = Arc::new(LogAround::new("spy", &trace));

    let mut registry = Registry::new();
    registry.register_middleware(spy.clone());
    let pipeline = Pipeline::new(registry);

    let err = pipeline.send(Unhandled).await.unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::HandlerNotFound { command }) => assert_eq!(*command, "Unhandled"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    assert!(trace.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_registration_fails_at_registration_time() {
    let mut registry = Registry::new();
    registry
        .register_handler::<Greet, _>(Arc::new(GreetHandler::default()))
        .unwrap();

    let err = registry
        .register_handler::<Greet, _>(Arc::new(GreetHandler::default()))
        .unwrap_err();

    assert!(matches!(err, PipelineError::DuplicateHandler { command: "Greet" }));
    assert_eq!(registry.registered_commands(), ["Greet"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn handler_errors_propagate_unwrapped() {
    let mut registry = Registry::new();
    registry
        .register_handler::<Withdraw, _>(Arc::new(WithdrawHandler))
        .unwrap();
    registry.register_middleware(Arc::new(LoggingMiddleware));
    let pipeline = Pipeline::new(registry);

    let err = pipeline.send(Withdraw { amount: 500 }).await.unwrap_err();

    let rejected = err.downcast_ref::<Rejected>().expect("original error type");
    assert_eq!(rejected.0, "insufficient funds");
    assert_eq!(err.to_string(), "rejected: insufficient funds");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn middleware_may_translate_failures() {
    let mut registry = Registry::new();
    registry
        .register_handler::<Withdraw, _>(Arc::new(WithdrawHandler))
        .unwrap();
    registry.register_middleware(Arc::new(Fallback));
    let pipeline = Pipeline::new(registry);

    assert_eq!(pipeline.send(Withdraw { amount: 500 }).await.unwrap(), 0);
    assert_eq!(pipeline.send(Withdraw { amount: 30 }).await.unwrap(), 70);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn middleware_may_rewrite_the_command() {
    let mut registry = Registry::new();
    registry
        .register_handler::<Greet, _>(Arc::new(GreetHandler::default()))
        .unwrap();
    registry.register_middleware(Arc::new(Shout));
    let pipeline = Pipeline::new(registry);

    assert_eq!(pipeline.send(greet("dave")).await.unwrap(), "hello, DAVE");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn result_of_wrong_type_is_a_type_mismatch() {
    let mut registry = Registry::new();
    registry
        .register_handler::<Greet, _>(Arc::new(GreetHandler::default()))
        .unwrap();
    registry.register_middleware(Arc::new(WrongResult));
    let pipeline = Pipeline::new(registry);

    let err = pipeline.send(greet("erin")).await.unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::TypeMismatch { expected, found }) => {
            assert!(expected.contains("String"));
            assert_eq!(*found, "u8");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_dispatch_of_same_command_is_stable() {
    let mut registry = Registry::new();
    registry
        .register_handler::<Greet, _>(Arc::new(GreetHandler::default()))
        .unwrap();
    registry.register_middleware(Arc::new(LoggingMiddleware));
    let pipeline = Pipeline::new(registry);

    let command = greet("frank");
    let first = pipeline.send(command.clone()).await.unwrap();
    let second = pipeline.send(command).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatch_is_safe() {
    let trace = Trace::default();
    let spy = Arc::new(LogAround::new("spy", &trace));
    let handler = Arc::new(GreetHandler::default());

    let mut registry = Registry::new();
    registry
        .register_handler::<Greet, _>(handler.clone())
        .unwrap();
    registry.register_middleware(spy.clone());
    let pipeline = Arc::new(Pipeline::new(registry));

    let mut set = JoinSet::new();
    for i in 0..100 {
        let pipeline = pipeline.clone();
        set.spawn(async move { pipeline.send(greet(&format!("u{i}"))).await.unwrap() });
    }
    let mut results = Vec::new();
    while let Some(res) = set.join_next().await {
        results.push(res.unwrap());
    }

    assert_eq!(results.len(), 100);
    assert!(results.contains(&"hello, u0".to_string()));
    assert!(results.contains(&"hello, u99".to_string()));
    assert_eq!(handler.calls.load(Ordering::SeqCst), 100);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn candidates_are_selected_by_their_predicate() {
    let mut registry = Registry::new();
    registry.register_candidate::<Pay, _>(Arc::new(CardPay)).unwrap();
    registry.register_candidate::<Pay, _>(Arc::new(WalletPay)).unwrap();
    let pipeline = Pipeline::new(registry);

    assert_eq!(pipeline.send(Pay { method: "card" }).await.unwrap(), "card");
    assert_eq!(pipeline.send(Pay { method: "wallet" }).await.unwrap(), "wallet");

    let err = pipeline.send(Pay { method: "cash" }).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::HandlerNotFound { command: "Pay" })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_candidates_fail_as_ambiguous() {
    let trace = Trace::default();
    let spy = Arc::new(LogAround::new("spy", &trace));

    let mut registry = Registry::new();
    registry.register_candidate::<Pay, _>(Arc::new(CardPay)).unwrap();
    registry.register_candidate::<Pay, _>(Arc::new(AnyPay)).unwrap();
    registry.register_middleware(spy.clone());
    let pipeline = Pipeline::new(registry);

    assert_eq!(pipeline.send(Pay { method: "wallet" }).await.unwrap(), "any");

    let err = pipeline.send(Pay { method: "card" }).await.unwrap_err();
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::AmbiguousHandler { command, handlers }) => {
            assert_eq!(*command, "Pay");
            assert_eq!(handlers.len(), 2);
            assert!(err.to_string().contains("matched 2 handlers"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // 解析失败时中间件不执行
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exclusive_handler_that_declines_is_not_found() {
    let mut registry = Registry::new();
    registry.register_handler::<Pay, _>(Arc::new(CardPay)).unwrap();
    let pipeline = Pipeline::new(registry);

    let err = pipeline.send(Pay { method: "wallet" }).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::HandlerNotFound { .. })
    ));
}
