use async_trait::async_trait;
use conduit::{
    BoxCommand, Command, CommandHandler, Dispatcher, LoggingMiddleware, Middleware, Next,
    Notification, NotificationHandler, NotificationStrategy, Output, Pipeline, PipelineConfig,
    PipelineError, Registry,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Command)]
#[command(output = u64)]
struct PlaceOrder {
    sku: String,
    quantity: u32,
}

#[derive(Debug, Notification)]
struct OrderPlaced {
    order_id: u64,
}

#[derive(Debug, Command)]
struct CancelOrder {
    #[allow(dead_code)]
    order_id: u64,
}

struct PlaceOrderHandler;

#[async_trait]
impl CommandHandler<PlaceOrder> for PlaceOrderHandler {
    async fn handle(&self, cmd: PlaceOrder) -> anyhow::Result<u64> {
        println!("PlaceOrder: sku={}, quantity={}", cmd.sku, cmd.quantity);
        Ok(1001)
    }
}

struct SendReceipt;

#[async_trait]
impl NotificationHandler<OrderPlaced> for SendReceipt {
    async fn handle(&self, n: &OrderPlaced) -> anyhow::Result<()> {
        println!("receipt sent for order {}", n.order_id);
        Ok(())
    }
}

struct UpdateStock;

#[async_trait]
impl NotificationHandler<OrderPlaced> for UpdateStock {
    async fn handle(&self, n: &OrderPlaced) -> anyhow::Result<()> {
        println!("stock updated for order {}", n.order_id);
        Ok(())
    }
}

/// 拒绝数量为 0 的下单命令
struct Validate;

#[async_trait]
impl Middleware for Validate {
    async fn invoke(&self, command: BoxCommand, next: Next<'_>) -> anyhow::Result<Output> {
        if let Some(order) = command.downcast_ref::<PlaceOrder>() {
            anyhow::ensure!(order.quantity > 0, "quantity must be positive");
        }
        next.run(command).await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let mut registry = Registry::new();
    registry.register_handler::<PlaceOrder, _>(Arc::new(PlaceOrderHandler))?;
    registry
        .register_listener::<OrderPlaced, _>(Arc::new(SendReceipt))
        .register_listener::<OrderPlaced, _>(Arc::new(UpdateStock))
        .register_middleware(Arc::new(LoggingMiddleware))
        .register_middleware(Arc::new(Validate))
        .register_notification_middleware(Arc::new(LoggingMiddleware));

    let pipeline = Pipeline::builder()
        .registry(registry)
        .config(PipelineConfig {
            notification_strategy: NotificationStrategy::ContinueOnError,
        })
        .build();

    let order_id = pipeline
        .send(PlaceOrder {
            sku: "book-42".into(),
            quantity: 2,
        })
        .await?;
    pipeline.notify(OrderPlaced { order_id }).await?;

    // 中间件拒绝 -> 错误原样返回
    if let Err(err) = pipeline
        .send(PlaceOrder {
            sku: "book-42".into(),
            quantity: 0,
        })
        .await
    {
        println!("rejected: {err}");
    }

    // 未注册的命令 -> HandlerNotFound
    if let Err(err) = pipeline.send(CancelOrder { order_id }).await {
        if let Some(PipelineError::HandlerNotFound { command }) = err.downcast_ref::<PipelineError>() {
            println!("no handler for {command}");
        }
    }

    Ok(())
}
