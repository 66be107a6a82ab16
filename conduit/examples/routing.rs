use async_trait::async_trait;
use conduit::{
    AnyCommand, Command, CommandHandler, Dispatcher, Notification, NotificationHandler, Pipeline,
    Registry, Route, RoutingPipeline,
};
use std::sync::Arc;

#[derive(Debug, Command)]
#[command(output = Option<String>)]
struct FindUser {
    tenant: &'static str,
    id: u32,
}

#[derive(Debug, Notification)]
#[notification(name = "CacheInvalidated")]
struct Invalidate;

struct TenantStore(&'static str);

#[async_trait]
impl CommandHandler<FindUser> for TenantStore {
    async fn handle(&self, q: FindUser) -> anyhow::Result<Option<String>> {
        Ok(Some(format!("{}/user-{}", self.0, q.id)))
    }
}

#[async_trait]
impl NotificationHandler<Invalidate> for TenantStore {
    async fn handle(&self, _n: &Invalidate) -> anyhow::Result<()> {
        println!("{}: cache dropped", self.0);
        Ok(())
    }
}

fn tenant_pipeline(name: &'static str) -> anyhow::Result<Pipeline> {
    let store = Arc::new(TenantStore(name));
    let mut registry = Registry::new();
    registry.register_handler::<FindUser, _>(store.clone())?;
    registry.register_listener::<Invalidate, _>(store);
    Ok(Pipeline::new(registry))
}

fn tenant_is(name: &'static str) -> impl Fn(&dyn AnyCommand) -> bool + Send + Sync + 'static {
    move |command: &dyn AnyCommand| {
        command
            .downcast_ref::<FindUser>()
            .is_some_and(|q| q.tenant == name)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let router = RoutingPipeline::default()
        .route(Route::new(tenant_is("acme"), tenant_pipeline("acme")?))
        .route(Route::new(tenant_is("globex"), tenant_pipeline("globex")?));

    let user = router.send(FindUser { tenant: "acme", id: 1 }).await?;
    println!("found: {user:?}");
    let user = router.send(FindUser { tenant: "globex", id: 2 }).await?;
    println!("found: {user:?}");

    // 无路由接受 -> RouteNotFound
    if let Err(err) = router.send(FindUser { tenant: "initech", id: 3 }).await {
        println!("error: {err}");
    }

    // 通知投递到每个租户管道各一次
    router.notify(Invalidate).await?;

    Ok(())
}
