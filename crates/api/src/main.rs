use std::sync::Arc;

use tracing::info;

use pushline_api::app::{build_app, services::AppServices};
use pushline_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pushline_observability::init();

    let config = AppConfig::from_env();
    let services = Arc::new(AppServices::persistent(&config).await?);
    let app = build_app(services);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "pushline api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
