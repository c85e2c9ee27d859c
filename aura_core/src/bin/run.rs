use anyhow::Result;
use aura_core::{Dispatcher, ServerConfig, TradingConfig, TradovateBroker, WebhookServer};
use tradovate_api::ApiConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = utils::init_tracing();

    if let Err(e) = run().await {
        tracing::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    tradovate_api::load_dotenv();
    let api_config = ApiConfig::from_env()?;
    let trading_config = TradingConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    tracing::info!("{api_config:?}");
    tracing::info!("{trading_config:?}");

    // no listener until we hold a token
    let broker = TradovateBroker::connect(
        &api_config,
        server_config.auth_retries,
        server_config.auth_retry_delay(),
    )
    .await?;

    let server = WebhookServer::new(Dispatcher::new(broker, trading_config));
    server.serve(&server_config.bind).await
}
