use sogustika::{config::Config, run_app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {:#}", error);
            std::process::exit(1);
        }
    };
    if let Err(error) = run_app(config).await {
        tracing::error!("Error: {:#}", error);
        std::process::exit(1);
    }
}
