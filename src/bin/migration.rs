use anyhow::Context;
use storefront_api::{config, migrator};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("loading configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!(database = %redact(cfg.database_url()), "Applying storefront migrations");
    migrator::run_migration(cfg.database_url()).await
}

fn redact(url: &str) -> String {
    match url.split_once('@') {
        Some((_, host)) => format!("***@{}", host),
        None => url.to_string(),
    }
}
