#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use pool_schedule::{EngineConfig, ScheduleCatalog, http_api, load_catalog_from_json};
    use tracing_subscriber::EnvFilter;

    let config = EngineConfig::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level)?)
        .init();

    let catalog = match (&config.sqlite_path, &config.catalog_path) {
        (Some(path), _) => {
            use pool_schedule::{CatalogStore, SqliteCatalogStore};
            tracing::info!(path = %path.display(), "loading catalog from sqlite");
            SqliteCatalogStore::new(path)?.open_catalog()?
        }
        (_, Some(path)) => {
            tracing::info!(path = %path.display(), "loading catalog from json");
            load_catalog_from_json(path)?
        }
        _ => {
            tracing::warn!("no catalog configured; starting with an empty catalog");
            ScheduleCatalog::default()
        }
    };

    let addr = config.socket_addr()?;
    let state = http_api::AppState::new(catalog)
        .with_horizon_days(config.horizon_days)
        .with_max_span_days(config.max_span_days);
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
