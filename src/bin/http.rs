use feed_tree::config::DEFAULT_LOG_FILTER;
use feed_tree::http_api::{self, AppState};
use feed_tree::{Feed, ServerConfig};
use tracing_subscriber::{EnvFilter, fmt};

fn install_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(feature = "sqlite")]
fn app_state(config: &ServerConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    use feed_tree::{FeedStore, SqliteFeedStore};
    use std::sync::Arc;

    let Some(path) = &config.db_path else {
        return Ok(AppState::new(Feed::new()));
    };
    let store = SqliteFeedStore::new(path)?;
    let feed = store.load_feed()?.unwrap_or_default();
    tracing::info!(path = %path.display(), instances = feed.len(), "serving stored feed");
    Ok(AppState::with_store(feed, Arc::new(store)))
}

#[cfg(not(feature = "sqlite"))]
fn app_state(config: &ServerConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    if config.db_path.is_some() {
        tracing::warn!("FEED_TREE_DB is set but the `sqlite` feature is disabled");
    }
    Ok(AppState::new(Feed::new()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    install_tracing();
    let config = ServerConfig::from_env()?;
    let state = app_state(&config)?;
    http_api::serve(config.addr, state).await?;
    Ok(())
}
