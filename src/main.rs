use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use ig_token_refresh::config::StoreConfig;
use ig_token_refresh::notify::{DisabledNotifier, Notifier, ResendNotifier};
use ig_token_refresh::providers::InstagramRefresher;
use ig_token_refresh::store::{PgTokenStore, SupabaseTokenStore, TokenStore};
use ig_token_refresh::{api, AppState, Config, RefreshPolicy, SharedState, TokenRefreshJob};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ig_token_refresh=info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()?;
    info!("ig-token-refresh v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}:{}", config.host, config.port);

    // Initialize components
    let store = connect_store(&config).await?;
    info!("Token store ready ({})", store.backend());

    let refresher = InstagramRefresher::new(&config.refresh_url, config.http_timeout)
        .context("Failed to set up refresh client")?;

    let notifier: Arc<dyn Notifier> = match &config.alert {
        Some(alert) => {
            info!("Failure alerts will be emailed to {}", alert.to);
            Arc::new(
                ResendNotifier::new(alert, config.http_timeout)
                    .context("Failed to set up alert client")?,
            )
        }
        None => {
            warn!("RESEND_API_KEY or ALERT_EMAIL_TO not set, failure alerts are disabled");
            Arc::new(DisabledNotifier)
        }
    };

    let job = TokenRefreshJob::new(
        config.cron_secret.clone(),
        RefreshPolicy::from_config(&config),
        store,
        Arc::new(refresher),
        notifier,
    );

    // Build shared state
    let state: SharedState = Arc::new(AppState {
        config: config.clone(),
        job,
    });

    // Build router
    let app = api::router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server ready ✓");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> Result<Arc<dyn TokenStore>> {
    match &config.store {
        StoreConfig::Postgres { database_url } => {
            let store = PgTokenStore::new(database_url, &config.token_table).await?;
            store.migrate().await?;
            info!("Database connected and migrated ✓");
            Ok(Arc::new(store))
        }
        StoreConfig::Supabase { url, key } => {
            let store =
                SupabaseTokenStore::new(url, key, &config.token_table, config.http_timeout)?;
            Ok(Arc::new(store))
        }
    }
}
