use std::sync::Arc;

use anyhow::Context;
use domain::{
    dispatches::{self, Services},
    sheets::{GoogleSheets, ServiceAccountKey},
    Catalog, SheetStore,
};
use tokio::net::TcpListener;
use web::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let config = Config::from_env();

    let key = ServiceAccountKey::from_file(&config.credentials_file).with_context(|| {
        format!(
            "Failed to read service account key {}",
            config.credentials_file.display()
        )
    })?;
    let store: Arc<dyn SheetStore> = Arc::new(GoogleSheets::new(&config.sheet_id, key)?);

    if let Err(e) = dispatches::ensure_log(store.as_ref(), &config.dispatch_sheet_name).await {
        tracing::warn!("Could not ensure dispatch log '{}': {}", config.dispatch_sheet_name, e);
    }

    let catalog = Catalog::load(store.as_ref(), &config.inventory()).await;
    tracing::info!("Loaded {} products", catalog.len());

    tokio::fs::create_dir_all(&config.pdf_output_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.pdf_output_dir.display()))?;

    let services = Services::new(
        store,
        config.dispatch_log(),
        catalog,
        config.pdf_output_dir.clone(),
    );
    let app = web::router(AppState { services });

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
