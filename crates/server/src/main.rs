use clap::Parser;

use valuequest_server::{AppState, ServerArgs, build_router, init_db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "valuequest_server=info,tower_http=info".into()),
        )
        .init();

    let args = ServerArgs::parse();
    tracing::info!("data directory: {}", args.data_dir.display());

    let db = init_db(&args.data_dir)?;
    tracing::info!("database initialized");

    let config = args.app_config();
    if !config.auth_enabled() {
        tracing::warn!("AUTH_TOKEN_SECRET not set, authenticated routes will answer 401");
    }
    match config.project_id.as_deref() {
        Some(project) => tracing::info!("accepting ID tokens for project {project}"),
        None => tracing::warn!("FIREBASE_PROJECT_ID not set, token audience is not checked"),
    }

    let base_url = config.base_url.clone();
    let app = build_router(AppState { db, config });

    let addr = args.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("starting server at {base_url} (listening on {addr})");
    axum::serve(listener, app).await?;

    Ok(())
}
