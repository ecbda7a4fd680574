mod app;
mod auth;
mod config;
mod error;
mod extract;
mod jobs;
mod questions;
mod state;
mod warehouse;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "interview_gateway=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init()?;
    tracing::info!(
        host = %state.config.warehouse.host,
        catalog = %state.config.warehouse.catalog,
        schema = %state.config.warehouse.schema,
        job_id = state.config.jobs.job_id,
        "configuration loaded"
    );

    app::serve(app::build_app(state)).await
}
