use anyhow::Context as _;
use critiscan_service::{LogFormat, ServiceConfig, create_app};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing in the format selected by LOG_FORMAT
fn init_tracing(log_format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "critiscan_service=debug,critiscan_core=debug,tower_http=debug".into()
    });

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("Failed to read service configuration")?;
    init_tracing(config.log_format);

    let address = config.listen_address();
    info!(
        ideal_body_weight_kg = config.analysis.ideal_body_weight_kg,
        max_upload_bytes = config.max_upload_bytes,
        "Configuration loaded"
    );

    let app = create_app(config);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Server running on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}
