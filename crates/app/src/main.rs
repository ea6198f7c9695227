use netsay_app::runtime;
use netsay_foundation::AppConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn init_logging() -> anyhow::Result<()> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "netsay.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(_guard);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!("Starting netsay");

    let config = AppConfig::load()?;
    tracing::info!(
        listen_addr = %config.listen_addr,
        queue_capacity = config.queue_capacity,
        voice = %config.voice.id,
        "configuration loaded"
    );

    let handle = runtime::start(config).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");
    handle.shutdown().await;
    Ok(())
}
