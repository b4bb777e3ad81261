use anyhow::Result;
use devhealth::dispatch::LogDispatcher;
use devhealth::sink::SqliteSink;
use devhealth::source::SysinfoSource;
use devhealth::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!(name = version::NAME, version = version::VERSION, "starting");

    let app_config = config::AppConfig::load()?;

    let sink = Arc::new(SqliteSink::connect(&app_config.database.path).await?);
    sink.init().await?;

    let source = Arc::new(SysinfoSource::new(&app_config.monitoring.storage_path));
    let mut supervisor =
        MonitorSupervisor::new(source, sink).with_dispatcher(Arc::new(LogDispatcher));
    supervisor.start_all(&app_config)?;

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    supervisor.stop_all().await;

    Ok(())
}
