use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use ogpshot::render::DEFAULT_AUTHOR;
use ogpshot::{AssetBundle, DeploymentMode, EngineConfig, LaunchProfile, OgpRenderer, RenderOptions};
use tokio::{net::TcpListener, signal};

/// Serve Open Graph preview images rendered with headless Chrome
#[derive(Debug, Parser)]
#[command(name = "ogpshot", version, about)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "OGPSHOT_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Directory holding the icon and the fonts/ folder
    #[arg(long, env = "OGPSHOT_ASSETS", default_value = "public")]
    assets: PathBuf,

    /// Deployment mode: development, production or test
    #[arg(long, env = "OGPSHOT_ENV", default_value = "production")]
    mode: DeploymentMode,

    /// Chrome binary; defaults to the system Chrome in development
    #[arg(long, env = "OGPSHOT_CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Name shown next to the icon
    #[arg(long, env = "OGPSHOT_AUTHOR", default_value = DEFAULT_AUTHOR)]
    author: String,

    /// Upper bound for a single render in milliseconds
    #[arg(long, env = "OGPSHOT_TIMEOUT_MS", default_value_t = 30000)]
    timeout_ms: u64,

    /// Maximum concurrent browsers; 0 means one per CPU, unset means unbounded
    #[arg(long, env = "OGPSHOT_MAX_RENDERS")]
    max_concurrent_renders: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "OGPSHOT_LOG", default_value = "info")]
    log_level: log::LevelFilter,
}

fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .level(log::LevelFilter::Warn)
        .level_for("ogpshot", level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}:{} {} {}",
                record.level(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0),
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                message
            ))
        })
        .chain(std::io::stdout())
        .apply()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logger(cli.log_level).context("Failed to install logger")?;

    let assets = AssetBundle::load(&cli.assets)
        .with_context(|| format!("Failed to load assets from {}", cli.assets.display()))?;

    let config = EngineConfig {
        launch: LaunchProfile::for_mode(cli.mode, cli.chrome_path.clone()),
        timeout_ms: cli.timeout_ms,
        ..Default::default()
    };
    let options = RenderOptions {
        author: cli.author.clone(),
        timeout: Duration::from_millis(cli.timeout_ms),
        max_concurrent: cli
            .max_concurrent_renders
            .map(|n| if n == 0 { num_cpus::get() } else { n }),
    };
    log::info!(
        "Mode: {}, browser: {}, concurrency: {}",
        cli.mode,
        config
            .launch
            .executable
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "auto".to_string()),
        options
            .max_concurrent
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string()),
    );

    let renderer: Arc<OgpRenderer> = Arc::new(OgpRenderer::new(Arc::new(assets), config, options));
    let router = ogpshot::build_router(renderer);

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    log::info!("Listening on {}", cli.bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;
    log::info!("Shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
