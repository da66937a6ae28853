use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;

use chartshot::server::{self, AppState};
use chartshot::{RenderConfig, Viewport};

/// Chart rendering service: declarative chart specs in, PNG images out.
#[derive(Parser, Debug)]
#[command(name = "chartshot", version, about)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Raster width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Raster height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Readiness deadline in milliseconds
    #[arg(long, default_value_t = 8000)]
    deadline_ms: u64,

    /// Readiness poll interval in milliseconds (capped at 100)
    #[arg(long, default_value_t = 50)]
    poll_ms: u64,

    /// Settle delay between readiness and capture, in milliseconds
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,
}

impl Args {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            viewport: Viewport {
                width: self.width,
                height: self.height,
            },
            poll_interval: Duration::from_millis(self.poll_ms.min(100)),
            render_deadline: Duration::from_millis(self.deadline_ms),
            settle_delay: Duration::from_millis(self.settle_ms),
            ..RenderConfig::default()
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // The fmt subscriber's log bridge also picks up the library's `log` records.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let state = AppState {
        config: args.render_config(),
    };

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Chart service running on {addr}");
    axum::serve(listener, server::router(state))
        .await
        .context("server terminated")?;

    Ok(())
}
