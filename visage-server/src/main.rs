//! visage-server - dual-tier cache gateway for the visage engine.
//!
//! Serves `POST /replicate`: quantized render payloads in, resolved
//! asset URLs out. Cache hits are answered from the in-memory fast
//! store or the on-disk durable store; misses invoke the hosted model
//! and persist the result behind the response.

mod error;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use visage::invoker::{HttpPredictionHost, InvokerConfig, ModelInvoker};
use visage::server::{http, CacheGateway, CacheNamespace, FsDurableStore, HttpAssetFetcher};
use visage::MemoryStore;

use error::AppError;

#[derive(Debug, Parser)]
#[command(name = "visage-server", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8787")]
    listen: SocketAddr,

    /// Deployment identifier of the hosted model (`owner/name`).
    #[arg(long, default_value = "bogini/expression-editor")]
    model: String,

    /// API token for the model host.
    #[arg(long, env = "REPLICATE_API_TOKEN")]
    token: String,

    /// Root directory for the durable asset store.
    /// Defaults to `<user cache dir>/visage/blobs`.
    #[arg(long)]
    blob_dir: Option<PathBuf>,

    /// Public base URL under which the blob directory is served
    /// (CDN or reverse proxy fronting `--blob-dir`).
    #[arg(long, default_value = "http://localhost:8787/blobs")]
    blob_base_url: String,

    /// Fast-store capacity, in entries.
    #[arg(long, default_value_t = 100_000)]
    fast_capacity: u64,

    /// Interval between model-host status polls, in milliseconds.
    #[arg(long, default_value_t = 250)]
    poll_interval_ms: u64,

    /// Ceiling on a single model invocation, in seconds.
    #[arg(long, default_value_t = 120)]
    poll_deadline_secs: u64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_blob_dir(arg: Option<PathBuf>) -> Result<PathBuf, AppError> {
    match arg {
        Some(dir) => Ok(dir),
        None => dirs::cache_dir()
            .map(|dir| dir.join("visage").join("blobs"))
            .ok_or_else(|| {
                AppError::Config("cannot determine a cache directory; pass --blob-dir".to_string())
            }),
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let blob_dir = resolve_blob_dir(args.blob_dir)?;

    let durable =
        FsDurableStore::new(&blob_dir, &args.blob_base_url).map_err(AppError::DurableStore)?;
    let host = HttpPredictionHost::for_deployment(&args.model, &args.token)?;
    let invoker = ModelInvoker::with_config(
        Arc::new(host),
        InvokerConfig {
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            poll_deadline: Duration::from_secs(args.poll_deadline_secs),
        },
    );
    let gateway = Arc::new(CacheGateway::new(
        CacheNamespace::new(&args.model),
        Arc::new(MemoryStore::new(args.fast_capacity)),
        Arc::new(durable),
        Arc::new(invoker),
        Arc::new(HttpAssetFetcher::new().map_err(AppError::AssetFetcher)?),
    ));

    let app = http::router(gateway);
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .map_err(AppError::Bind)?;
    info!(
        listen = %args.listen,
        model = %args.model,
        blob_dir = %blob_dir.display(),
        "visage-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Serve)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(e) = run(Args::parse()).await {
        error!(error = %e, "visage-server failed");
        std::process::exit(1);
    }
}
