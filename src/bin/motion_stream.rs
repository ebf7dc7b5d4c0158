//! Motion stream server
//!
//! Run with: motion-stream --ip 0.0.0.0 --port 8000 [--debug] [--stream]
//!
//! Open `http://<ip>:<port>/` in a browser. The capture source only runs
//! while someone is watching.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use motion_stream::capture::{FrameSource, ReplaySource, SyntheticSource};
use motion_stream::motion::{DebugOverlay, MAX_WORKING_WIDTH};
use motion_stream::{producer, Pipeline, ProducerConfig, ProducerMode, ServerConfig, WebServer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Viewer-gated MJPEG streaming server with motion detection")]
struct Args {
    /// IP address of the device
    #[arg(short, long, env = "MOTION_STREAM_IP")]
    ip: IpAddr,

    /// Ephemeral port number of the server (1024 to 65535)
    #[arg(short = 'o', long, env = "MOTION_STREAM_PORT")]
    port: u16,

    /// Number of frames used to construct the background model
    #[arg(short = 'f', long, env = "MOTION_STREAM_FRAME_COUNT", default_value_t = 32)]
    frame_count: u64,

    /// Draw the timestamp and motion box onto streamed frames
    #[arg(short, long, env = "MOTION_STREAM_DEBUG")]
    debug: bool,

    /// Stream frames directly, skipping motion detection
    #[arg(short, long, env = "MOTION_STREAM_DIRECT")]
    stream: bool,

    /// Path to the page data file
    #[arg(long, env = "MOTION_STREAM_DATAFILE", default_value = "data/data.jsonc")]
    datafile: PathBuf,

    /// `synthetic`, or a directory of images to loop over
    #[arg(long, env = "MOTION_STREAM_SOURCE", default_value = "synthetic")]
    source: String,

    /// Width frames are resized to before processing
    #[arg(
        long,
        env = "MOTION_STREAM_WIDTH",
        default_value_t = 800,
        value_parser = clap::value_parser!(u32).range(1..=MAX_WORKING_WIDTH as i64)
    )]
    width: u32,

    /// TrueType/OpenType font for the debug timestamp (bundled font otherwise)
    #[arg(long, env = "MOTION_STREAM_FONT")]
    font: Option<PathBuf>,

    /// JPEG quality of streamed frames
    #[arg(
        long,
        env = "MOTION_STREAM_JPEG_QUALITY",
        default_value_t = 80,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    jpeg_quality: u8,

    /// Consecutive capture failures before the producer gives up (0 = never)
    #[arg(long, env = "MOTION_STREAM_MAX_CAPTURE_FAILURES", default_value_t = 0)]
    max_capture_failures: u32,

    /// Log output format
    #[arg(long, env = "MOTION_STREAM_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter)
            .init(),
    }
}

fn open_source(spec: &str) -> anyhow::Result<Box<dyn FrameSource>> {
    if spec == "synthetic" {
        return Ok(Box::new(SyntheticSource::new(640, 480)));
    }

    let source =
        ReplaySource::open(spec).with_context(|| format!("cannot open image directory {spec}"))?;
    Ok(Box::new(source))
}

fn producer_config(args: &Args) -> anyhow::Result<ProducerConfig> {
    let overlay = match &args.font {
        Some(path) => DebugOverlay::with_font_file(path)?,
        None => DebugOverlay::new(),
    };

    let mode = if args.stream {
        ProducerMode::Direct
    } else {
        ProducerMode::Detection
    };

    Ok(ProducerConfig::default()
        .mode(mode)
        .working_width(args.width)
        .warmup_frames(args.frame_count)
        .debug(args.debug)
        .overlay(overlay)
        .max_capture_failures(args.max_capture_failures))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let pipeline = Arc::new(Pipeline::new());

    let source = open_source(&args.source)?;
    let producer = producer::spawn(Arc::clone(&pipeline), source, producer_config(&args)?)
        .context("failed to start producer thread")?;

    let config = ServerConfig::default()
        .bind(SocketAddr::new(args.ip, args.port))
        .data_file(&args.datafile)
        .jpeg_quality(args.jpeg_quality);

    tracing::info!(
        addr = %config.bind_addr,
        data_file = %config.data_file.display(),
        source = %args.source,
        "Starting motion stream server"
    );

    let server = WebServer::new(config, pipeline);
    let result = server.run_until(shutdown_signal()).await;

    producer.shutdown();
    result.context("HTTP server failed")
}
