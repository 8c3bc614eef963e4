use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod engines;
mod error;
mod image_loader;
mod language;
mod preprocessing;
mod recognition;
mod server;
mod ui;

#[derive(Parser, Debug)]
#[command(name = "snaptext-ocr-server")]
#[command(about = "Upload an image, preprocess it and extract its text")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Language preselected in the form (eng, chi_sim, jpn, kor, fra, deu)
    #[arg(long, env = "OCR_DEFAULT_LANGUAGE", default_value = "eng")]
    pub default_language: String,

    /// Maximum upload size in bytes (default: 10MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "10485760")]
    pub max_file_size: usize,

    /// Recognition engine to use (cli, leptess)
    #[arg(long, env = "OCR_ENGINE", default_value = "cli")]
    pub engine: String,

    /// Tesseract executable used by the cli engine
    #[arg(long, env = "OCR_TESSERACT_CMD", default_value = "tesseract")]
    pub tesseract_cmd: String,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Number of recognitions allowed to run at the same time
    #[arg(long, env = "OCR_MAX_CONCURRENT", default_value = "1")]
    pub max_concurrent_recognitions: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::try_from(args)?;

    tracing::info!("Starting snaptext-ocr-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}
