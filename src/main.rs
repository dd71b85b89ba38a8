use anyhow::{anyhow, Context as _, Result};
use clap::{ArgGroup, Parser};
use snap_predict::config::Config;
use snap_predict::device_camera::impl_fake::DeviceCameraFake;
use snap_predict::device_display::impl_console::DeviceDisplayConsole;
use snap_predict::library::logger::impl_tracing::LoggerTracing;
use snap_predict::library::logger::interface::Logger;
use snap_predict::pipeline::Pipeline;
use snap_predict::render::render;
use snap_predict::result_channel::core::State;
use snap_predict::transfer::impl_http::HttpTransport;
use snap_predict::transfer::outcome::TransferOutcome;
use snap_predict::transfer::request::ModelSelector;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DISPLAY_WIDTH: usize = 48;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "snap-predict")]
#[command(about = "Send an image to a prediction endpoint and show the result", long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "capture"])))]
struct Cli {
    /// Image file to upload
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,

    /// Capture a frame from the camera instead of reading a file
    #[arg(long, short = 'c')]
    capture: bool,

    /// Model the endpoint should use (cnn, mobilenet, resnet)
    #[arg(long, short = 'm')]
    model: Option<ModelSelector>,

    /// Prediction endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Attempts per request, including the first
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Enable verbose debug output
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.transfer.max_attempts = max_attempts;
        }
        if let Some(secs) = self.timeout_secs {
            config.transfer.request_timeout = Duration::from_secs(secs);
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("failed to load .env");
        }
    }

    let mut config = Config::from_env().context("invalid SNAP_PREDICT_* environment")?;
    cli.apply(&mut config);
    config.check().context("invalid configuration")?;

    let model = cli.model.unwrap_or(config.default_model);
    let logger: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerTracing::new());
    let transport = HttpTransport::new(CONNECT_TIMEOUT).context("failed to build HTTP client")?;
    let pipeline = Pipeline::new(config, Arc::new(transport), logger.clone());

    let _ = logger.info(&format!(
        "Predicting with {} at {} ({} attempt(s), {:?} per attempt)",
        model,
        pipeline.config().endpoint,
        pipeline.config().transfer.max_attempts,
        pipeline.config().transfer.request_timeout
    ));

    let mut display = DeviceDisplayConsole::stdout(DISPLAY_WIDTH);
    let mut states = pipeline.channel().subscribe();

    let submitted = match &cli.file {
        Some(path) => pipeline.submit_path(path, model),
        None => {
            let camera = DeviceCameraFake::new(224, 224, [200, 120, 40]);
            pipeline.submit_capture(&camera, model)
        }
    };
    if let Err(e) = &submitted {
        let _ = logger.error(&format!("Submission failed: {}", e));
    }

    let outcome = loop {
        let state = states.borrow_and_update().clone();
        render(&state, &mut display).map_err(|e| anyhow!(e))?;
        if let State::Settled { outcome, .. } = state {
            break outcome;
        }
        states
            .changed()
            .await
            .context("result channel closed before settling")?;
    };

    Ok(match outcome {
        TransferOutcome::Success { .. } => ExitCode::SUCCESS,
        TransferOutcome::Failure(_) => ExitCode::FAILURE,
    })
}
