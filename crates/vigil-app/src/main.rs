//! Vigil - submit text or images to a content-moderation service.
//!
//! Subcommands:
//! - `text` - moderate a piece of text
//! - `image` - moderate an image file
//! - `preview` - write the blurred preview of an image
//! - `health` - probe the moderation service

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vigil_app::{generate_preview, report, SubmissionState, Submitter};
use vigil_client::{ClientConfig, ModerationClient, DEFAULT_BASE_URL};
use vigil_core::{ImageFile, ModerationInput, ModerationType, PreviewGenerator};

/// Vigil - content moderation from the command line
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about)]
struct Args {
    /// Moderation service base URL
    #[arg(long, global = true, env = "VIGIL_ENDPOINT", default_value = DEFAULT_BASE_URL)]
    endpoint: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Stop waiting for the service after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Moderate a piece of text
    Text {
        /// Text to moderate
        text: String,
    },
    /// Moderate an image file
    Image {
        /// Path to the image
        path: PathBuf,

        /// Send the image as a data-URI instead of the raw file
        #[arg(long)]
        data_uri: bool,
    },
    /// Write a blurred JPEG preview of an image
    Preview {
        /// Path to the image
        path: PathBuf,

        /// Output file
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Check that the moderation service is up
    Health,
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "vigil", "Vigil").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging to stderr and a rotating file.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vigil={},warn", log_level)));

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("vigil")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::debug!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::warn!("File logging unavailable, using console only");
    None
}

fn read_image(path: &Path) -> anyhow::Result<ImageFile> {
    let file = ImageFile::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if !file.is_image() {
        bail!("{} is not an image", path.display());
    }
    Ok(file)
}

fn print_state(state: &SubmissionState, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        println!("{}", report::render(state));
    }
    Ok(())
}

async fn moderate(
    args: &Args,
    client: ModerationClient,
    moderation_type: ModerationType,
    input: ModerationInput,
) -> anyhow::Result<ExitCode> {
    let submitter = Submitter::new(client);

    let mut states = submitter.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            tracing::info!("Submission {}", state);
        }
    });

    let submission = submitter.submit(moderation_type, input);
    let outcome = match args.timeout {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), submission).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("Gave up after {}s, state is {}", secs, submitter.state());
                bail!("no response from {} within {}s", args.endpoint, secs);
            }
        },
        None => submission.await,
    };

    print_state(&outcome, args.json)?;
    Ok(match outcome {
        SubmissionState::Done(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = ClientConfig::new(&args.endpoint)?;
    let client = ModerationClient::new(config)?;

    match &args.command {
        Command::Text { text } => {
            let input = ModerationInput::from(text.as_str());
            if input.is_blank() {
                bail!("refusing to submit blank text");
            }
            moderate(&args, client, ModerationType::Text, input).await
        }
        Command::Image { path, data_uri } => {
            let file = read_image(path)?;
            let input = if *data_uri {
                ModerationInput::DataUri(file.to_data_uri())
            } else {
                ModerationInput::File(file)
            };
            moderate(&args, client, ModerationType::Image, input).await
        }
        Command::Preview { path, out } => {
            let file = ImageFile::from_path(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let generator = Arc::new(PreviewGenerator::default());

            match generate_preview(generator, &file).await {
                Some(preview) => {
                    std::fs::write(out, &preview.data)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!(
                        "Wrote {}x{} preview to {}",
                        preview.width,
                        preview.height,
                        out.display()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    println!("No preview: {} is not a decodable image", path.display());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Health => {
            let health = client.health().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                println!("{}: {}", client.config().base_url(), health.status);
            }
            Ok(if health.is_healthy() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = init_logging(&args);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
