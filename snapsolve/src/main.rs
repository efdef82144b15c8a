//! Photo-to-steps math solver CLI.
//!
//! `capture` grabs a camera frame (or reads `--image`) and solves it, either
//! in-process or through a running `snapsolve-server`. `replay` runs a saved
//! model response through the pipeline offline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use snapsolve::capture::{CaptureError, LocalSubmitter, capture_and_submit, render_text};
use snapsolve::exit_codes;
use snapsolve::io::camera::{CommandFrameSource, FileFrameSource, FrameSource};
use snapsolve::io::config::{Config, load_config, read_api_key, resolve_config_path};
use snapsolve::io::model::OpenAiClient;
use snapsolve::io::prompt::render_solve_prompt;
use snapsolve::io::submit::{RemoteSubmitter, SubmitResponse, Submitter};
use snapsolve::logging;
use snapsolve::replay::replay_file;
use snapsolve::solve::{SolveService, SolveSettings};

/// Extra time the remote submitter allows on top of the model timeout.
const SUBMIT_GRACE_SECS: u64 = 10;

#[derive(Parser)]
#[command(
    name = "snapsolve",
    version,
    about = "Solve a photographed math problem step by step"
)]
struct Cli {
    /// Config file (default: $SNAPSOLVE_CONFIG, then ./snapsolve.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grab one camera frame and solve it.
    Capture {
        /// Read the frame from an image file instead of the camera.
        #[arg(long)]
        image: Option<PathBuf>,
        /// Submit to a running snapsolve-server instead of solving in-process.
        #[arg(long)]
        server: Option<String>,
        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Solve an image file in-process.
    Solve {
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Run a saved model response through validation and the step pipeline.
    Replay {
        response: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the instruction prompt sent with every image.
    Prompt,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Capture {
            image,
            server,
            json,
        } => {
            let config = load(cli.config.as_deref())?;
            let source: Box<dyn FrameSource> = match image {
                Some(path) => Box::new(FileFrameSource::new(path)),
                None => Box::new(CommandFrameSource::from_config(&config.capture)),
            };
            cmd_capture(&config, source.as_ref(), server.as_deref(), json)
        }
        Command::Solve { image, json } => {
            let config = load(cli.config.as_deref())?;
            cmd_capture(&config, &FileFrameSource::new(image), None, json)
        }
        Command::Replay { response, json } => cmd_replay(&response, json),
        Command::Prompt => {
            println!("{}", render_solve_prompt()?);
            Ok(exit_codes::OK)
        }
    }
}

fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = resolve_config_path(explicit);
    load_config(&path).with_context(|| format!("load config {}", path.display()))
}

fn cmd_capture(
    config: &Config,
    source: &dyn FrameSource,
    server: Option<&str>,
    json: bool,
) -> Result<i32> {
    let submitter: Box<dyn Submitter> = match server {
        Some(url) => Box::new(RemoteSubmitter::new(
            url,
            Duration::from_secs(config.model.timeout_secs + SUBMIT_GRACE_SECS),
        )?),
        None => {
            let api_key = read_api_key(&config.model)?;
            let client = OpenAiClient::from_config(&config.model, api_key)?;
            let service = SolveService::new(client, SolveSettings::from_config(config))?;
            Box::new(LocalSubmitter::new(service))
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    match runtime.block_on(capture_and_submit(source, submitter.as_ref())) {
        Ok(None) => Ok(exit_codes::OK),
        Ok(Some(response)) => {
            print_response(&response, json)?;
            Ok(exit_codes::OK)
        }
        Err(err) => {
            eprintln!("{}", err);
            Ok(match err {
                CaptureError::Frame(_) => exit_codes::CAPTURE_FAILED,
                CaptureError::Submit(_) => exit_codes::SERVICE_FAILED,
            })
        }
    }
}

fn cmd_replay(path: &Path, json: bool) -> Result<i32> {
    let replay = replay_file(path)?;
    let report = &replay.placeholders;
    if !report.redefined.is_empty() {
        eprintln!("warning: redefined values: {}", report.redefined.join(", "));
    }
    if !report.undefined.is_empty() {
        eprintln!("warning: undefined placeholders: {}", report.undefined.join(", "));
    }
    print_response(&SubmitResponse::from(&replay.result), json)?;
    Ok(exit_codes::OK)
}

fn print_response(response: &SubmitResponse, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(response).context("serialize response")?
        );
    } else {
        print!("{}", render_text(response));
    }
    Ok(())
}
