//! pimotion command-line front end

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pimotion_lib::config::{ConfigStorage, ConnectionProfile};
use pimotion_lib::sftp::path_utils::local_destination;
use pimotion_lib::{
    init_logging, BulkEvent, BulkHandle, BulkReport, ConnectParams, ControllerError,
    ItemOutcome, SessionController,
};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "pimotion", version)]
#[command(about = "Manage motion-capture recordings on a remote device over SSH")]
#[command(after_help = "PIMOTION_HOST, PIMOTION_USER, PIMOTION_PASSWORD and PIMOTION_PATH \
override the config file; RUST_LOG sets the log level.")]
struct Cli {
    /// Connection profile (default: ./connection.json, then ~/.pimotion/connection.json)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// List recordings, newest first
    List,
    /// Download one recording
    Download {
        name: String,
        /// Target file, or an existing directory to download into
        dest: PathBuf,
    },
    /// Download every listed recording into DIR
    DownloadAll { dir: PathBuf },
    /// Delete one recording
    Delete { name: String },
    /// Delete every listed recording
    DeleteAll {
        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("no host configured; edit {0} or set PIMOTION_HOST")]
    NoHost(String),

    #[error("refusing to delete {0} files without --yes")]
    NotConfirmed(usize),

    #[error("{0} has no file name to save under")]
    BadName(String),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging();

    match run(cli.config, cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Option<PathBuf>, command: Command) -> Result<ExitCode, CliError> {
    let storage = match config {
        Some(path) => ConfigStorage::with_path(path),
        None => ConfigStorage::new(),
    };
    let profile: ConnectionProfile = storage.load().await.with_env_overrides();
    if profile.has_placeholder_host() {
        return Err(CliError::NoHost(storage.path().display().to_string()));
    }

    let controller = SessionController::sftp();
    let result = execute(&controller, &profile, command).await;
    if let Err(e) = controller.close().await {
        tracing::warn!("Close failed: {}", e);
    }
    result
}

async fn execute(
    controller: &SessionController,
    profile: &ConnectionProfile,
    command: Command,
) -> Result<ExitCode, CliError> {
    let listing = controller.connect(ConnectParams::from(profile)).await?;

    match command {
        Command::List => {
            for file in listing.iter() {
                println!(
                    "{:<28} {:>12}  {}",
                    file.display_label(),
                    file.size_label(),
                    file.filename
                );
            }
            println!("{} videos", listing.len());
            Ok(ExitCode::SUCCESS)
        }
        Command::Download { name, dest } => {
            let dest = if dest.is_dir() {
                local_destination(&dest, &name).ok_or_else(|| CliError::BadName(name.clone()))?
            } else {
                dest
            };
            let bytes = controller.download_one(&name, &dest).await?;
            println!("{} -> {} ({} bytes)", name, dest.display(), bytes);
            Ok(ExitCode::SUCCESS)
        }
        Command::DownloadAll { dir } => {
            let handle = controller.download_all(listing.filenames(), dir)?;
            let report = drive(handle).await?;
            Ok(exit_code(&report))
        }
        Command::Delete { name } => {
            controller.delete_one(&name).await?;
            println!("deleted {}", name);
            Ok(ExitCode::SUCCESS)
        }
        Command::DeleteAll { yes } => {
            if !yes {
                return Err(CliError::NotConfirmed(listing.len()));
            }
            let handle = controller.delete_all(listing.filenames())?;
            let report = drive(handle).await?;
            Ok(exit_code(&report))
        }
    }
}

/// Print progress until the job ends. Ctrl-C cancels before the next file.
async fn drive(mut handle: BulkHandle) -> Result<BulkReport, CliError> {
    let control = handle.control();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("cancelling after the current file...");
            control.cancel();
        }
    });

    while let Some(event) = handle.next_event().await {
        match event {
            BulkEvent::Started { .. } => {}
            BulkEvent::Progress {
                index,
                total,
                filename,
                outcome,
            } => match outcome {
                ItemOutcome::Succeeded => println!("[{}/{}] {} ok", index, total, filename),
                ItemOutcome::Failed(error) => {
                    println!("[{}/{}] {} FAILED: {}", index, total, filename, error)
                }
            },
            BulkEvent::Completed(report) => {
                if report.cancelled {
                    println!("cancelled, {} files not attempted", report.skipped());
                }
                println!(
                    "{}/{} succeeded, {} failed",
                    report.succeeded, report.total, report.failed
                );
            }
        }
    }

    interrupt.abort();
    Ok(handle.wait().await?)
}

fn exit_code(report: &BulkReport) -> ExitCode {
    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
