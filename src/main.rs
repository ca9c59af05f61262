mod app;
mod cli;
mod error;

use crate::app::App;
use crate::cli::{Cli, Command, ProcessMode};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use glimpse_pipeline::{RunHandle, RunStatus};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let app = App::build(cli.config.as_deref()).await?;
    let code = match cli.command {
        Command::Sync => {
            let outcome = app.coordinator.sync_only().await.or_raise(|| ErrorKind::Pipeline)?;
            let mode = match outcome.full_sync {
                true => "full resync",
                false => "delta",
            };
            println!("{mode}: {} changed, {} removed", outcome.changed.len(), outcome.removed);
            ExitCode::SUCCESS
        },
        Command::Process { mode, kind } => {
            let kind = kind.map(Into::into);
            let handle = match mode {
                ProcessMode::Smart => app.coordinator.smart_process(kind).await,
                ProcessMode::All => app.coordinator.process_all(kind).await,
                ProcessMode::New => app.coordinator.process_new(kind).await,
            }
            .or_raise(|| ErrorKind::Pipeline)?;
            wait_with_ctrl_c(&app, handle).await
        },
        Command::Status => {
            let run = app.coordinator.status().await;
            println!("status: {}", run.status);
            println!("progress: {}/{}", run.files_processed, run.files_total);
            if let Some(current) = &run.current_file {
                println!("current: {current}");
            }
            for err in &run.errors {
                println!("error: {err}");
            }
            ExitCode::SUCCESS
        },
        Command::Stats => {
            let stats = app.repo.stats().await.or_raise(|| ErrorKind::Store)?;
            println!("files: {} ({} images, {} videos)", stats.total_files, stats.images, stats.videos);
            match stats.last_sync {
                Some(at) => println!("last sync: {at}"),
                None => println!("last sync: never"),
            }
            match stats.last_full_sync {
                Some(at) => println!("last full sync: {at}"),
                None => println!("last full sync: never"),
            }
            println!("database size: {} bytes", stats.database_size_bytes);
            ExitCode::SUCCESS
        },
        Command::ClearCache => {
            app.repo.clear().await.or_raise(|| ErrorKind::Store)?;
            println!("inventory cleared; next sync will be a full resync");
            ExitCode::SUCCESS
        },
    };
    app.db.close().await;
    Ok(code)
}

/// Wait for the run, turning Ctrl-C into a graceful stop request.
async fn wait_with_ctrl_c(app: &App, handle: RunHandle) -> ExitCode {
    let control = app.coordinator.control().clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("stopping after the current batch...");
            control.stop();
        }
    });
    let report = handle.wait().await;
    interrupt.abort();
    println!("run {}: {} files processed, {} errors", report.status, report.files_processed, report.errors.len());
    for err in &report.errors {
        println!("error: {err}");
    }
    match report.status {
        RunStatus::Completed | RunStatus::Stopped => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
