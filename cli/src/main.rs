use std::io::Write;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use subagent_core::api as core_api;
use subagent_core::error::CliError;

mod app;
mod commands;
use commands::cli;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    let env = core_api::env_snapshot();
    let cfg = app::build_config(&args, &env);
    let run = app::build_run(&args);
    let debug = run.as_ref().is_ok_and(|r| r.debug);
    let guard = init_tracing(debug, &cfg.logs.debug_log);

    let result = match run {
        Ok(run) => app::run_app(&run, &cfg, &env).await.result,
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            core_api::SubagentResult::from_error(&e)
        }
    };

    let code = result.exit_code();
    let code = match print_result(&result) {
        Ok(()) => code,
        Err(e) => {
            tracing::error!(error = %e, "result line not written");
            1
        }
    };

    // process::exit skips destructors; flush the debug log first
    drop(guard);
    std::process::exit(code);
}

/// The one machine-readable line on stdout.
fn print_result(result: &core_api::SubagentResult) -> Result<(), CliError> {
    let line = match result.to_json_line() {
        Ok(line) => line,
        Err(e) => {
            let err = CliError::Serialize(e);
            println!(r#"{{"success":false,"result":null,"error":"failed to serialize result"}}"#);
            return Err(err);
        }
    };
    let mut out = std::io::stdout().lock();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

/// Human traces go to stderr; `--debug` adds a file layer at debug level.
fn init_tracing(debug: bool, debug_log: &std::path::Path) -> Option<WorkerGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        );

    let (file_layer, guard) = if debug {
        match open_debug_log(debug_log) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                let layer = tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(LevelFilter::DEBUG);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("[subagent] cannot open debug log {}: {e}", debug_log.display());
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn open_debug_log(path: &std::path::Path) -> std::io::Result<std::fs::File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}
