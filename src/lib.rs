#[macro_use]
mod logging;

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod prompt;
pub mod settings;

use std::io::{stdin, stdout};
use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;

use cli::{resolve_session, Cli};
use display::{write_port_list, ConsoleSink};
use error::SessionError;
use io::serial::{list_ports, open_port, run_session, StreamEnd};
use prompt::Prompter;

pub use logging::{init_file_logging, stop_file_logging};

/// Entry point for the `serialtap` binary.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{} Failed to start runtime: {}", "❌".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run_cli(cli));
    stop_file_logging();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("❌ {}", e).red());
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> Result<(), SessionError> {
    let settings = settings::load_settings().map_err(SessionError::Settings)?;

    if let Some(dir) = cli.log_dir.as_ref().or(settings.log_dir.as_ref()) {
        if let Err(e) = init_file_logging(dir) {
            tlog!("[logging] {}", e);
        }
    }

    if cli.list {
        let ports = list_ports()?;
        write_port_list(&mut stdout(), &ports).map_err(|e| SessionError::Read(e.to_string()))?;
        return Ok(());
    }

    let config = {
        let mut prompter = Prompter::new(stdin().lock(), stdout());
        resolve_session(&cli, &settings, &mut prompter, list_ports)?
    };

    let port = open_port(&config)?;
    println!(
        "{}",
        format!(
            "✅ Port opened on {}. Baud rate: {}. \nPress Ctrl+C to exit.",
            config.port, config.baud_rate
        )
        .green()
        .bold()
    );

    let sink = ConsoleSink::new(stdout(), config.mode.clone());
    match run_session(port, config.mode, sink).await? {
        StreamEnd::Error(msg) => Err(SessionError::Read(msg)),
        StreamEnd::Stopped | StreamEnd::Disconnected => Ok(()),
    }
}
