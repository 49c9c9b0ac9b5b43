// src/cli.rs
//
// Command-line flags and session resolution.
// Flags pre-answer prompt questions; whatever is left is asked interactively.
// Flags and prompt answers go through the same validation.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{
    parse_hex_delimiter, parse_length, parse_mode_name, resolve_mode, ModeKind, SessionConfig,
};
use crate::error::{ConfigError, SessionError};
use crate::io::serial::PortInfo;
use crate::prompt::Prompter;
use crate::settings::AppSettings;

#[derive(Parser, Debug, Default)]
#[command(
    name = "serialtap",
    version,
    about = "Serial monitor with raw, line and fixed-length framing"
)]
pub struct Cli {
    /// List available serial ports and exit
    #[arg(short, long)]
    pub list: bool,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Reading mode: raw, text or byte
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Block length for byte mode
    #[arg(long)]
    pub length: Option<String>,

    /// Line delimiter for text mode as hex bytes (default 0D0A)
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Also write logs to a timestamped file in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// Flags given on the command line that have no effect in mode `kind`.
pub fn ignored_flags(cli: &Cli, kind: ModeKind) -> Vec<&'static str> {
    let mut ignored = Vec::new();
    if cli.length.is_some() && kind != ModeKind::Byte {
        ignored.push("--length");
    }
    if cli.delimiter.is_some() && kind != ModeKind::Text {
        ignored.push("--delimiter");
    }
    ignored
}

/// Resolve every session parameter, asking for whatever the flags left out.
///
/// Questions follow the order port, mode, baud rate, then length (byte mode
/// only). Ports are only enumerated when no port was given.
pub fn resolve_session<R, W, F>(
    cli: &Cli,
    settings: &AppSettings,
    prompter: &mut Prompter<R, W>,
    list_ports: F,
) -> Result<SessionConfig, SessionError>
where
    R: BufRead,
    W: Write,
    F: FnOnce() -> Result<Vec<PortInfo>, SessionError>,
{
    let port = match &cli.port {
        Some(port) => port.clone(),
        None => {
            let ports = list_ports()?;
            prompter.select_port(&ports)?
        }
    };

    let kind = match &cli.mode {
        Some(mode) => parse_mode_name(mode)?,
        None => prompter.select_mode()?,
    };

    for flag in ignored_flags(cli, kind) {
        tlog!("[cli] Ignoring {} in {:?} mode", flag, kind);
    }

    let baud_rate = match cli.baud {
        Some(0) => return Err(ConfigError::InvalidBaudRate(0).into()),
        Some(rate) => rate,
        None => prompter
            .select_baud_rate(&settings.menu_baud_rates(), settings.fallback_baud_rate())?,
    };

    let length = match (kind, &cli.length) {
        (ModeKind::Byte, Some(length)) => Some(parse_length(length)?),
        (ModeKind::Byte, None) => Some(prompter.ask_length()?),
        _ => None,
    };

    let delimiter = match kind {
        ModeKind::Text => cli
            .delimiter
            .as_deref()
            .map(parse_hex_delimiter)
            .transpose()?,
        _ => None,
    };

    let mode = resolve_mode(kind, length, delimiter)?;

    Ok(SessionConfig {
        port,
        baud_rate,
        line: settings.line,
        mode,
        read_timeout: Duration::from_millis(settings.read_timeout_ms.max(1)),
    })
}
