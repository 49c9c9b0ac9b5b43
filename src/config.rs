// src/config.rs
//
// Mode selection and session configuration.
// Everything here is resolved once, before the port is opened, and is
// immutable for the rest of the session.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::io::serial::{Delimiter, FramingMode, LineSettings};

/// Baud rates offered in the selection menu
pub const COMMON_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Baud rate used when a selection is invalid
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Mode as typed by the user, before its parameters are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Raw,
    Text,
    Byte,
}

impl FromStr for ModeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_mode_name(s)
    }
}

/// Parse a mode name: `raw`, `text` (or `delimited`), `byte` (or `fixed`).
pub fn parse_mode_name(input: &str) -> Result<ModeKind, ConfigError> {
    match input.trim().to_lowercase().as_str() {
        "raw" => Ok(ModeKind::Raw),
        "text" | "delimited" => Ok(ModeKind::Text),
        "byte" | "fixed" => Ok(ModeKind::Byte),
        _ => Err(ConfigError::UnknownMode(input.trim().to_string())),
    }
}

/// Parse a fixed-length block size. Only positive integers are accepted.
pub fn parse_length(input: &str) -> Result<NonZeroUsize, ConfigError> {
    let trimmed = input.trim();
    trimmed
        .parse::<usize>()
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| ConfigError::InvalidLength(trimmed.to_string()))
}

/// Parse hex string to a delimiter (e.g., "0D0A" -> [0x0D, 0x0A])
pub fn parse_hex_delimiter(input: &str) -> Result<Delimiter, ConfigError> {
    let trimmed = input.trim();
    let invalid = || ConfigError::InvalidDelimiter(trimmed.to_string());

    let bytes = hex::decode(trimmed).map_err(|_| invalid())?;
    Delimiter::new(bytes).ok_or_else(invalid)
}

/// Parse a custom baud rate. Returns `None` unless it is a positive integer.
pub fn parse_baud_rate(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|rate| *rate > 0)
}

/// Combine the mode with its parameters.
/// `delimiter` overrides CRLF in text mode and is ignored otherwise.
pub fn resolve_mode(
    kind: ModeKind,
    length: Option<NonZeroUsize>,
    delimiter: Option<Delimiter>,
) -> Result<FramingMode, ConfigError> {
    match kind {
        ModeKind::Raw => Ok(FramingMode::Raw),
        ModeKind::Text => Ok(FramingMode::Delimited {
            delimiter: delimiter.unwrap_or_default(),
        }),
        ModeKind::Byte => length
            .map(|length| FramingMode::FixedLength { length })
            .ok_or(ConfigError::MissingLength),
    }
}

/// Fully resolved session parameters, threaded into the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub port: String,
    pub baud_rate: u32,
    pub line: LineSettings,
    pub mode: FramingMode,
    /// Port read timeout; bounds how long a stop request can go unnoticed
    pub read_timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_names() {
        assert_eq!(parse_mode_name("raw").unwrap(), ModeKind::Raw);
        assert_eq!(parse_mode_name("  TEXT \n").unwrap(), ModeKind::Text);
        assert_eq!(parse_mode_name("byte").unwrap(), ModeKind::Byte);
        assert_eq!(parse_mode_name("fixed").unwrap(), ModeKind::Byte);
        assert_eq!("delimited".parse::<ModeKind>().unwrap(), ModeKind::Text);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = parse_mode_name(" hex ").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMode(ref m) if m == "hex"));
        assert!(parse_mode_name("").is_err());
    }

    #[test]
    fn test_parse_length_accepts_positive_integers() {
        assert_eq!(parse_length("4").unwrap().get(), 4);
        assert_eq!(parse_length(" 128\n").unwrap().get(), 128);
    }

    #[test]
    fn test_parse_length_rejects_everything_else() {
        for input in ["0", "-3", "2.5", "abc", "", "3abc", "1e3"] {
            let err = parse_length(input).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidLength(_)),
                "input {:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_hex_delimiter() {
        assert_eq!(parse_hex_delimiter("0D0A").unwrap(), Delimiter::crlf());
        assert_eq!(parse_hex_delimiter("7e").unwrap().as_bytes(), &[0x7E]);
        assert!(parse_hex_delimiter("").is_err());
        assert!(parse_hex_delimiter("0D0").is_err());
        assert!(parse_hex_delimiter("ZZ").is_err());
    }

    #[test]
    fn test_parse_baud_rate() {
        assert_eq!(parse_baud_rate("250000"), Some(250000));
        assert_eq!(parse_baud_rate("0"), None);
        assert_eq!(parse_baud_rate("-9600"), None);
        assert_eq!(parse_baud_rate("fast"), None);
    }

    #[test]
    fn test_resolve_mode() {
        assert_eq!(resolve_mode(ModeKind::Raw, None, None).unwrap(), FramingMode::Raw);
        assert_eq!(resolve_mode(ModeKind::Text, None, None).unwrap(), FramingMode::text());

        let length = NonZeroUsize::new(8).unwrap();
        assert_eq!(
            resolve_mode(ModeKind::Byte, Some(length), None).unwrap(),
            FramingMode::FixedLength { length }
        );
        assert!(matches!(
            resolve_mode(ModeKind::Byte, None, None),
            Err(ConfigError::MissingLength)
        ));
    }

    #[test]
    fn test_resolve_text_with_custom_delimiter() {
        let delimiter = Delimiter::new(vec![0x0A]).unwrap();
        let mode = resolve_mode(ModeKind::Text, None, Some(delimiter.clone())).unwrap();
        assert_eq!(mode, FramingMode::Delimited { delimiter });
    }
}
