// src/error.rs
//
// Error types. Configuration errors are detected before the port is opened
// and abort the session; session errors come from the transport or the host.

/// Invalid user input while resolving the session configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid byte length '{0}': expected a positive integer")]
    InvalidLength(String),

    #[error("Invalid mode '{0}': expected raw, text or byte")]
    UnknownMode(String),

    #[error("Invalid port selection '{0}'")]
    InvalidPort(String),

    #[error("Invalid baud rate {0}")]
    InvalidBaudRate(u32),

    #[error("Invalid delimiter '{0}': expected non-empty hex bytes (e.g. 0D0A)")]
    InvalidDelimiter(String),

    #[error("Byte mode requires a length")]
    MissingLength,

    #[error("Input closed before a selection was made")]
    InputClosed,

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure outside the framing core: settings, port enumeration, transport.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read settings: {0}")]
    Settings(String),

    #[error("Failed to enumerate ports: {0}")]
    Enumerate(String),

    #[error("No serial ports found")]
    NoPorts,

    #[error("Failed to open {port}: {reason}")]
    Open { port: String, reason: String },

    #[error("Read error: {0}")]
    Read(String),

    #[error("Serial task failed: {0}")]
    Task(String),
}
