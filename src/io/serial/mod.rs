// src/io/serial/mod.rs
//
// Serial port driver with framing support.
//
// Features:
// - Raw chunk passthrough (one frame per read)
// - CRLF line framing (or any configured delimiter)
// - Fixed-length block framing

pub mod framer;
pub mod reader;
pub(crate) mod utils;

pub use framer::{Delimiter, Frame, FrameAssembler, FramingMode, CRLF};
pub use reader::{list_ports, open_port, run_session, run_stream, PortInfo, StreamEnd};
pub use utils::{LineSettings, Parity};
