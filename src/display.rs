// src/display.rs
//
// Frame sinks. The console sink prints one line per frame, labelled and
// coloured by framing mode.

use std::io::{self, Write};

use crossterm::style::Stylize;

use crate::io::serial::{Frame, FramingMode, PortInfo};

/// Bytes shown for a binary frame before the rest is summarised
const MAX_PREVIEW_BYTES: usize = 50;

/// Receives frames in stream order, one at a time.
pub trait FrameSink {
    fn emit(&mut self, frame: Frame) -> io::Result<()>;
}

impl FrameSink for Vec<Frame> {
    fn emit(&mut self, frame: Frame) -> io::Result<()> {
        self.push(frame);
        Ok(())
    }
}

/// Render bytes as `<Buffer 01 02 ff>`.
pub fn format_buffer(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(MAX_PREVIEW_BYTES)];
    let encoded = hex::encode(shown);
    let mut out = String::with_capacity(8 + shown.len() * 3);
    out.push_str("<Buffer");
    for pair in encoded.as_bytes().chunks(2) {
        out.push(' ');
        out.extend(pair.iter().map(|b| *b as char));
    }
    if bytes.len() > shown.len() {
        out.push_str(&format!(" ... {} more bytes", bytes.len() - shown.len()));
    }
    out.push('>');
    out
}

/// Writes each frame to a terminal (or any writer).
pub struct ConsoleSink<W: Write> {
    out: W,
    mode: FramingMode,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, mode: FramingMode) -> Self {
        ConsoleSink { out, mode }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for ConsoleSink<W> {
    fn emit(&mut self, frame: Frame) -> io::Result<()> {
        match &self.mode {
            FramingMode::Raw => writeln!(
                self.out,
                "{} {}",
                "🔄 Raw Data:".magenta(),
                format_buffer(&frame.bytes)
            )?,
            FramingMode::Delimited { .. } => {
                writeln!(self.out, "{} {}", "📄 Text Data:".cyan(), frame.text())?
            }
            FramingMode::FixedLength { length } => writeln!(
                self.out,
                "{} {}",
                format!("📦 ByteLength ({}) Data:", length).yellow(),
                format_buffer(&frame.bytes)
            )?,
        }
        self.out.flush()
    }
}

/// Print the numbered port list used by the selection prompt and `--list`.
pub fn write_port_list<W: Write>(out: &mut W, ports: &[PortInfo]) -> io::Result<()> {
    writeln!(out, "{}", "🔌 Available Serial Ports:".cyan().bold())?;
    for (index, port) in ports.iter().enumerate() {
        let manufacturer = port.manufacturer.as_deref().unwrap_or("Unknown Manufacturer");
        writeln!(
            out,
            "{}: {} - {} ({})",
            (index + 1).to_string().green(),
            port.path.as_str().yellow(),
            manufacturer.grey(),
            port.port_type
        )?;
    }
    out.flush()
}
