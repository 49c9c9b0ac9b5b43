// src/io/serial/reader.rs
//
// Serial port reader. Opens the port, pumps chunks through the frame
// assembler in arrival order and hands frames to a sink.

use std::io::{ErrorKind, Read};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serialport::SerialPort;

use super::framer::{FrameAssembler, FramingMode};
use super::utils::{to_serialport_data_bits, to_serialport_parity, to_serialport_stop_bits};
use crate::config::SessionConfig;
use crate::display::FrameSink;
use crate::error::SessionError;

/// Read buffer size; each successful read becomes one chunk
const READ_BUFFER_SIZE: usize = 256;

// ============================================================================
// Types
// ============================================================================

/// Information about an available serial port
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortInfo {
    pub path: String,
    pub port_type: String,
    pub manufacturer: Option<String>,
}

/// Why a stream stopped
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// Stop requested (Ctrl+C)
    Stopped,
    /// Port returned end-of-file
    Disconnected,
    /// Read or sink failure
    Error(String),
}

impl StreamEnd {
    pub fn reason(&self) -> &'static str {
        match self {
            StreamEnd::Stopped => "stopped",
            StreamEnd::Disconnected => "disconnected",
            StreamEnd::Error(_) => "error",
        }
    }
}

// ============================================================================
// Port Enumeration
// ============================================================================

/// List available serial ports
///
/// On macOS, filters out /dev/tty.* devices and only shows /dev/cu.* devices.
/// The tty devices block on open waiting for carrier detect.
pub fn list_ports() -> Result<Vec<PortInfo>, SessionError> {
    let ports =
        serialport::available_ports().map_err(|e| SessionError::Enumerate(e.to_string()))?;

    let ports: Vec<PortInfo> = ports
        .into_iter()
        .filter(|_p| {
            #[cfg(target_os = "macos")]
            {
                !_p.port_name.starts_with("/dev/tty.")
            }
            #[cfg(not(target_os = "macos"))]
            {
                true
            }
        })
        .map(|p| {
            let (port_type, manufacturer) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => ("USB".to_string(), info.manufacturer),
                serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None),
                serialport::SerialPortType::PciPort => ("PCI".to_string(), None),
                serialport::SerialPortType::Unknown => ("Unknown".to_string(), None),
            };
            PortInfo {
                path: p.port_name,
                port_type,
                manufacturer,
            }
        })
        .collect();

    if ports.is_empty() {
        return Err(SessionError::NoPorts);
    }
    Ok(ports)
}

// ============================================================================
// Serial Reader
// ============================================================================

/// Open the configured port.
pub fn open_port(config: &SessionConfig) -> Result<Box<dyn SerialPort>, SessionError> {
    let port = serialport::new(&config.port, config.baud_rate)
        .data_bits(to_serialport_data_bits(config.line.data_bits))
        .stop_bits(to_serialport_stop_bits(config.line.stop_bits))
        .parity(to_serialport_parity(config.line.parity))
        .timeout(config.read_timeout)
        .open()
        .map_err(|e| SessionError::Open {
            port: config.port.clone(),
            reason: e.to_string(),
        })?;

    tlog!(
        "[serial] Opened {} at {} baud ({}) [mode: {}]",
        config.port,
        config.baud_rate,
        config.line,
        config.mode.name()
    );

    Ok(port)
}

/// Blocking read loop.
///
/// Each read is one chunk. Runs until `cancel` is raised, the reader hits
/// end-of-file, or a read or sink error occurs. Any partial frame left in the
/// assembler is dropped, never emitted.
pub fn run_stream<R, S>(
    reader: &mut R,
    mut assembler: FrameAssembler,
    sink: &mut S,
    cancel: &AtomicBool,
) -> StreamEnd
where
    R: Read + ?Sized,
    S: FrameSink + ?Sized,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut total_bytes: u64 = 0;
    let mut total_frames: u64 = 0;

    let end = loop {
        if cancel.load(Ordering::Relaxed) {
            break StreamEnd::Stopped;
        }

        match reader.read(&mut buf) {
            Ok(0) => break StreamEnd::Disconnected,
            Ok(n) => {
                total_bytes += n as u64;
                let mut failed = None;
                for frame in assembler.feed(&buf[..n]) {
                    if let Err(e) = sink.emit(frame) {
                        failed = Some(format!("Output error: {}", e));
                        break;
                    }
                    total_frames += 1;
                }
                if let Some(msg) = failed {
                    break StreamEnd::Error(msg);
                }
            }
            // Timeouts are how the loop gets to re-check `cancel`
            Err(ref e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {}
            Err(e) => break StreamEnd::Error(format!("Read error: {}", e)),
        }
    };

    let dropped = assembler.discard();
    tlog!(
        "[serial] Stream ended ({}): {} bytes read, {} frames, {} buffered bytes dropped",
        end.reason(),
        total_bytes,
        total_frames,
        dropped
    );

    end
}

/// Stream an open port into `sink` until Ctrl+C or disconnect.
/// The blocking read loop runs on a dedicated thread.
pub async fn run_session<S>(
    mut port: Box<dyn SerialPort>,
    mode: FramingMode,
    mut sink: S,
) -> Result<StreamEnd, SessionError>
where
    S: FrameSink + Send + 'static,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tlog!("[serial] Ctrl+C received, closing port");
            signal_flag.store(true, Ordering::Relaxed);
        }
    });

    let assembler = FrameAssembler::new(mode);
    let handle = tokio::task::spawn_blocking(move || {
        run_stream(port.as_mut(), assembler, &mut sink, &cancel)
    });

    handle.await.map_err(|e| SessionError::Task(e.to_string()))
}
