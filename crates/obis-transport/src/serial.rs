//! Serial link to an OBIS head.
//!
//! OBIS LS and LX lasers, and the OBIS remote that daisy-chains several
//! heads, enumerate as a USB virtual COM port or expose RS-232. The framing
//! is fixed at 8 data bits, no parity, one stop bit and no flow control; only
//! the baud rate is selectable, and every shipping head uses 9600.
//!
//! # Example
//!
//! ```no_run
//! use obis_transport::SerialTransport;
//! use obis_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> obis_core::Result<()> {
//! let mut link = SerialTransport::open("/dev/ttyACM0", 9600).await?;
//! link.send(b"SYST:INF:WAV?\r\n").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = link.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};
use tracing::{debug, error, info, trace, warn};

use obis_core::error::{Error, Result};
use obis_core::transport::Transport;

/// Baud rate used by every OBIS laser.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::NotConnected => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

fn check_baud_rate(baud_rate: u32) -> Result<()> {
    if baud_rate == 0 {
        return Err(Error::InvalidParameter("baud rate must be non-zero".into()));
    }
    Ok(())
}

/// An open serial port to one laser (or one OBIS remote).
///
/// Both OS buffers are discarded as soon as the port is opened.
pub struct SerialTransport {
    stream: Option<SerialStream>,
    path: String,
    baud_rate: u32,
}

impl SerialTransport {
    /// Open `path` (e.g. `/dev/ttyACM0` or `COM3`) at `baud_rate`, 8N1.
    pub async fn open(path: &str, baud_rate: u32) -> Result<Self> {
        check_baud_rate(baud_rate)?;
        debug!(port = %path, baud_rate, "opening serial port");

        let stream = tokio_serial::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                error!(port = %path, error = %e, "cannot open serial port");
                Error::Transport(format!("cannot open serial port {path}: {e}"))
            })?;

        let mut link = SerialTransport {
            stream: Some(stream),
            path: path.to_string(),
            baud_rate,
        };
        // Whatever is waiting in the OS buffers was meant for a previous session.
        link.reset_buffers().await?;

        info!(port = %path, baud_rate, "serial port open");
        Ok(link)
    }

    /// The device path this transport was opened on.
    pub fn port_name(&self) -> &str {
        &self.path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        trace!(port = %self.path, data = ?String::from_utf8_lossy(data), "tx");

        if let Err(e) = stream.write_all(data).await {
            error!(port = %self.path, error = %e, "write failed");
            return Err(map_io_error(e));
        }
        stream.flush().await.map_err(|e| {
            error!(port = %self.path, error = %e, "flush failed");
            map_io_error(e)
        })
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let n = match tokio::time::timeout(timeout, stream.read(buf)).await {
            Err(_) => {
                trace!(port = %self.path, timeout_ms = timeout.as_millis() as u64, "rx timeout");
                return Err(Error::Timeout);
            }
            Ok(Err(e)) => {
                error!(port = %self.path, error = %e, "read failed");
                return Err(map_io_error(e));
            }
            Ok(Ok(0)) => {
                error!(port = %self.path, "serial port reported end of stream");
                return Err(Error::ConnectionLost);
            }
            Ok(Ok(n)) => n,
        };
        trace!(port = %self.path, data = ?String::from_utf8_lossy(&buf[..n]), "rx");
        Ok(n)
    }

    async fn reset_buffers(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        stream.clear(ClearBuffer::All).map_err(|e| {
            error!(port = %self.path, error = %e, "cannot clear serial buffers");
            Error::Transport(format!("cannot clear buffers on {}: {e}", self.path))
        })?;
        debug!(port = %self.path, "serial buffers cleared");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        if let Err(e) = stream.flush().await {
            warn!(port = %self.path, error = %e, "flush before close failed");
        }
        info!(port = %self.path, "serial port closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!(port = %self.path, "serial transport dropped while open");
        }
    }
}
