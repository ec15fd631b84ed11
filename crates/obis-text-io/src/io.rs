//! Buffered line channel over a [`Transport`].
//!
//! [`LineChannel`] owns the transport for the lifetime of a session and keeps
//! a receive buffer across reads. The laser's value line and its `OK`
//! acknowledgement frequently arrive in a single read, so bytes past the
//! first terminator must be kept for the next [`LineChannel::read_line`].
//!
//! There is no retry at this layer: a transport error or a stream-layer
//! timeout is returned as soon as it is observed. Callers that give up on a
//! reply halfway must call [`LineChannel::reset_buffers`] before the next
//! request, or the remainder will be read as the next reply.

use std::time::Duration;

use tracing::{trace, warn};

use obis_core::error::{Error, Result};
use obis_core::transport::Transport;

use crate::protocol::{self, DecodeResult};

/// Default time to wait for each chunk of a reply before giving up.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum buffer size before reset to prevent unbounded growth.
/// OBIS reply lines are at most a few dozen bytes.
const MAX_BUF: usize = 4096;

/// A line-buffered channel to the laser.
pub struct LineChannel {
    transport: Box<dyn Transport>,
    rx_buf: Vec<u8>,
    read_timeout: Duration,
}

impl LineChannel {
    /// Wrap a transport. `read_timeout` bounds each wait for reply bytes.
    pub fn new(transport: Box<dyn Transport>, read_timeout: Duration) -> Self {
        LineChannel {
            transport,
            rx_buf: Vec::new(),
            read_timeout,
        }
    }

    /// The per-read timeout applied while waiting for reply bytes.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Write one complete frame, terminator included.
    pub async fn write_line(&mut self, frame: &[u8]) -> Result<()> {
        trace!(frame = ?String::from_utf8_lossy(frame), "writing line");
        self.transport.send(frame).await
    }

    /// Read one line, with its terminator stripped.
    ///
    /// Waits until a newline arrives or the transport reports an error.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut chunk = [0u8; 256];

        loop {
            match protocol::decode_line(&self.rx_buf) {
                DecodeResult::Line { text, consumed } => {
                    self.rx_buf.drain(..consumed);
                    trace!(line = %text, "read line");
                    return Ok(text);
                }
                DecodeResult::Invalid(consumed) => {
                    let raw = self.rx_buf.drain(..consumed).collect::<Vec<u8>>();
                    return Err(Error::Protocol(format!(
                        "reply line is not valid UTF-8: {raw:02X?}"
                    )));
                }
                DecodeResult::Incomplete => {}
            }

            let n = self.transport.receive(&mut chunk, self.read_timeout).await?;
            self.rx_buf.extend_from_slice(&chunk[..n]);

            if self.rx_buf.len() > MAX_BUF {
                warn!(len = self.rx_buf.len(), "receive buffer overflow, clearing");
                self.rx_buf.clear();
                return Err(Error::Protocol(
                    "reply exceeded buffer without a line terminator".into(),
                ));
            }
        }
    }

    /// Whether bytes past the last line read are still buffered.
    pub fn has_buffered_input(&self) -> bool {
        !self.rx_buf.is_empty()
    }

    /// Drain and return whatever is buffered locally, terminators trimmed.
    ///
    /// Returns `None` when the buffer is empty.
    pub fn take_buffered(&mut self) -> Option<String> {
        if self.rx_buf.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.rx_buf);
        Some(String::from_utf8_lossy(&raw).trim_end().to_string())
    }

    /// Discard buffered input, locally and in the transport.
    pub async fn reset_buffers(&mut self) -> Result<()> {
        if !self.rx_buf.is_empty() {
            trace!(bytes = self.rx_buf.len(), "discarding buffered input");
        }
        self.rx_buf.clear();
        self.transport.reset_buffers().await
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.rx_buf.clear();
        self.transport.close().await
    }

    /// Whether the underlying transport is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obis_test_harness::MockTransport;

    fn channel(mock: MockTransport) -> LineChannel {
        LineChannel::new(Box::new(mock), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn reads_value_and_ack_from_one_chunk() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:STAT?\r\n", b"C8001002\r\nOK\r\n");

        let mut ch = channel(mock);
        ch.write_line(b"SYST:STAT?\r\n").await.unwrap();
        assert_eq!(ch.read_line().await.unwrap(), "C8001002");
        assert_eq!(ch.read_line().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn missing_line_times_out() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:STAT?\r\n", b"C8001002\r\n");

        let mut ch = channel(mock);
        ch.write_line(b"SYST:STAT?\r\n").await.unwrap();
        assert_eq!(ch.read_line().await.unwrap(), "C8001002");
        let err = ch.read_line().await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn partial_line_then_timeout() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:STAT?\r\n", b"C800");

        let mut ch = channel(mock);
        ch.write_line(b"SYST:STAT?\r\n").await.unwrap();
        assert!(matches!(ch.read_line().await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_protocol_error() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:STAT?\r\n", &[0xFF, 0xFE, b'\r', b'\n', b'O', b'K', b'\r', b'\n']);

        let mut ch = channel(mock);
        ch.write_line(b"SYST:STAT?\r\n").await.unwrap();
        assert!(matches!(ch.read_line().await, Err(Error::Protocol(_))));
        // The bad line was consumed; the next one is intact.
        assert_eq!(ch.read_line().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn reset_discards_stale_input() {
        let mut mock = MockTransport::new();
        mock.push_stale(b"OK\r\n");
        mock.expect(b"SYST:STAT?\r\n", b"C8001100\r\nOK\r\n");

        let mut ch = channel(mock);
        ch.reset_buffers().await.unwrap();
        ch.write_line(b"SYST:STAT?\r\n").await.unwrap();
        assert_eq!(ch.read_line().await.unwrap(), "C8001100");
    }

    #[tokio::test]
    async fn extra_bytes_stay_buffered() {
        let mut mock = MockTransport::new();
        mock.expect(b"SOUR:AM:STAT ON\r\n", b"OK\r\nERR-350\r\n");

        let mut ch = channel(mock);
        ch.write_line(b"SOUR:AM:STAT ON\r\n").await.unwrap();
        assert!(!ch.has_buffered_input());
        assert_eq!(ch.read_line().await.unwrap(), "OK");
        assert!(ch.has_buffered_input());
        assert_eq!(ch.take_buffered().as_deref(), Some("ERR-350"));
        assert!(!ch.has_buffered_input());
        assert_eq!(ch.take_buffered(), None);
    }

    #[tokio::test]
    async fn reset_drops_partial_line() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:INF:WAV?\r\n", b"12");
        mock.expect(b"SYST:INF:WAV?\r\n", b"488\r\nOK\r\n");

        let mut ch = channel(mock);
        ch.write_line(b"SYST:INF:WAV?\r\n").await.unwrap();
        assert!(matches!(ch.read_line().await, Err(Error::Timeout)));
        ch.reset_buffers().await.unwrap();
        ch.write_line(b"SYST:INF:WAV?\r\n").await.unwrap();
        assert_eq!(ch.read_line().await.unwrap(), "488");
    }

    #[tokio::test]
    async fn send_error_propagates() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);

        let mut ch = channel(mock);
        assert!(!ch.is_connected());
        let err = ch.write_line(b"SYST:STAT?\r\n").await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn close_disconnects() {
        let mut ch = channel(MockTransport::new());
        assert!(ch.is_connected());
        ch.close().await.unwrap();
        assert!(!ch.is_connected());
    }
}
