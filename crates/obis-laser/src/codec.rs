//! Request/acknowledge exchange on top of a [`LineChannel`].
//!
//! [`CommandCodec`] turns typed commands into wire frames and enforces the
//! acknowledgement contract:
//!
//! - a write reads exactly one line, which must be `OK`;
//! - a query reads exactly two lines, the value and then `OK`.
//!
//! Anything else is an [`Error::AcknowledgementMismatch`], including bytes
//! left over after the acknowledgement. Nothing is retried here; the first
//! failure is returned to the caller after the input buffers are discarded.

use tracing::{debug, warn};

use obis_core::error::{Error, Result};
use obis_text_io::LineChannel;
use obis_text_io::protocol::{ACK, strip_terminator};

use crate::commands::{QueryCommand, WriteCommand};
use crate::protocol;

/// Encodes commands, sends them, and validates the replies.
pub struct CommandCodec {
    channel: LineChannel,
    prefix: Option<String>,
}

impl CommandCodec {
    /// Wrap a line channel. `prefix` addresses one unit on a shared line.
    pub fn new(channel: LineChannel, prefix: Option<String>) -> Self {
        CommandCodec { channel, prefix }
    }

    /// The configured unit prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Send a write command with `value` and require an `OK` reply.
    ///
    /// `value` must be non-empty; commands that take no value go through
    /// [`execute`](Self::execute).
    pub async fn write<C: WriteCommand>(&mut self, cmd: C, value: &str) -> Result<()> {
        if !cmd.takes_argument() {
            return Err(Error::InvalidParameter(format!(
                "{} takes no value",
                cmd.token()
            )));
        }
        if value.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "{} needs a value",
                cmd.token()
            )));
        }
        debug!(category = ?cmd.category(), token = cmd.token(), value, "write");
        let frame = protocol::encode_write(self.prefix(), cmd.token(), value);
        self.exchange_write(&frame).await
    }

    /// Send a command that carries no value, such as `*RST`, and require an
    /// `OK` reply.
    pub async fn execute<C: WriteCommand>(&mut self, cmd: C) -> Result<()> {
        if cmd.takes_argument() {
            return Err(Error::InvalidParameter(format!(
                "{} needs a value",
                cmd.token()
            )));
        }
        debug!(category = ?cmd.category(), token = cmd.token(), "execute");
        let frame = protocol::encode_action(self.prefix(), cmd.token());
        self.exchange_write(&frame).await
    }

    /// Send a query and return its value line.
    pub async fn read<Q: QueryCommand>(&mut self, query: Q) -> Result<String> {
        debug!(category = ?query.category(), token = query.token(), "query");
        let frame = protocol::encode_query(self.prefix(), query.token());
        let value = self.exchange_read(&frame).await?;
        debug!(token = query.token(), value = %value, "query reply");
        Ok(value)
    }

    async fn exchange_write(&mut self, frame: &[u8]) -> Result<()> {
        let outcome = self.try_write(frame).await;
        self.settle(outcome).await
    }

    async fn exchange_read(&mut self, frame: &[u8]) -> Result<String> {
        let outcome = self.try_read(frame).await;
        self.settle(outcome).await
    }

    async fn try_write(&mut self, frame: &[u8]) -> Result<()> {
        self.send_frame(frame).await?;
        let reply = self.channel.read_line().await?;
        if let Some(extra) = self.channel.take_buffered() {
            return Err(Error::AcknowledgementMismatch {
                sent: frame_text(frame),
                received: format!("{reply}\n{extra}"),
            });
        }
        check_ack(frame, reply)
    }

    async fn try_read(&mut self, frame: &[u8]) -> Result<String> {
        self.send_frame(frame).await?;
        let value = self.channel.read_line().await?;
        let ack = self.channel.read_line().await?;
        let extra = self.channel.take_buffered();
        if ack != ACK || extra.is_some() {
            let mut received = format!("{value}\n{ack}");
            if let Some(extra) = extra {
                received.push('\n');
                received.push_str(&extra);
            }
            return Err(Error::AcknowledgementMismatch {
                sent: frame_text(frame),
                received,
            });
        }
        Ok(value)
    }

    async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        if let Some(stale) = self.channel.take_buffered() {
            warn!(stale = %stale, "dropping unsolicited input before request");
        }
        self.channel.write_line(frame).await
    }

    /// A failed exchange may leave part of its reply on the line. Drop it so
    /// the next request starts clean.
    async fn settle<T>(&mut self, outcome: Result<T>) -> Result<T> {
        if let Err(e) = &outcome {
            debug!(error = %e, "exchange failed, discarding input");
            if let Err(reset) = self.channel.reset_buffers().await {
                warn!(error = %reset, "could not discard input after failed exchange");
            }
        }
        outcome
    }

    /// Discard any input buffered before this point.
    pub async fn reset_buffers(&mut self) -> Result<()> {
        self.channel.reset_buffers().await
    }

    /// Close the underlying channel.
    pub async fn close(&mut self) -> Result<()> {
        self.channel.close().await
    }

    /// Whether the underlying channel is connected.
    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }
}

fn frame_text(frame: &[u8]) -> String {
    strip_terminator(&String::from_utf8_lossy(frame)).to_string()
}

fn check_ack(frame: &[u8], reply: String) -> Result<()> {
    if reply == ACK {
        Ok(())
    } else {
        Err(Error::AcknowledgementMismatch {
            sent: frame_text(frame),
            received: reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use obis_test_harness::MockTransport;

    use crate::commands::{
        Ieee488Command, OperationalCommand, SessionControlQuery, SystemInfoCommand,
        SystemInfoQuery,
    };

    fn codec(mock: MockTransport, prefix: Option<&str>) -> CommandCodec {
        let channel = LineChannel::new(Box::new(mock), Duration::from_millis(50));
        CommandCodec::new(channel, prefix.map(str::to_string))
    }

    #[tokio::test]
    async fn write_accepts_ok() {
        let mut mock = MockTransport::new();
        mock.expect(b"SOUR:AM:STAT ON\r\n", b"OK\r\n");

        let mut c = codec(mock, None);
        c.write(OperationalCommand::LaserOutputState, "ON").await.unwrap();
    }

    #[tokio::test]
    async fn write_uses_prefix() {
        let mut mock = MockTransport::new();
        mock.expect(b"2 SOUR:AM:EXT DIGITAL\r\n", b"OK\r\n");

        let mut c = codec(mock, Some("2"));
        assert_eq!(c.prefix(), Some("2"));
        c.write(OperationalCommand::ModeExternal, "DIGITAL").await.unwrap();
    }

    #[tokio::test]
    async fn write_rejects_other_reply() {
        let mut mock = MockTransport::new();
        mock.expect(b"SOUR:AM:INT MIXED\r\n", b"ERR-350\r\n");

        let mut c = codec(mock, None);
        let err = c
            .write(OperationalCommand::ModeInternalCw, "MIXED")
            .await
            .unwrap_err();
        match err {
            Error::AcknowledgementMismatch { sent, received } => {
                assert_eq!(sent, "SOUR:AM:INT MIXED");
                assert_eq!(received, "ERR-350");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_returns_value_line() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:INF:WAV?\r\n", b"488\r\nOK\r\n");

        let mut c = codec(mock, None);
        assert_eq!(c.read(SystemInfoQuery::Wavelength).await.unwrap(), "488");
    }

    #[tokio::test]
    async fn read_rejects_missing_ack() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:STAT?\r\n", b"C8001002\r\nERR\r\n");

        let mut c = codec(mock, None);
        let err = c.read(SessionControlQuery::SystemStatus).await.unwrap_err();
        match err {
            Error::AcknowledgementMismatch { sent, received } => {
                assert_eq!(sent, "SYST:STAT?");
                assert!(received.contains("C8001002"));
                assert!(received.contains("ERR"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_times_out_without_ack() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:STAT?\r\n", b"C8001002\r\n");

        let mut c = codec(mock, None);
        let err = c.read(SessionControlQuery::SystemStatus).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn stale_ok_is_cleared_by_reset() {
        let mut mock = MockTransport::new();
        mock.push_stale(b"OK\r\n");
        mock.expect(b"SYST:INF:WAV?\r\n", b"640\r\nOK\r\n");

        let mut c = codec(mock, None);
        c.reset_buffers().await.unwrap();
        assert_eq!(c.read(SystemInfoQuery::Wavelength).await.unwrap(), "640");
    }

    #[tokio::test]
    async fn partial_reply_does_not_leak_into_next_read() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:INF:WAV?\r\n", b"12");
        mock.expect(b"SYST:INF:WAV?\r\n", b"488\r\nOK\r\n");

        let mut c = codec(mock, None);
        let err = c.read(SystemInfoQuery::Wavelength).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(c.read(SystemInfoQuery::Wavelength).await.unwrap(), "488");
    }

    #[tokio::test]
    async fn late_ack_followed_by_rejection_is_not_success() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:STAT?\r\n", b"C8001002\r\n");
        mock.expect(b"SOUR:AM:INT CWP\r\n", b"OK\r\nERR-350\r\n");

        let mut c = codec(mock, None);
        assert!(c.read(SessionControlQuery::SystemStatus).await.unwrap_err().is_transport());
        let err = c
            .write(OperationalCommand::ModeInternalCw, "CWP")
            .await
            .unwrap_err();
        match err {
            Error::AcknowledgementMismatch { sent, received } => {
                assert_eq!(sent, "SOUR:AM:INT CWP");
                assert_eq!(received, "OK\nERR-350");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn trailing_line_after_query_ack_is_rejected() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:INF:WAV?\r\n", b"488\r\nOK\r\nOK\r\n");
        mock.expect(b"SYST:INF:WAV?\r\n", b"640\r\nOK\r\n");

        let mut c = codec(mock, None);
        assert!(matches!(
            c.read(SystemInfoQuery::Wavelength).await,
            Err(Error::AcknowledgementMismatch { .. })
        ));
        assert_eq!(c.read(SystemInfoQuery::Wavelength).await.unwrap(), "640");
    }

    #[tokio::test]
    async fn write_after_rejected_write() {
        let mut mock = MockTransport::new();
        mock.expect(b"SOUR:AM:STAT ON\r\n", b"ERR-100\r\n");
        mock.expect(b"SOUR:AM:STAT ON\r\n", b"OK\r\n");

        let mut c = codec(mock, None);
        assert!(c.write(OperationalCommand::LaserOutputState, "ON").await.is_err());
        c.write(OperationalCommand::LaserOutputState, "ON").await.unwrap();
    }

    #[tokio::test]
    async fn execute_sends_bare_token() {
        let mut mock = MockTransport::new();
        mock.expect(b"1 *RST\r\n", b"OK\r\n");

        let mut c = codec(mock, Some("1"));
        c.execute(Ieee488Command::WarmBoot).await.unwrap();
    }

    #[tokio::test]
    async fn empty_value_is_rejected_before_sending() {
        // No expectations: anything reaching the transport would fail differently.
        let mut c = codec(MockTransport::new(), None);
        for result in [
            c.write(SystemInfoCommand::User, "").await,
            c.write(Ieee488Command::WarmBoot, "now").await,
            c.execute(SystemInfoCommand::User).await,
        ] {
            assert!(matches!(result, Err(Error::InvalidParameter(_))), "{result:?}");
        }
    }
}
