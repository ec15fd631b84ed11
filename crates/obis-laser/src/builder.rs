//! ObisBuilder -- fluent builder for constructing [`ObisLaser`] instances.
//!
//! Separates configuration from construction so that callers can set up the
//! serial port, the unit prefix and the read timeout before the transport is
//! opened.
//!
//! # Example
//!
//! ```no_run
//! use obis_laser::builder::ObisBuilder;
//! use obis_laser::models::obis_lx;
//! use std::time::Duration;
//!
//! # async fn example() -> obis_core::Result<()> {
//! let mut laser = ObisBuilder::new(obis_lx())
//!     .serial_port("/dev/ttyACM0")
//!     .response_timeout(Duration::from_millis(500))
//!     .build()
//!     .await?;
//! laser.wait_until_ready().await?;
//! laser.enable().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::debug;

use obis_core::error::{Error, Result};
use obis_core::transport::Transport;
use obis_text_io::LineChannel;
use obis_text_io::io::DEFAULT_READ_TIMEOUT;
use obis_transport::SerialTransport;

use crate::codec::CommandCodec;
use crate::laser::ObisLaser;
use crate::models::ObisModel;

/// Fluent builder for [`ObisLaser`].
pub struct ObisBuilder {
    model: ObisModel,
    serial_port: Option<String>,
    baud_rate: u32,
    prefix: Option<String>,
    response_timeout: Duration,
}

impl ObisBuilder {
    /// Create a new builder for the given model.
    pub fn new(model: ObisModel) -> Self {
        ObisBuilder {
            baud_rate: model.default_baud_rate,
            model,
            serial_port: None,
            prefix: None,
            response_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyACM0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the model's baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Address one unit on a shared line. Every frame is sent as
    /// `<prefix> <command>`.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Time to wait for each chunk of a reply (default: 1s).
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Build an [`ObisLaser`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `obis-test-harness`). Input left on the transport by an earlier
    /// session is discarded before the handle is returned.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<ObisLaser> {
        if let Some(prefix) = &self.prefix {
            if prefix.is_empty() || !prefix.is_ascii() || prefix.contains(char::is_whitespace) {
                return Err(Error::InvalidParameter(format!(
                    "prefix must be a non-empty ASCII word, got {prefix:?}"
                )));
            }
        }

        let channel = LineChannel::new(transport, self.response_timeout);
        let mut codec = CommandCodec::new(channel, self.prefix);
        codec.reset_buffers().await?;

        debug!(
            model = self.model.name,
            prefix = ?codec.prefix(),
            timeout_ms = self.response_timeout.as_millis() as u64,
            "laser handle ready"
        );
        Ok(ObisLaser::new(codec, self.model))
    }

    /// Build an [`ObisLaser`] on a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<ObisLaser> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = SerialTransport::open(port, self.baud_rate).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}
