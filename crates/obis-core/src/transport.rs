//! Transport trait for laser communication.
//!
//! The [`Transport`] trait abstracts over the physical link to the laser.
//! The real implementation is a serial port (`obis-transport`); tests use
//! `MockTransport` from the `obis-test-harness` crate.
//!
//! Line framing, acknowledgement checking and command encoding live above
//! this trait. A transport only moves bytes.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a laser.
///
/// Implementations never retry: every I/O failure is returned to the caller
/// as soon as it is observed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the laser.
    ///
    /// Implementations should not return until all bytes have been handed to
    /// the underlying link.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the laser into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if no data is received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Discard any bytes queued in either direction before this call.
    ///
    /// Called once when a session starts so that replies left over from a
    /// previous session cannot be mistaken for answers to new commands.
    async fn reset_buffers(&mut self) -> Result<()>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
