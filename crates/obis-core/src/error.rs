//! Error types for OBIS laser control.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. The variants fall into four families
//! that callers can tell apart programmatically:
//!
//! - transport failures ([`Error::is_transport`]),
//! - acknowledgement mismatches (the laser did not answer `OK`),
//! - unrecognized status codes,
//! - fault states observed while waiting for the laser to become ready.

use std::time::Duration;

/// The error type for all OBIS operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port could not be opened, link failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// Timed out at the stream layer while waiting for a reply line.
    ///
    /// This typically indicates the laser is powered off, the baud rate is
    /// wrong, or a daisy-chain prefix addresses a unit that is not present.
    #[error("timeout waiting for response")]
    Timeout,

    /// No connection to the laser has been established, or it was closed.
    #[error("not connected")]
    NotConnected,

    /// The connection to the laser was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write or query did not receive the literal `OK` acknowledgement line.
    ///
    /// `sent` is the frame that was written (without the line terminator);
    /// `received` is the content that arrived where `OK` was expected, or the
    /// value line that was discarded for a query.
    #[error("expected OK after sending {sent:?}, received {received:?}")]
    AcknowledgementMismatch {
        /// The frame sent to the laser.
        sent: String,
        /// The unexpected content read back.
        received: String,
    },

    /// The laser reported a status code that is absent from the known table.
    #[error("unrecognized status code: {0:?}")]
    UnrecognizedStatus(String),

    /// The laser reported a fault while waiting for it to become ready.
    #[error("laser is in a fault state (status {code})")]
    Fault {
        /// The raw status code that was classified as a fault.
        code: String,
    },

    /// A reply could not be decoded (bad number, unknown enumeration token).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An invalid parameter was passed to a laser operation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A readiness wait was cancelled by its caller.
    #[error("wait cancelled")]
    Cancelled,

    /// A readiness wait did not reach a terminal state within its deadline.
    #[error("laser not ready after {0:?}")]
    WaitTimeout(Duration),
}

impl Error {
    /// Whether this error originated in the transport layer.
    ///
    /// Transport errors are never retried by the protocol engine; the caller
    /// decides whether to reconnect.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Timeout
                | Error::NotConnected
                | Error::ConnectionLost
                | Error::Io(_)
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
