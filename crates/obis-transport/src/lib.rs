//! Transport implementations for OBIS laser control.
//!
//! This crate provides the concrete implementation of the
//! [`Transport`](obis_core::Transport) trait used against real hardware:
//!
//! - [`SerialTransport`]: the laser's USB virtual COM port or RS-232 link
//!
//! # Example
//!
//! ```no_run
//! use obis_transport::SerialTransport;
//! use obis_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> obis_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyACM0", 9600).await?;
//!
//! transport.send(b"SYST:STAT?\r\n").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DEFAULT_BAUD_RATE, SerialTransport};
