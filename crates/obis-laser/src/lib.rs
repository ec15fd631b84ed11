//! Protocol engine for Coherent OBIS LS and LX lasers.
//!
//! OBIS heads are controlled over a USB virtual COM port (or RS-232) with a
//! SCPI-derived ASCII protocol. This crate provides:
//!
//! - **Command tables** ([`commands`]) -- every wire token, grouped by
//!   category and split into writes and queries.
//! - **Frame codec** ([`protocol`]) -- encode write/query frames with an
//!   optional unit prefix, and decode them back.
//! - **Command codec** ([`codec`]) -- send a frame and enforce the `OK`
//!   acknowledgement contract.
//! - **Status decoding** ([`status`]) -- the `SYST:STAT?` code table and the
//!   warming-up / fault / ready classification.
//! - **Models** ([`models`]) -- the LS and LX families and their modulation
//!   modes.
//! - **Modulation routing** ([`modulation`]) -- send a mode through
//!   `SOUR:AM:INT` or `SOUR:AM:EXT` depending on its class.
//! - **Readiness waiting** ([`readiness`]) -- poll status until the laser is
//!   ready or faulted.
//! - **Device handle** ([`laser`]) and **builder** ([`builder`]).
//!
//! # Example
//!
//! ```
//! use obis_laser::protocol::{encode_write, decode_frame};
//! use obis_laser::status::{DeviceState, Readiness};
//!
//! let frame = encode_write(None, "SOUR:AM:STAT", "ON");
//! assert_eq!(frame, b"SOUR:AM:STAT ON\r\n");
//! assert_eq!(decode_frame(&frame).unwrap().argument.as_deref(), Some("ON"));
//!
//! let state = DeviceState::decode("C8001100").unwrap();
//! assert_eq!(state, DeviceState::KeyOnIntWarmup);
//! assert_eq!(Readiness::classify("C8001100"), Readiness::WarmingUp);
//! ```

pub mod builder;
pub mod codec;
pub mod commands;
pub mod laser;
pub mod models;
pub mod modulation;
pub mod protocol;
pub mod readiness;
pub mod status;

pub use builder::ObisBuilder;
pub use commands::{AnalogInputImpedance, OnOff};
pub use laser::{DeviceInfo, ObisLaser};
pub use models::{ModulationMode, ObisModel, Variant, obis_ls, obis_lx};
pub use readiness::WaitOptions;
pub use status::{DeviceState, Readiness};

#[cfg(test)]
mod tests {
    use obis_test_harness::MockTransport;

    use crate::{ObisBuilder, obis_ls};

    #[tokio::test]
    async fn connect_wait_enable() {
        let mut mock = MockTransport::new();
        mock.expect(b"SYST:STAT?\r\n", b"C8001100\r\nOK\r\n");
        mock.expect(b"SYST:STAT?\r\n", b"C8001002\r\nOK\r\n");
        mock.expect(b"SOUR:AM:STAT ON\r\n", b"OK\r\n");

        let mut laser = ObisBuilder::new(obis_ls())
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();
        laser.wait_until_ready().await.unwrap();
        laser.enable().await.unwrap();
        laser.disconnect().await.unwrap();
    }
}
