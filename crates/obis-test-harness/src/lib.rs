//! obis-test-harness: Test utilities for the OBIS protocol engine.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the command codec, status polling and settings accessors without a laser
//! on the bench.

pub mod mock_serial;

pub use mock_serial::MockTransport;
