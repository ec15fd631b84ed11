//! obis-core: Core traits and error definitions for OBIS laser control.
//!
//! This crate defines the pieces every other crate in the workspace shares:
//! the byte-level [`Transport`] trait that the protocol engine talks through,
//! and the [`Error`] taxonomy that every fallible operation returns.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel to the laser
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;

pub use error::{Error, Result};
pub use transport::Transport;
