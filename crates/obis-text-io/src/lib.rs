//! Line-oriented IO for the OBIS text protocol.
//!
//! OBIS lasers answer every command with one or two `\r\n`-terminated ASCII
//! lines. This crate turns a byte-level [`Transport`](obis_core::Transport)
//! into a line channel that the command codec can drive.
//!
//! # Architecture
//!
//! - [`protocol`] -- line encode/decode for `\r\n`-terminated frames
//! - [`io`] -- [`LineChannel`](io::LineChannel), the buffered line reader/writer

pub mod io;
pub mod protocol;

pub use io::LineChannel;
