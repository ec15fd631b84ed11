//! Line framing for the OBIS text protocol.
//!
//! Every frame in either direction is ASCII text terminated by `\r\n`. The
//! laser acknowledges each accepted command with the literal line `OK`.
//! Replies are split on `\n`; any trailing `\r` / `\n` characters are
//! stripped before a line is handed to the codec.

use bytes::{BufMut, BytesMut};

/// The line terminator used in both directions.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// The acknowledgement line that follows every accepted write or query.
pub const ACK: &str = "OK";

/// Result of attempting to decode one line from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete line was decoded.
    Line {
        /// Line content with the terminator stripped.
        text: String,
        /// Number of bytes consumed from the input buffer.
        consumed: usize,
    },

    /// A complete line was found but it is not valid UTF-8.
    ///
    /// The `usize` is the number of bytes consumed from the input buffer.
    Invalid(usize),

    /// The buffer does not yet contain a complete line. More data is needed.
    Incomplete,
}

/// Append the line terminator to `body`.
///
/// # Example
///
/// ```
/// use obis_text_io::protocol::encode_line;
///
/// assert_eq!(encode_line("SYST:STAT?"), b"SYST:STAT?\r\n");
/// ```
pub fn encode_line(body: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(body.len() + LINE_TERMINATOR.len());
    buf.put_slice(body.as_bytes());
    buf.put_slice(LINE_TERMINATOR);
    buf.to_vec()
}

/// Strip any trailing `\r` and `\n` characters from a line.
pub fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Decode one `\n`-terminated line from a byte buffer.
///
/// Returns the first complete line found, or [`DecodeResult::Incomplete`] if
/// no newline is present yet.
///
/// # Example
///
/// ```
/// use obis_text_io::protocol::{decode_line, DecodeResult};
///
/// match decode_line(b"C8001002\r\nOK\r\n") {
///     DecodeResult::Line { text, consumed } => {
///         assert_eq!(text, "C8001002");
///         assert_eq!(consumed, 10);
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn decode_line(buf: &[u8]) -> DecodeResult {
    let newline = match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None => return DecodeResult::Incomplete,
    };

    let consumed = newline + 1;
    match std::str::from_utf8(&buf[..consumed]) {
        Ok(s) => DecodeResult::Line {
            text: strip_terminator(s).to_string(),
            consumed,
        },
        Err(_) => DecodeResult::Invalid(consumed),
    }
}
