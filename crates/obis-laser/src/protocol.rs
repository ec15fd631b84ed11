//! OBIS command frame encoder/decoder.
//!
//! OBIS lasers speak a SCPI-derived ASCII protocol over a serial link. Every
//! request is one line terminated by `\r\n`.
//!
//! # Frame format
//!
//! ```text
//! [<prefix> ]<token> <value>\r\n     write
//! [<prefix> ]<token>\r\n             query
//! ```
//!
//! - `prefix`: optional address of a unit sharing the line (e.g. a head on
//!   an OBIS remote). Omitted entirely, separator included, when unset.
//! - `token`: the command token, e.g. `SOUR:AM:STAT` or `SYST:STAT?`.
//!   Query tokens end in `?`.
//! - `value`: the write argument. Argument-less writes (`*RST`) carry no
//!   separator.
//!
//! # Reply format
//!
//! A write is answered by `OK\r\n`. A query is answered by the value line
//! followed by `OK\r\n`. Line splitting lives in `obis_text_io`.

use bytes::{BufMut, BytesMut};

use obis_text_io::protocol::{LINE_TERMINATOR, strip_terminator};

/// A request frame split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Unit address, if the frame carried one.
    pub prefix: Option<String>,
    /// Command token.
    pub token: String,
    /// Write argument. `None` for queries and argument-less writes.
    pub argument: Option<String>,
}

impl Frame {
    /// Whether this frame is a query (token ends in `?`).
    pub fn is_query(&self) -> bool {
        self.token.ends_with('?')
    }
}

fn put_prefix(buf: &mut BytesMut, prefix: Option<&str>) {
    if let Some(p) = prefix {
        buf.put_slice(p.as_bytes());
        buf.put_u8(b' ');
    }
}

/// Encode a write frame carrying `value`.
///
/// # Example
///
/// ```
/// use obis_laser::protocol::encode_write;
///
/// assert_eq!(encode_write(None, "SOUR:AM:STAT", "ON"), b"SOUR:AM:STAT ON\r\n");
/// assert_eq!(encode_write(Some("2"), "SOUR:AM:EXT", "ANALOG"), b"2 SOUR:AM:EXT ANALOG\r\n");
/// ```
pub fn encode_write(prefix: Option<&str>, token: &str, value: &str) -> Vec<u8> {
    let capacity = prefix.map_or(0, |p| p.len() + 1) + token.len() + value.len() + 3;
    let mut buf = BytesMut::with_capacity(capacity);
    put_prefix(&mut buf, prefix);
    buf.put_slice(token.as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(value.as_bytes());
    buf.put_slice(LINE_TERMINATOR);
    buf.to_vec()
}

/// Encode an action that carries no value, such as `*RST`.
///
/// ```
/// use obis_laser::protocol::encode_action;
///
/// assert_eq!(encode_action(Some("1"), "*RST"), b"1 *RST\r\n");
/// ```
pub fn encode_action(prefix: Option<&str>, token: &str) -> Vec<u8> {
    encode_bare(prefix, token)
}

/// Encode a query frame.
///
/// # Example
///
/// ```
/// use obis_laser::protocol::encode_query;
///
/// assert_eq!(encode_query(None, "SYST:STAT?"), b"SYST:STAT?\r\n");
/// assert_eq!(encode_query(Some("1"), "SYST:STAT?"), b"1 SYST:STAT?\r\n");
/// ```
pub fn encode_query(prefix: Option<&str>, token: &str) -> Vec<u8> {
    encode_bare(prefix, token)
}

fn encode_bare(prefix: Option<&str>, token: &str) -> Vec<u8> {
    let capacity = prefix.map_or(0, |p| p.len() + 1) + token.len() + 2;
    let mut buf = BytesMut::with_capacity(capacity);
    put_prefix(&mut buf, prefix);
    buf.put_slice(token.as_bytes());
    buf.put_slice(LINE_TERMINATOR);
    buf.to_vec()
}

/// Whether `word` looks like a command token rather than a unit address.
///
/// Tokens are either SCPI paths (`SYST:STAT?`) or IEEE-488 common commands
/// (`*RST`).
fn is_token(word: &str) -> bool {
    word.contains(':') || word.starts_with('*')
}

/// Split a request frame into prefix, token and argument.
///
/// Returns `None` if the frame is not ASCII or contains no token.
///
/// # Example
///
/// ```
/// use obis_laser::protocol::decode_frame;
///
/// let frame = decode_frame(b"2 SOUR:POW:LEV:IMM:AMPL 0.05\r\n").unwrap();
/// assert_eq!(frame.prefix.as_deref(), Some("2"));
/// assert_eq!(frame.token, "SOUR:POW:LEV:IMM:AMPL");
/// assert_eq!(frame.argument.as_deref(), Some("0.05"));
/// ```
pub fn decode_frame(frame: &[u8]) -> Option<Frame> {
    if !frame.is_ascii() {
        return None;
    }
    let text = std::str::from_utf8(frame).ok()?;
    let text = strip_terminator(text);

    let (first, rest) = match text.split_once(' ') {
        Some((first, rest)) => (first, Some(rest)),
        None => (text, None),
    };
    if first.is_empty() {
        return None;
    }

    let (prefix, token, argument) = if is_token(first) {
        (None, first, rest)
    } else {
        let rest = rest?;
        let (token, argument) = match rest.split_once(' ') {
            Some((token, argument)) => (token, Some(argument)),
            None => (rest, None),
        };
        (Some(first), token, argument)
    };

    if token.is_empty() {
        return None;
    }

    Some(Frame {
        prefix: prefix.map(str::to_string),
        token: token.to_string(),
        argument: argument.filter(|a| !a.is_empty()).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_without_prefix() {
        assert_eq!(
            encode_write(None, "SOUR:AM:INT", "CWP"),
            b"SOUR:AM:INT CWP\r\n"
        );
    }

    #[test]
    fn write_with_prefix() {
        assert_eq!(
            encode_write(Some("3"), "SOUR:AM:STAT", "OFF"),
            b"3 SOUR:AM:STAT OFF\r\n"
        );
    }

    #[test]
    fn action_has_no_argument() {
        assert_eq!(encode_action(None, "*RST"), b"*RST\r\n");
        assert_eq!(encode_action(Some("1"), "SYST:ERR:CLE"), b"1 SYST:ERR:CLE\r\n");
    }

    #[test]
    fn query_with_and_without_prefix() {
        assert_eq!(encode_query(None, "SOUR:AM:SOUR?"), b"SOUR:AM:SOUR?\r\n");
        assert_eq!(encode_query(Some("1"), "SYST:INF:WAV?"), b"1 SYST:INF:WAV?\r\n");
    }

    #[test]
    fn decode_write_keeps_argument() {
        let frame = decode_frame(b"SOUR:POW:LEV:IMM:AMPL 0.0125\r\n").unwrap();
        assert_eq!(
            frame,
            Frame {
                prefix: None,
                token: "SOUR:POW:LEV:IMM:AMPL".into(),
                argument: Some("0.0125".into()),
            }
        );
        assert!(!frame.is_query());
    }

    #[test]
    fn decode_query() {
        let frame = decode_frame(b"1 SYST:STAT?\r\n").unwrap();
        assert_eq!(frame.prefix.as_deref(), Some("1"));
        assert_eq!(frame.token, "SYST:STAT?");
        assert_eq!(frame.argument, None);
        assert!(frame.is_query());
    }

    #[test]
    fn decode_ieee_command() {
        let frame = decode_frame(b"*RST\r\n").unwrap();
        assert_eq!(frame.prefix, None);
        assert_eq!(frame.token, "*RST");
        assert_eq!(frame.argument, None);
    }

    #[test]
    fn decode_argument_with_spaces() {
        let frame = decode_frame(b"SYST:INF:USER bench 4 head\r\n").unwrap();
        assert_eq!(frame.argument.as_deref(), Some("bench 4 head"));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_frame(b"\r\n"), None);
        assert_eq!(decode_frame(b"2\r\n"), None);
        assert_eq!(decode_frame(&[0xC8, b'\r', b'\n']), None);
    }

    #[test]
    fn argument_survives_round_trip() {
        for (prefix, token, value) in [
            (None, "SOUR:AM:EXT", "MIXSO"),
            (Some("2"), "SYST:INF:AMOD:TYP", "2"),
            (Some("1"), "SYST:INF:USER", "line 3 / head B"),
        ] {
            let frame = decode_frame(&encode_write(prefix, token, value)).unwrap();
            assert_eq!(frame.prefix.as_deref(), prefix);
            assert_eq!(frame.token, token);
            assert_eq!(frame.argument.as_deref(), Some(value));
        }
    }
}
