//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test frame encoding, acknowledgement
//! checking and status polling without real hardware.
//!
//! # Example
//!
//! ```
//! use obis_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the engine sends a status query, answer with a ready code and OK.
//! mock.expect(b"SYST:STAT?\r\n", b"C8001002\r\nOK\r\n");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use obis_core::error::{Error, Result};
use obis_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes to return when the matching request is received.
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing the protocol engine without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation. The
/// corresponding response is then returned by subsequent `receive()` calls.
///
/// Bytes queued with [`push_stale`](Self::push_stale) model replies left in
/// the OS buffers by an earlier session: they are returned ahead of any
/// response until [`reset_buffers`](Transport::reset_buffers) discards them.
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Leftover input from before the session started.
    stale: Vec<u8>,
    /// The response data pending for the next `receive()` call.
    pending_response: Option<Vec<u8>>,
    /// Cursor into the pending response (how many bytes have been read so far).
    response_cursor: usize,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
    /// How many times `reset_buffers()` has been called.
    resets: usize,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            stale: Vec::new(),
            pending_response: None,
            response_cursor: 0,
            connected: true,
            sent_log: Vec::new(),
            resets: 0,
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, the subsequent
    /// `receive()` calls will return `response`.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Queue bytes that were "already on the line" before the session began.
    pub fn push_stale(&mut self, data: &[u8]) {
        self.stale.extend_from_slice(data);
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Return how many times the buffers were reset.
    pub fn reset_count(&self) -> usize {
        self.resets
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Transport(format!(
                    "unexpected send data: expected {:?}, got {:?}",
                    String::from_utf8_lossy(&expectation.request),
                    String::from_utf8_lossy(data)
                )));
            }
            self.pending_response = Some(expectation.response);
            self.response_cursor = 0;
            Ok(())
        } else {
            Err(Error::Transport(format!(
                "no more expectations in mock transport (sent {:?})",
                String::from_utf8_lossy(data)
            )))
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if !self.stale.is_empty() {
            let n = self.stale.len().min(buf.len());
            buf[..n].copy_from_slice(&self.stale[..n]);
            self.stale.drain(..n);
            return Ok(n);
        }

        if let Some(ref response) = self.pending_response {
            let remaining = &response[self.response_cursor..];
            if remaining.is_empty() {
                self.pending_response = None;
                self.response_cursor = 0;
                return Err(Error::Timeout);
            }
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            self.response_cursor += n;
            if self.response_cursor >= response.len() {
                self.pending_response = None;
                self.response_cursor = 0;
            }
            Ok(n)
        } else {
            Err(Error::Timeout)
        }
    }

    async fn reset_buffers(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.stale.clear();
        self.resets += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending_response = None;
        self.response_cursor = 0;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
