//! Mock transport for deterministic testing of the line state machine and
//! the AT protocol layer.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs, and its handles share the same recorded state,
//! so a test can keep a clone of the transport for assertions after the
//! serial line has taken ownership of the original.
//!
//! # Example
//!
//! ```
//! use gsmlink_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // Pre-load: when the protocol layer flushes this frame, the next read
//! // returns this reply.
//! mock.expect(b"AT\r\n", b"AT\r\nOK\r\n");
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gsmlink_core::error::{Error, Result};
use gsmlink_core::transport::{com_port_index, LineHandle, OpenMode, Transport};

/// A pre-loaded request/response pair.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes expected in one flushed write.
    request: Vec<u8>,
    /// The bytes served by subsequent reads once the request matched.
    response: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Response data pending for reads.
    pending_response: Vec<u8>,
    /// Cursor into the pending response.
    response_cursor: usize,
    /// Log of all byte sequences written through any handle.
    sent_log: Vec<Vec<u8>>,
    /// Devices passed to `probe()`.
    probed: Vec<String>,
    /// `(device, args)` pairs passed to `configure()`.
    configured: Vec<(String, Vec<String>)>,
    /// Devices passed to `open()`.
    opened: Vec<String>,
    /// Number of successful handle closes.
    closes: usize,
    fail_probe: bool,
    fail_configure: bool,
    fail_open: bool,
    fail_close: bool,
    fail_write: bool,
}

/// A mock [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order: each flushed write is matched
/// against the next expectation and its response becomes the data served
/// by subsequent reads, in bounded chunks. Reads with nothing pending
/// return 0 bytes, matching the non-blocking "no data available" contract.
///
/// The transport is cheaply cloneable; clones share state, so recorders
/// like [`sent_data`](MockTransport::sent_data) keep working after the
/// original has been boxed into a serial line.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected request/response pair.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.lock().expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Queue unsolicited inbound data, served by subsequent reads without
    /// any preceding write (e.g. a `+CMT` notification pushed by the
    /// modem).
    pub fn push_incoming(&self, data: &[u8]) {
        let mut state = self.lock();
        let cursor = state.response_cursor;
        state.pending_response.drain(..cursor);
        state.response_cursor = 0;
        state.pending_response.extend_from_slice(data);
    }

    /// All byte sequences written through any handle, one per write.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.lock().sent_log.clone()
    }

    /// Devices that have been probed.
    pub fn probed_devices(&self) -> Vec<String> {
        self.lock().probed.clone()
    }

    /// `(device, args)` pairs passed to the configuration tool.
    pub fn configured_args(&self) -> Vec<(String, Vec<String>)> {
        self.lock().configured.clone()
    }

    /// Devices that have been opened.
    pub fn opened_devices(&self) -> Vec<String> {
        self.lock().opened.clone()
    }

    /// Number of successful handle closes.
    pub fn close_count(&self) -> usize {
        self.lock().closes
    }

    /// Number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.lock().expectations.len()
    }

    /// Make subsequent `probe()` calls fail with [`Error::UnknownDevice`].
    pub fn fail_probe(&self, fail: bool) {
        self.lock().fail_probe = fail;
    }

    /// Make subsequent `configure()` calls fail with
    /// [`Error::CantConfigureDevice`].
    pub fn fail_configure(&self, fail: bool) {
        self.lock().fail_configure = fail;
    }

    /// Make subsequent `open()` calls fail with [`Error::CantOpenDevice`].
    pub fn fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Make subsequent handle closes fail with [`Error::CantCloseDevice`].
    pub fn fail_close(&self, fail: bool) {
        self.lock().fail_close = fail;
    }

    /// Make subsequent writes fail with [`Error::CantWriteOnDevice`].
    pub fn fail_write(&self, fail: bool) {
        self.lock().fail_write = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn normalize_device(&self, name: &str) -> String {
        // Unix alias rule, so alias tests run without hardware.
        match com_port_index(name) {
            Some(n) => format!("/dev/ttyS{}", n.saturating_sub(1)),
            None => name.to_string(),
        }
    }

    async fn probe(&self, device: &str) -> Result<()> {
        let mut state = self.lock();
        state.probed.push(device.to_string());
        if state.fail_probe {
            Err(Error::UnknownDevice(device.to_string()))
        } else {
            Ok(())
        }
    }

    async fn configure(&self, device: &str, args: &[String]) -> Result<()> {
        let mut state = self.lock();
        state.configured.push((device.to_string(), args.to_vec()));
        if state.fail_configure {
            Err(Error::CantConfigureDevice("mock failure".into()))
        } else {
            Ok(())
        }
    }

    async fn open(&self, device: &str, _mode: &OpenMode) -> Result<Box<dyn LineHandle>> {
        let mut state = self.lock();
        state.opened.push(device.to_string());
        if state.fail_open {
            Err(Error::CantOpenDevice("mock failure".into()))
        } else {
            Ok(Box::new(MockLineHandle {
                state: Arc::clone(&self.state),
            }))
        }
    }
}

/// Handle side of the mock; shares state with the owning [`MockTransport`].
#[derive(Debug)]
pub struct MockLineHandle {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl LineHandle for MockLineHandle {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let cursor = state.response_cursor;
        let remaining = state.pending_response.len().saturating_sub(cursor);
        if remaining == 0 {
            return Ok(0);
        }
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&state.pending_response[cursor..cursor + n]);
        state.response_cursor += n;
        Ok(n)
    }

    async fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.fail_write {
            return Err(Error::CantWriteOnDevice("mock failure".into()));
        }

        state.sent_log.push(data.to_vec());

        match state.expectations.pop_front() {
            Some(expectation) => {
                if data != expectation.request.as_slice() {
                    return Err(Error::InvalidParameter(format!(
                        "unexpected write: expected {:02X?}, got {:02X?}",
                        expectation.request, data
                    )));
                }
                state.pending_response = expectation.response;
                state.response_cursor = 0;
                Ok(())
            }
            None => Err(Error::InvalidParameter(
                "no more expectations in mock transport".into(),
            )),
        }
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.fail_close {
            return Err(Error::CantCloseDevice("mock failure".into()));
        }
        state.closes += 1;
        state.pending_response.clear();
        state.response_cursor = 0;
        Ok(())
    }
}
