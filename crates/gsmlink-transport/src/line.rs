//! Serial line lifecycle state machine.
//!
//! [`SerialLine`] owns the byte-stream handle to a serial device and
//! tracks it through the `Unset -> Configured -> Open` lifecycle. All
//! platform access goes through the injected [`Transport`] capability and
//! [`LineConfigTranslator`], so the state machine itself is identical on
//! every OS.
//!
//! # Lifecycle
//!
//! ```text
//! Unset --bind_device--> Configured --open--> Open
//!                            ^                  |
//!                            +------close-------+
//! ```
//!
//! Every operation validates the current state first and leaves the state
//! unchanged when it fails, so a caller can correct its sequencing and
//! retry the same call.
//!
//! # Example
//!
//! ```no_run
//! use gsmlink_core::LineConfig;
//! use gsmlink_transport::SerialLine;
//!
//! # async fn example() -> gsmlink_core::Result<()> {
//! let mut line = SerialLine::native().await?;
//! line.bind_device("/dev/ttyUSB0").await?;
//! line.apply_configuration(&LineConfig::new(115_200)?).await?;
//! line.open("r+b").await?;
//! line.send(b"AT\r\n", std::time::Duration::from_millis(100)).await?;
//! let reply = line.read(None).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::{debug, trace};

use gsmlink_core::config::{LineConfig, LineConfigTranslator};
use gsmlink_core::error::{Error, Result};
use gsmlink_core::transport::{LineHandle, OpenMode, Transport};

/// Size of one bounded read from the non-blocking handle.
const READ_CHUNK: usize = 128;

/// Lifecycle state of a [`SerialLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// No device bound yet.
    Unset,
    /// A device is bound and validated; the handle is not held.
    Configured,
    /// The byte-stream handle is held.
    Open,
}

/// A serial line driven through an injected platform transport.
///
/// Invariants: the handle is present iff the state is [`LineState::Open`];
/// a device name is present iff the state is not [`LineState::Unset`].
/// The handle is released on every exit path -- explicitly via
/// [`close`](SerialLine::close), or by dropping the line.
pub struct SerialLine {
    state: LineState,
    device: Option<String>,
    handle: Option<Box<dyn LineHandle>>,
    /// Pending writes, not yet flushed to the device.
    buffer: Vec<u8>,
    transport: Box<dyn Transport>,
    translator: Box<dyn LineConfigTranslator>,
}

impl SerialLine {
    /// Create an unbound line over the given transport and translator.
    pub fn new(
        transport: Box<dyn Transport>,
        translator: Box<dyn LineConfigTranslator>,
    ) -> Self {
        SerialLine {
            state: LineState::Unset,
            device: None,
            handle: None,
            buffer: Vec::new(),
            transport,
            translator,
        }
    }

    /// Create an unbound line over the native platform transport.
    ///
    /// Selects `stty` on Unix and `mode` on Windows; fails with
    /// [`Error::UnsupportedPlatform`] elsewhere and
    /// [`Error::ConfigToolUnavailable`] when the tool cannot run.
    pub async fn native() -> Result<Self> {
        let (transport, translator) = crate::native_stack().await?;
        Ok(SerialLine::new(transport, translator))
    }

    /// The current lifecycle state.
    pub fn state(&self) -> LineState {
        self.state
    }

    /// The bound device path, if any.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Bind a device to the line, normalizing `COM<N>`-style aliases and
    /// validating the device through the transport.
    ///
    /// Allowed from [`Unset`](LineState::Unset) and
    /// [`Configured`](LineState::Configured) (re-binding replaces the
    /// previous device); fails with [`Error::DeviceAlreadyOpened`] while
    /// open and [`Error::UnknownDevice`] when validation fails.
    pub async fn bind_device(&mut self, name: &str) -> Result<()> {
        if self.state == LineState::Open {
            return Err(Error::DeviceAlreadyOpened);
        }

        let device = self.transport.normalize_device(name);
        self.transport.probe(&device).await?;

        debug!(device = %device, "serial device bound");
        self.device = Some(device);
        self.state = LineState::Configured;
        Ok(())
    }

    /// Apply a line configuration through the platform tool.
    ///
    /// Only valid while [`Configured`](LineState::Configured); attempting
    /// this while unset or open fails with [`Error::DeviceNotReady`].
    /// Values outside the supported set are rejected by the translator
    /// before the transport is invoked.
    pub async fn apply_configuration(&mut self, cfg: &LineConfig) -> Result<()> {
        if self.state != LineState::Configured {
            return Err(Error::DeviceNotReady);
        }
        let device = self.device.as_deref().ok_or(Error::DeviceNotReady)?;

        let args = self.translator.translate(cfg)?;
        debug!(device = %device, args = ?args, "applying line configuration");
        self.transport.configure(device, &args).await
    }

    /// Open the device and acquire the byte-stream handle.
    ///
    /// `mode` must match the opening-mode grammar (e.g. `"r+b"`). The
    /// handle is acquired in non-blocking read mode.
    pub async fn open(&mut self, mode: &str) -> Result<()> {
        if self.state == LineState::Open {
            return Err(Error::DeviceAlreadyOpened);
        }
        if self.state == LineState::Unset {
            return Err(Error::OpenOnUnsetDevice);
        }

        let mode: OpenMode = mode.parse()?;
        let device = self.device.as_deref().ok_or(Error::OpenOnUnsetDevice)?;

        let handle = self.transport.open(device, &mode).await?;
        debug!(device = %device, ?mode, "serial device opened");
        self.handle = Some(handle);
        self.state = LineState::Open;
        Ok(())
    }

    /// Release the handle and return to [`Configured`](LineState::Configured).
    ///
    /// A no-op success when the line is not open. If the transport fails
    /// to release the handle the line stays open so the caller can retry.
    pub async fn close(&mut self) -> Result<()> {
        if self.state != LineState::Open {
            return Ok(());
        }

        if let Some(handle) = self.handle.as_mut() {
            handle.close().await?;
        }
        self.handle = None;
        self.state = LineState::Configured;
        debug!(device = ?self.device, "serial device closed");
        Ok(())
    }

    /// Append bytes to the pending write buffer.
    ///
    /// Nothing reaches the device until [`flush`](SerialLine::flush).
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.state != LineState::Open {
            return Err(Error::WriteOnClosedDevice);
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Flush the pending write buffer to the device.
    ///
    /// The buffer is cleared even when the transport write fails; failed
    /// bytes are not replayed.
    pub async fn flush(&mut self) -> Result<()> {
        if self.state != LineState::Open {
            return Err(Error::WriteOnClosedDevice);
        }

        let data = std::mem::take(&mut self.buffer);
        if data.is_empty() {
            return Ok(());
        }

        let handle = self.handle.as_mut().ok_or(Error::WriteOnClosedDevice)?;
        trace!(bytes = data.len(), "flushing write buffer");
        handle
            .write_bytes(&data)
            .await
            .map_err(|e| Error::CantWriteOnDevice(e.to_string()))
    }

    /// Write, flush, and wait out the settle interval.
    ///
    /// The settle sleep stands in for reply notification: the device is
    /// given `settle` to produce its response before the caller's next
    /// [`read`](SerialLine::read). Once the sleep has started it always
    /// runs to completion.
    pub async fn send(&mut self, data: &[u8], settle: Duration) -> Result<()> {
        self.write(data)?;
        self.flush().await?;
        tokio::time::sleep(settle).await;
        Ok(())
    }

    /// Read currently-available bytes from the device.
    ///
    /// Performs repeated bounded reads, concatenating until `max` bytes
    /// have been collected or a read comes back short (no more data
    /// available right now). With `max = None` the loop runs until the
    /// device has nothing more to give. May return an empty vector.
    pub async fn read(&mut self, max: Option<usize>) -> Result<Vec<u8>> {
        if self.state != LineState::Open {
            return Err(Error::ReadOnClosedDevice);
        }
        let handle = self.handle.as_mut().ok_or(Error::ReadOnClosedDevice)?;

        let mut content = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let want = match max {
                Some(m) => {
                    let remaining = m.saturating_sub(content.len());
                    if remaining == 0 {
                        break;
                    }
                    remaining.min(READ_CHUNK)
                }
                None => READ_CHUNK,
            };

            let n = handle.read_chunk(&mut chunk[..want]).await?;
            content.extend_from_slice(&chunk[..n]);
            if n < want {
                break;
            }
        }

        trace!(bytes = content.len(), "read from serial device");
        Ok(content)
    }
}

impl Drop for SerialLine {
    fn drop(&mut self) {
        // Dropping the handle releases the descriptor; there is no async
        // context here, so the transport's close() cannot be awaited.
        if self.handle.is_some() {
            debug!(device = ?self.device, "serial line dropped while open, releasing handle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stty::SttyTranslator;
    use gsmlink_test_harness::MockTransport;

    fn mock_line(mock: &MockTransport) -> SerialLine {
        SerialLine::new(Box::new(mock.clone()), Box::new(SttyTranslator))
    }

    async fn open_line(mock: &MockTransport) -> SerialLine {
        let mut line = mock_line(mock);
        line.bind_device("/dev/ttyUSB0").await.unwrap();
        line.open("r+b").await.unwrap();
        line
    }

    // -----------------------------------------------------------------
    // State machine transitions
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn new_line_is_unset() {
        let mock = MockTransport::new();
        let line = mock_line(&mock);
        assert_eq!(line.state(), LineState::Unset);
        assert!(line.device().is_none());
    }

    #[tokio::test]
    async fn bind_transitions_to_configured() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        line.bind_device("/dev/ttyUSB0").await.unwrap();
        assert_eq!(line.state(), LineState::Configured);
        assert_eq!(line.device(), Some("/dev/ttyUSB0"));
        assert_eq!(mock.probed_devices(), vec!["/dev/ttyUSB0"]);
    }

    #[tokio::test]
    async fn bind_normalizes_com_alias() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        line.bind_device("COM3").await.unwrap();
        assert_eq!(line.device(), Some("/dev/ttyS2"));
    }

    #[tokio::test]
    async fn rebind_while_configured_is_allowed() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        line.bind_device("/dev/ttyUSB0").await.unwrap();
        line.bind_device("/dev/ttyUSB1").await.unwrap();
        assert_eq!(line.device(), Some("/dev/ttyUSB1"));
    }

    #[tokio::test]
    async fn bind_while_open_fails_and_keeps_state() {
        let mock = MockTransport::new();
        let mut line = open_line(&mock).await;
        let result = line.bind_device("/dev/ttyUSB1").await;
        assert!(matches!(result, Err(Error::DeviceAlreadyOpened)));
        assert_eq!(line.state(), LineState::Open);
        assert_eq!(line.device(), Some("/dev/ttyUSB0"));
    }

    #[tokio::test]
    async fn bind_unknown_device_fails_and_keeps_state() {
        let mock = MockTransport::new();
        mock.fail_probe(true);
        let mut line = mock_line(&mock);
        let result = line.bind_device("/dev/ttyS9").await;
        assert!(matches!(result, Err(Error::UnknownDevice(_))));
        assert_eq!(line.state(), LineState::Unset);
        assert!(line.device().is_none());
    }

    #[tokio::test]
    async fn open_from_unset_fails() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        let result = line.open("r+b").await;
        assert!(matches!(result, Err(Error::OpenOnUnsetDevice)));
        assert_eq!(line.state(), LineState::Unset);
    }

    #[tokio::test]
    async fn open_twice_fails() {
        let mock = MockTransport::new();
        let mut line = open_line(&mock).await;
        let result = line.open("r+b").await;
        assert!(matches!(result, Err(Error::DeviceAlreadyOpened)));
        assert_eq!(line.state(), LineState::Open);
    }

    #[tokio::test]
    async fn open_with_invalid_mode_fails() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        line.bind_device("/dev/ttyUSB0").await.unwrap();
        let result = line.open("rw").await;
        assert!(matches!(result, Err(Error::InvalidOpeningMode(_))));
        assert_eq!(line.state(), LineState::Configured);
    }

    #[tokio::test]
    async fn open_transport_failure_keeps_configured() {
        let mock = MockTransport::new();
        mock.fail_open(true);
        let mut line = mock_line(&mock);
        line.bind_device("/dev/ttyUSB0").await.unwrap();
        let result = line.open("r+b").await;
        assert!(matches!(result, Err(Error::CantOpenDevice(_))));
        assert_eq!(line.state(), LineState::Configured);
    }

    #[tokio::test]
    async fn close_is_noop_when_not_open() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        line.close().await.unwrap();
        assert_eq!(line.state(), LineState::Unset);

        line.bind_device("/dev/ttyUSB0").await.unwrap();
        line.close().await.unwrap();
        assert_eq!(line.state(), LineState::Configured);
    }

    #[tokio::test]
    async fn close_returns_to_configured() {
        let mock = MockTransport::new();
        let mut line = open_line(&mock).await;
        line.close().await.unwrap();
        assert_eq!(line.state(), LineState::Configured);
        assert_eq!(mock.close_count(), 1);

        // The line can be reopened.
        line.open("r+b").await.unwrap();
        assert_eq!(line.state(), LineState::Open);
    }

    #[tokio::test]
    async fn failed_close_stays_open() {
        let mock = MockTransport::new();
        let mut line = open_line(&mock).await;
        mock.fail_close(true);
        let result = line.close().await;
        assert!(matches!(result, Err(Error::CantCloseDevice(_))));
        assert_eq!(line.state(), LineState::Open);

        // Release succeeds once the transport recovers.
        mock.fail_close(false);
        line.close().await.unwrap();
        assert_eq!(line.state(), LineState::Configured);
    }

    // -----------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn apply_configuration_when_configured() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        line.bind_device("/dev/ttyUSB0").await.unwrap();
        line.apply_configuration(&LineConfig::new(9600).unwrap())
            .await
            .unwrap();

        let configured = mock.configured_args();
        assert_eq!(configured.len(), 1);
        assert_eq!(configured[0].0, "/dev/ttyUSB0");
        assert_eq!(configured[0].1[0], "9600");
    }

    #[tokio::test]
    async fn apply_configuration_from_unset_fails() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        let result = line.apply_configuration(&LineConfig::default()).await;
        assert!(matches!(result, Err(Error::DeviceNotReady)));
        assert!(mock.configured_args().is_empty());
    }

    #[tokio::test]
    async fn apply_configuration_while_open_fails() {
        let mock = MockTransport::new();
        let mut line = open_line(&mock).await;
        let result = line.apply_configuration(&LineConfig::default()).await;
        assert!(matches!(result, Err(Error::DeviceNotReady)));
        assert_eq!(line.state(), LineState::Open);
        assert!(mock.configured_args().is_empty());
    }

    #[tokio::test]
    async fn apply_configuration_tool_failure() {
        let mock = MockTransport::new();
        mock.fail_configure(true);
        let mut line = mock_line(&mock);
        line.bind_device("/dev/ttyUSB0").await.unwrap();
        let result = line.apply_configuration(&LineConfig::default()).await;
        assert!(matches!(result, Err(Error::CantConfigureDevice(_))));
        assert_eq!(line.state(), LineState::Configured);
    }

    // -----------------------------------------------------------------
    // Write / flush / read
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn write_before_open_fails() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        assert!(matches!(
            line.write(b"AT"),
            Err(Error::WriteOnClosedDevice)
        ));

        line.bind_device("/dev/ttyUSB0").await.unwrap();
        assert!(matches!(
            line.write(b"AT"),
            Err(Error::WriteOnClosedDevice)
        ));
    }

    #[tokio::test]
    async fn flush_before_open_fails() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        let result = line.flush().await;
        assert!(matches!(result, Err(Error::WriteOnClosedDevice)));
    }

    #[tokio::test]
    async fn read_before_open_fails() {
        let mock = MockTransport::new();
        let mut line = mock_line(&mock);
        let result = line.read(None).await;
        assert!(matches!(result, Err(Error::ReadOnClosedDevice)));
    }

    #[tokio::test]
    async fn write_buffers_until_flush() {
        let mock = MockTransport::new();
        mock.expect(b"AT\r\n", b"OK\r\n");
        let mut line = open_line(&mock).await;

        line.write(b"AT").unwrap();
        line.write(b"\r\n").unwrap();
        assert!(mock.sent_data().is_empty());

        line.flush().await.unwrap();
        assert_eq!(mock.sent_data(), vec![b"AT\r\n".to_vec()]);
    }

    #[tokio::test]
    async fn flush_clears_buffer_on_failure() {
        let mock = MockTransport::new();
        let mut line = open_line(&mock).await;
        mock.fail_write(true);

        line.write(b"AT\r\n").unwrap();
        let result = line.flush().await;
        assert!(matches!(result, Err(Error::CantWriteOnDevice(_))));

        // The buffer is not replayed: a second flush writes nothing.
        mock.fail_write(false);
        line.flush().await.unwrap();
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn read_collects_available_bytes() {
        let mock = MockTransport::new();
        mock.expect(b"AT\r\n", b"AT\r\nOK\r\n");
        let mut line = open_line(&mock).await;

        line.send(b"AT\r\n", Duration::from_millis(0)).await.unwrap();
        let data = line.read(None).await.unwrap();
        assert_eq!(data, b"AT\r\nOK\r\n");
    }

    #[tokio::test]
    async fn read_spans_multiple_chunks() {
        let mock = MockTransport::new();
        let response = vec![b'x'; 300];
        mock.expect(b"GO", &response);
        let mut line = open_line(&mock).await;

        line.send(b"GO", Duration::from_millis(0)).await.unwrap();
        let data = line.read(None).await.unwrap();
        assert_eq!(data, response);
    }

    #[tokio::test]
    async fn read_honors_max_bytes() {
        let mock = MockTransport::new();
        mock.expect(b"GO", b"ABCDEFGH");
        let mut line = open_line(&mock).await;

        line.send(b"GO", Duration::from_millis(0)).await.unwrap();
        let data = line.read(Some(4)).await.unwrap();
        assert_eq!(data, b"ABCD");
        let rest = line.read(None).await.unwrap();
        assert_eq!(rest, b"EFGH");
    }

    #[tokio::test]
    async fn read_with_nothing_available_is_empty() {
        let mock = MockTransport::new();
        let mut line = open_line(&mock).await;
        let data = line.read(None).await.unwrap();
        assert!(data.is_empty());
    }
}
