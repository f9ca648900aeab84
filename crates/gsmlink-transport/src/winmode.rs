//! `mode`-based serial transport for Windows.
//!
//! Line settings are applied by invoking the `mode` command with arguments
//! produced by [`ModeTranslator`]; the byte stream is the `\\.\COM<N>`
//! device path. The tool keeps the legacy two-digit baud encodings for
//! rates below 38400 (9600 is `BAUD=96`), which is why the translator
//! carries its own baud table instead of printing the rate directly.

use gsmlink_core::config::{FlowControl, LineConfig, LineConfigTranslator, Parity, StopBits};
use gsmlink_core::error::{Error, Result};

/// Baud rates and their `mode` tool encodings.
///
/// Rates from 38400 up are passed through verbatim; the lower rates use
/// the historical two-digit codes.
const MODE_BAUD_CODES: [(u32, u32); 12] = [
    (110, 11),
    (150, 15),
    (300, 30),
    (600, 60),
    (1200, 12),
    (2400, 24),
    (4800, 48),
    (9600, 96),
    (19200, 19),
    (38400, 38400),
    (57600, 57600),
    (115200, 115200),
];

/// Translates a [`LineConfig`] into `mode` arguments.
///
/// # Example
///
/// ```
/// use gsmlink_core::config::{LineConfig, LineConfigTranslator};
/// use gsmlink_transport::ModeTranslator;
///
/// let args = ModeTranslator.translate(&LineConfig::new(9600).unwrap()).unwrap();
/// assert_eq!(args[0], "BAUD=96");
/// assert!(args.contains(&"DATA=8".to_string()));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeTranslator;

impl LineConfigTranslator for ModeTranslator {
    fn translate(&self, cfg: &LineConfig) -> Result<Vec<String>> {
        let code = MODE_BAUD_CODES
            .iter()
            .find(|(rate, _)| *rate == cfg.baud_rate())
            .map(|(_, code)| *code)
            .ok_or(Error::InvalidBaudRate(cfg.baud_rate()))?;

        let mut args = vec![format!("BAUD={code}")];

        let parity = match cfg.parity() {
            Parity::None => 'n',
            Parity::Odd => 'o',
            Parity::Even => 'e',
        };
        args.push(format!("PARITY={parity}"));

        args.push(format!("DATA={}", cfg.character_length().bits()));

        let stop = match cfg.stop_bits() {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        args.push(format!("STOP={stop}"));

        let flow: [&str; 3] = match cfg.flow_control() {
            FlowControl::None => ["xon=off", "octs=off", "rts=on"],
            FlowControl::RtsCts => ["xon=off", "octs=on", "rts=hs"],
            FlowControl::XonXoff => ["xon=on", "octs=off", "rts=on"],
        };
        args.extend(flow.iter().map(|s| s.to_string()));

        Ok(args)
    }
}

#[cfg(windows)]
pub use imp::ModeTransport;

#[cfg(windows)]
mod imp {
    use std::io::{ErrorKind, Read, Write};

    use async_trait::async_trait;
    use tokio::process::Command;
    use tracing::debug;

    use gsmlink_core::error::{Error, Result};
    use gsmlink_core::transport::{com_port_index, LineHandle, OpenMode, Transport};

    /// Strip the `\\.\` device-namespace prefix for `mode` invocations,
    /// which expect the bare `COM<N>` name.
    fn tool_name(device: &str) -> &str {
        device.strip_prefix(r"\\.\").unwrap_or(device)
    }

    /// Serial transport driving the `mode` command for configuration and
    /// the `\\.\COM<N>` device path for the byte stream.
    #[derive(Debug, Clone, Copy)]
    pub struct ModeTransport {
        _priv: (),
    }

    impl ModeTransport {
        /// Create the transport, verifying that `mode` is runnable.
        pub async fn new() -> Result<Self> {
            match Command::new("mode").output().await {
                Ok(_) => Ok(ModeTransport { _priv: () }),
                Err(e) => Err(Error::ConfigToolUnavailable(e.to_string())),
            }
        }
    }

    #[async_trait]
    impl Transport for ModeTransport {
        fn normalize_device(&self, name: &str) -> String {
            match com_port_index(name) {
                Some(n) => format!(r"\\.\COM{n}"),
                None => name.to_string(),
            }
        }

        async fn probe(&self, device: &str) -> Result<()> {
            let output = Command::new("mode").arg(tool_name(device)).output().await?;
            if output.status.success() {
                Ok(())
            } else {
                Err(Error::UnknownDevice(device.to_string()))
            }
        }

        async fn configure(&self, device: &str, args: &[String]) -> Result<()> {
            debug!(device = %device, ?args, "running mode");
            let output = Command::new("mode")
                .arg(tool_name(device))
                .args(args)
                .output()
                .await?;
            if output.status.success() {
                Ok(())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(Error::CantConfigureDevice(stderr.trim().to_string()))
            }
        }

        async fn open(&self, device: &str, mode: &OpenMode) -> Result<Box<dyn LineHandle>> {
            use gsmlink_core::transport::Access;

            let mut options = std::fs::OpenOptions::new();
            options
                .read(mode.readable())
                .write(mode.writable())
                .append(mode.access() == Access::Append);

            let file = options
                .open(device)
                .map_err(|e| Error::CantOpenDevice(format!("{device}: {e}")))?;

            debug!(device = %device, "opened COM device");
            Ok(Box::new(ComHandle { file: Some(file) }))
        }
    }

    /// Handle over an open COM port. Read timeouts from the driver's
    /// COMMTIMEOUTS are reported as "no data available".
    struct ComHandle {
        file: Option<std::fs::File>,
    }

    impl ComHandle {
        fn file_mut(&mut self) -> Result<&mut std::fs::File> {
            self.file.as_mut().ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    ErrorKind::NotConnected,
                    "handle already closed",
                ))
            })
        }
    }

    #[async_trait]
    impl LineHandle for ComHandle {
        async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
            let file = self.file_mut()?;
            match file.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
                Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
                Err(e) => Err(Error::Io(e)),
            }
        }

        async fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
            let file = self.file_mut()?;
            file.write_all(data).map_err(Error::Io)?;
            file.flush().map_err(Error::Io)
        }

        async fn close(&mut self) -> Result<()> {
            // Dropping the File closes the OS handle; Windows reports
            // close failures only through the drop, so release is
            // best-effort here.
            self.file.take();
            Ok(())
        }
    }
}
