//! `stty`-based serial transport for Unix-like systems.
//!
//! Line settings are applied by invoking the platform's `stty` tool with
//! arguments produced by [`SttyTranslator`]; the byte stream itself is a
//! plain device file opened in non-blocking mode, so the bounded chunk
//! read loop can detect "no more data" without hanging.
//!
//! `COM<N>`-style aliases are accepted for convenience and map to
//! `/dev/ttyS{N-1}` (the zero-based Unix numbering of the one-based COM
//! naming).

use gsmlink_core::config::SUPPORTED_BAUD_RATES;
use gsmlink_core::config::{FlowControl, LineConfig, LineConfigTranslator, Parity, StopBits};
use gsmlink_core::error::{Error, Result};

/// Translates a [`LineConfig`] into `stty` arguments.
///
/// One invocation carries every setting: baud rate, parity, character
/// size, stop bits, and flow control.
///
/// # Example
///
/// ```
/// use gsmlink_core::config::{LineConfig, LineConfigTranslator};
/// use gsmlink_transport::SttyTranslator;
///
/// let args = SttyTranslator.translate(&LineConfig::new(9600).unwrap()).unwrap();
/// assert_eq!(args[0], "9600");
/// assert!(args.contains(&"cs8".to_string()));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SttyTranslator;

impl LineConfigTranslator for SttyTranslator {
    fn translate(&self, cfg: &LineConfig) -> Result<Vec<String>> {
        if !SUPPORTED_BAUD_RATES.contains(&cfg.baud_rate()) {
            return Err(Error::InvalidBaudRate(cfg.baud_rate()));
        }

        let mut args = vec![cfg.baud_rate().to_string()];

        match cfg.parity() {
            Parity::None => args.push("-parenb".into()),
            Parity::Odd => args.extend(["parenb".into(), "parodd".into()]),
            Parity::Even => args.extend(["parenb".into(), "-parodd".into()]),
        }

        args.push(format!("cs{}", cfg.character_length().bits()));

        match cfg.stop_bits() {
            StopBits::One => args.push("-cstopb".into()),
            StopBits::Two => args.push("cstopb".into()),
        }

        let flow: [&str; 4] = match cfg.flow_control() {
            FlowControl::None => ["clocal", "-crtscts", "-ixon", "-ixoff"],
            FlowControl::RtsCts => ["-clocal", "crtscts", "-ixon", "-ixoff"],
            FlowControl::XonXoff => ["-clocal", "-crtscts", "ixon", "ixoff"],
        };
        args.extend(flow.iter().map(|s| s.to_string()));

        Ok(args)
    }
}

#[cfg(unix)]
pub use imp::SttyTransport;

#[cfg(unix)]
mod imp {
    use std::io::{ErrorKind, Read, Write};
    use std::os::fd::IntoRawFd;
    use std::os::unix::fs::OpenOptionsExt;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::process::Command;
    use tracing::{debug, trace, warn};

    use gsmlink_core::error::{Error, Result};
    use gsmlink_core::transport::{com_port_index, LineHandle, OpenMode, Transport};

    /// Serial transport driving `stty` for configuration and a
    /// non-blocking device file for the byte stream.
    #[derive(Debug, Clone, Copy)]
    pub struct SttyTransport {
        _priv: (),
    }

    impl SttyTransport {
        /// Create the transport, verifying that `stty` is runnable.
        pub async fn new() -> Result<Self> {
            match Command::new("stty").arg("--version").output().await {
                Ok(_) => Ok(SttyTransport { _priv: () }),
                Err(e) => Err(Error::ConfigToolUnavailable(e.to_string())),
            }
        }
    }

    #[async_trait]
    impl Transport for SttyTransport {
        fn normalize_device(&self, name: &str) -> String {
            match com_port_index(name) {
                Some(n) => format!("/dev/ttyS{}", n.saturating_sub(1)),
                None => name.to_string(),
            }
        }

        async fn probe(&self, device: &str) -> Result<()> {
            let output = Command::new("stty").arg("-F").arg(device).output().await?;
            if output.status.success() {
                Ok(())
            } else {
                Err(Error::UnknownDevice(device.to_string()))
            }
        }

        async fn configure(&self, device: &str, args: &[String]) -> Result<()> {
            debug!(device = %device, ?args, "running stty");
            let output = Command::new("stty")
                .arg("-F")
                .arg(device)
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
                .append(mode.access() == Access::Append)
                .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY);

            let file = options
                .open(device)
                .map_err(|e| Error::CantOpenDevice(format!("{device}: {e}")))?;

            debug!(device = %device, "opened non-blocking device file");
            Ok(Box::new(NonBlockingHandle {
                file: Some(file),
                device: device.to_string(),
            }))
        }
    }

    /// Handle over a device file opened with `O_NONBLOCK`.
    struct NonBlockingHandle {
        file: Option<std::fs::File>,
        device: String,
    }

    impl NonBlockingHandle {
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
    impl LineHandle for NonBlockingHandle {
        async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
            let file = self.file_mut()?;
            match file.read(buf) {
                Ok(n) => Ok(n),
                // Non-blocking descriptor with nothing available.
                Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
                Err(e) => Err(Error::Io(e)),
            }
        }

        async fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
            let mut written = 0;
            while written < data.len() {
                let file = self.file_mut()?;
                match file.write(&data[written..]) {
                    Ok(0) => {
                        return Err(Error::CantWriteOnDevice(format!(
                            "{}: device accepted no bytes",
                            self.device
                        )))
                    }
                    Ok(n) => {
                        trace!(bytes = n, "wrote to device");
                        written += n;
                    }
                    // TX buffer full on the non-blocking descriptor; give
                    // the UART a moment to drain.
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(Error::Io(e)),
                }
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            if let Some(file) = self.file.take() {
                let fd = file.into_raw_fd();
                let rc = unsafe { libc::close(fd) };
                if rc != 0 {
                    let err = std::io::Error::last_os_error();
                    warn!(device = %self.device, error = %err, "close failed");
                    return Err(Error::CantCloseDevice(err.to_string()));
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsmlink_core::config::{FlowControl, Parity, StopBits};

    fn translate(cfg: &LineConfig) -> Vec<String> {
        SttyTranslator.translate(cfg).unwrap()
    }

    #[test]
    fn baud_is_first_argument_for_all_supported_rates() {
        for rate in SUPPORTED_BAUD_RATES {
            let args = translate(&LineConfig::new(rate).unwrap());
            assert_eq!(args[0], rate.to_string());
        }
    }

    #[test]
    fn default_config_arguments() {
        let args = translate(&LineConfig::default());
        assert_eq!(
            args,
            vec![
                "9600", "-parenb", "cs8", "-cstopb", "clocal", "-crtscts", "-ixon", "-ixoff"
            ]
        );
    }

    #[test]
    fn parity_arguments() {
        let odd = translate(&LineConfig::default().with_parity(Parity::Odd));
        assert!(odd.contains(&"parenb".to_string()));
        assert!(odd.contains(&"parodd".to_string()));

        let even = translate(&LineConfig::default().with_parity(Parity::Even));
        assert!(even.contains(&"parenb".to_string()));
        assert!(even.contains(&"-parodd".to_string()));
    }

    #[test]
    fn character_length_argument() {
        for bits in 5..=8u8 {
            let args = translate(&LineConfig::default().with_character_length(bits));
            assert!(args.contains(&format!("cs{bits}")));
        }
    }

    #[test]
    fn stop_bits_arguments() {
        let one = translate(&LineConfig::default().with_stop_bits(StopBits::One));
        assert!(one.contains(&"-cstopb".to_string()));

        let two = translate(&LineConfig::default().with_stop_bits(StopBits::Two));
        assert!(two.contains(&"cstopb".to_string()));
    }

    #[test]
    fn flow_control_arguments() {
        let rts = translate(&LineConfig::default().with_flow_control(FlowControl::RtsCts));
        assert!(rts.contains(&"crtscts".to_string()));
        assert!(rts.contains(&"-clocal".to_string()));

        let xon = translate(&LineConfig::default().with_flow_control(FlowControl::XonXoff));
        assert!(xon.contains(&"ixon".to_string()));
        assert!(xon.contains(&"ixoff".to_string()));
    }
}
