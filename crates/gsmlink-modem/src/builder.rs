//! ModemBuilder -- fluent builder for constructing [`Modem`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! the device, line settings, and settle intervals before the serial
//! line is bound.
//!
//! # Example
//!
//! ```no_run
//! use gsmlink_core::LineConfig;
//! use gsmlink_modem::ModemBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> gsmlink_core::Result<()> {
//! let mut modem = ModemBuilder::new()
//!     .device("/dev/ttyUSB0")
//!     .line_config(LineConfig::new(115_200)?)
//!     .command_settle(Duration::from_secs(1))
//!     .build()
//!     .await?;
//! modem.open_default().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use gsmlink_core::config::LineConfig;
use gsmlink_core::error::{Error, Result};
use gsmlink_transport::{LineState, SerialLine};

use crate::modem::{
    Modem, DEFAULT_COMMAND_SETTLE, DEFAULT_SMS_SETTLE, DEFAULT_WRITE_SETTLE,
};

/// Fluent builder for [`Modem`].
#[derive(Debug, Clone, Default)]
pub struct ModemBuilder {
    device: Option<String>,
    line_config: Option<LineConfig>,
    write_settle: Option<Duration>,
    command_settle: Option<Duration>,
    sms_settle: Option<Duration>,
}

impl ModemBuilder {
    /// Create a builder with default settle intervals and no device.
    pub fn new() -> Self {
        ModemBuilder::default()
    }

    /// Set the device path or `COM<N>`-style alias to bind.
    pub fn device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }

    /// Apply this line configuration after binding.
    pub fn line_config(mut self, cfg: LineConfig) -> Self {
        self.line_config = Some(cfg);
        self
    }

    /// Override the settle interval for SMS address/body writes
    /// (default: 100 ms).
    pub fn write_settle(mut self, settle: Duration) -> Self {
        self.write_settle = Some(settle);
        self
    }

    /// Override the settle interval for ordinary commands (default: 2 s).
    pub fn command_settle(mut self, settle: Duration) -> Self {
        self.command_settle = Some(settle);
        self
    }

    /// Override the settle interval after the SMS terminator
    /// (default: 5 s).
    pub fn sms_settle(mut self, settle: Duration) -> Self {
        self.sms_settle = Some(settle);
        self
    }

    /// Build a [`Modem`] on the native platform transport.
    ///
    /// Requires [`device()`](Self::device). The line is bound (and
    /// configured, when a [`line_config`](Self::line_config) was given)
    /// but not yet opened.
    pub async fn build(self) -> Result<Modem> {
        let device = self
            .device
            .clone()
            .ok_or_else(|| Error::InvalidParameter("device is required for build()".into()))?;

        let mut line = SerialLine::native().await?;
        line.bind_device(&device).await?;
        self.finish(line).await
    }

    /// Build a [`Modem`] over a caller-provided serial line.
    ///
    /// This is the primary entry point for testing (pass a line backed
    /// by a `MockTransport` from `gsmlink-test-harness`) and for advanced
    /// use cases where the caller manages the line lifecycle directly.
    /// A pending [`line_config`](Self::line_config) is applied when the
    /// line is in the configured state.
    pub async fn build_with_line(self, line: SerialLine) -> Result<Modem> {
        self.finish(line).await
    }

    async fn finish(self, mut line: SerialLine) -> Result<Modem> {
        if let Some(cfg) = &self.line_config {
            if line.state() == LineState::Configured {
                line.apply_configuration(cfg).await?;
            }
        }

        let mut modem = Modem::with_line(line);
        modem.set_settles(
            self.write_settle.unwrap_or(DEFAULT_WRITE_SETTLE),
            self.command_settle.unwrap_or(DEFAULT_COMMAND_SETTLE),
            self.sms_settle.unwrap_or(DEFAULT_SMS_SETTLE),
        );
        Ok(modem)
    }
}
