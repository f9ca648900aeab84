//! The modem driver: a command channel over a [`SerialLine`].
//!
//! Every higher-level operation is built from one primitive: frame the
//! command, send it, wait out a settle interval, then perform a single
//! read and normalize the reply into lines. There is no background
//! reader and no retry -- if the modem is slower than the settle
//! interval the reply simply is not there yet, and the caller decides
//! whether to ask again.
//!
//! The modem holds exactly one serial line and supports one outstanding
//! command at a time (`&mut self`); concurrent use from several tasks
//! needs external serialization.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, trace};

use gsmlink_core::config::LineConfig;
use gsmlink_core::error::{Error, Result};
use gsmlink_transport::SerialLine;

use crate::commands;
use crate::protocol;
use crate::response::CommandResponse;
use crate::signal::SignalQuality;
use crate::sms::Sms;

/// Settle interval after the writes of an SMS address/body frame.
pub const DEFAULT_WRITE_SETTLE: Duration = Duration::from_millis(100);

/// Settle interval after an ordinary AT command.
pub const DEFAULT_COMMAND_SETTLE: Duration = Duration::from_secs(2);

/// Settle interval after the SMS terminator byte, long enough for the
/// modem-side transmission.
pub const DEFAULT_SMS_SETTLE: Duration = Duration::from_secs(5);

/// Signal query reply grammar.
static CSQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+CSQ: ([0-9,]+)").unwrap_or_else(|e| panic!("CSQ grammar: {e}"))
});

/// A GSM modem driven over a serial line with text-mode AT commands.
///
/// # Example
///
/// ```no_run
/// use gsmlink_modem::Modem;
///
/// # async fn example() -> gsmlink_core::Result<()> {
/// let mut modem = Modem::new("/dev/ttyUSB0").await?;
/// modem.open_default().await?;
///
/// let reply = modem.check().await?;
/// if reply.is_ok() {
///     let quality = modem.signal_quality().await?;
///     println!("signal: {quality}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Modem {
    line: SerialLine,
    /// Every reply line ever read on this session, in order. An audit
    /// trail only -- protocol logic never consumes it.
    transcript: Vec<String>,
    write_settle: Duration,
    command_settle: Duration,
    sms_settle: Duration,
}

impl Modem {
    /// Create a modem on the native platform transport and bind `device`.
    ///
    /// The line is left in the configured (not yet open) state so a
    /// [`LineConfig`] can still be applied.
    pub async fn new(device: &str) -> Result<Self> {
        let mut line = SerialLine::native().await?;
        line.bind_device(device).await?;
        Ok(Modem::with_line(line))
    }

    /// Wrap an existing serial line, keeping the default settle intervals.
    ///
    /// This is the entry point for tests: build the line over a mock
    /// transport and hand it in.
    pub fn with_line(line: SerialLine) -> Self {
        Modem {
            line,
            transcript: Vec::new(),
            write_settle: DEFAULT_WRITE_SETTLE,
            command_settle: DEFAULT_COMMAND_SETTLE,
            sms_settle: DEFAULT_SMS_SETTLE,
        }
    }

    pub(crate) fn set_settles(&mut self, write: Duration, command: Duration, sms: Duration) {
        self.write_settle = write;
        self.command_settle = command;
        self.sms_settle = sms;
    }

    /// The underlying serial line.
    pub fn line(&self) -> &SerialLine {
        &self.line
    }

    // -----------------------------------------------------------------
    // Line control
    // -----------------------------------------------------------------

    /// Open the serial line with the given mode string.
    pub async fn open(&mut self, mode: &str) -> Result<()> {
        self.line.open(mode).await
    }

    /// Open the serial line with the default `"r+b"` mode.
    pub async fn open_default(&mut self) -> Result<()> {
        self.line.open("r+b").await
    }

    /// Close the serial line (no-op when not open).
    pub async fn close(&mut self) -> Result<()> {
        self.line.close().await
    }

    /// Apply a line configuration (valid while configured, before open).
    pub async fn apply_configuration(&mut self, cfg: &LineConfig) -> Result<()> {
        self.line.apply_configuration(cfg).await
    }

    // -----------------------------------------------------------------
    // The command primitive
    // -----------------------------------------------------------------

    /// Send an AT command with the default terminator and settle interval.
    pub async fn command(&mut self, command: &str) -> Result<CommandResponse> {
        let settle = self.command_settle;
        self.command_with(command, protocol::CRLF, settle).await
    }

    /// Send an AT command with explicit terminator and settle interval.
    ///
    /// Frames the command, flushes it, sleeps for `settle`, then performs
    /// one read whose normalized lines become the reply. The reply lines
    /// are also appended to the session transcript.
    pub async fn command_with(
        &mut self,
        command: &str,
        end: &str,
        settle: Duration,
    ) -> Result<CommandResponse> {
        debug!(command, "sending AT command");
        let frame = protocol::frame_command(command, end);
        self.line.send(&frame, settle).await?;
        let text = self.read_lines().await?;
        trace!(reply = %text, "AT reply");
        Ok(CommandResponse::new(text))
    }

    // -----------------------------------------------------------------
    // Modem operations
    // -----------------------------------------------------------------

    /// Check modem communication (`AT`).
    pub async fn check(&mut self) -> Result<CommandResponse> {
        self.command(&commands::cmd_check()).await
    }

    /// Submit the SIM PIN code.
    pub async fn set_pin_code(&mut self, pin: &str) -> Result<CommandResponse> {
        self.command(&commands::cmd_set_pin(pin)).await
    }

    /// Select SMS text mode.
    pub async fn set_text_mode(&mut self) -> Result<CommandResponse> {
        self.command(&commands::cmd_text_mode()).await
    }

    /// Set the SMS service center number.
    pub async fn set_sms_center(&mut self, center: &str) -> Result<CommandResponse> {
        self.command(&commands::cmd_sms_center(center)).await
    }

    /// Query the SIM state (with verbose error reports enabled first).
    pub async fn sim_state(&mut self) -> Result<CommandResponse> {
        self.command(&commands::cmd_verbose_errors()).await?;
        self.command(&commands::cmd_sim_state()).await
    }

    /// Whether the SIM reports ready for traffic.
    pub async fn is_ready(&mut self) -> Result<bool> {
        let reply = self.sim_state().await?;
        Ok(reply.content().contains(commands::SIM_READY))
    }

    /// Whether the SIM is waiting for its PIN code.
    pub async fn require_pin(&mut self) -> Result<bool> {
        let reply = self.sim_state().await?;
        Ok(reply.content().contains(commands::SIM_PIN_REQUIRED))
    }

    /// Query and decode the signal quality.
    ///
    /// The reply must classify as ok and carry a `+CSQ:` line; the
    /// captured index is taken up to the first comma (the BER field is
    /// not part of the value), else [`Error::BadResponse`].
    pub async fn signal_quality(&mut self) -> Result<SignalQuality> {
        let reply = self.command(&commands::cmd_signal_quality()).await?;

        if reply.is_ok() {
            if let Some(captures) = CSQ_RE.captures(reply.content()) {
                let digits = captures[1].split(',').next().unwrap_or_default();
                if let Ok(value) = digits.parse::<f64>() {
                    return Ok(SignalQuality::new(value));
                }
            }
        }
        Err(Error::BadResponse(format!(
            "no signal quality in reply: {:?}",
            reply.content()
        )))
    }

    /// Send a text-mode SMS.
    ///
    /// Writes the address frame, then the body, then the CTRL-Z
    /// terminator with the long settle interval, and reads the final
    /// reply. No prompt confirmation happens between the frames: the
    /// modem is given the short write settle instead.
    pub async fn send_sms(&mut self, sms: &Sms) -> Result<CommandResponse> {
        self.send_sms_with(sms, protocol::CTRL_Z).await
    }

    /// Send a text-mode SMS with an explicit terminator byte.
    pub async fn send_sms_with(&mut self, sms: &Sms, terminator: u8) -> Result<CommandResponse> {
        let number = sms.international_number();
        debug!(to = %number, "sending SMS");

        let address = protocol::frame_command(&commands::cmd_send_sms_to(&number), protocol::CRLF);
        let write_settle = self.write_settle;
        let sms_settle = self.sms_settle;

        self.line.send(&address, write_settle).await?;
        self.line.send(sms.content().as_bytes(), write_settle).await?;
        self.line.send(&[terminator], sms_settle).await?;

        let text = self.read_lines().await?;
        Ok(CommandResponse::new(text))
    }

    /// Poll for an inbound SMS notification.
    ///
    /// Performs one read; if the first reply line matches the `+CMT`
    /// grammar the message is returned, otherwise `Ok(None)` -- no
    /// message is expected traffic, not an error.
    pub async fn receive_sms(&mut self) -> Result<Option<Sms>> {
        let text = self.read_lines().await?;
        if text.is_empty() {
            return Ok(None);
        }
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        Ok(Sms::parse_cmt(&lines))
    }

    /// The session transcript: every reply line read so far.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Read available bytes, normalize into lines, extend the transcript,
    /// and return the joined text.
    async fn read_lines(&mut self) -> Result<String> {
        let raw = self.line.read(None).await?;
        let lines = protocol::split_lines(&raw);
        let joined = protocol::join_lines(&lines);
        self.transcript.extend(lines);
        Ok(joined)
    }
}
