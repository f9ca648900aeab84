//! Serial line configuration.
//!
//! [`LineConfig`] is a platform-neutral description of the line settings
//! (baud rate, parity, character length, stop bits, flow control). It is
//! immutable once constructed and carries only values that survived
//! validation, so a [`LineConfigTranslator`] can turn it into arguments
//! for the platform configuration tool without re-checking anything but
//! the platform's own baud table.
//!
//! The translator is the only platform-specific piece: one implementation
//! per target OS lives in `gsmlink-transport`, and the state machine never
//! sees anything but the neutral record and the translated argument list.

use std::str::FromStr;

use crate::error::{Error, Result};

/// Baud rates accepted by every platform translator.
pub const SUPPORTED_BAUD_RATES: [u32; 12] = [
    110, 150, 300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200,
];

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl FromStr for Parity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Parity::None),
            "odd" => Ok(Parity::Odd),
            "even" => Ok(Parity::Even),
            _ => Err(Error::InvalidParity(s.to_string())),
        }
    }
}

/// Number of stop bits per character.
///
/// Everything that is not exactly one stop bit is driven as "two" by the
/// platform tools, hence the two-variant encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl FromStr for StopBits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1" => Ok(StopBits::One),
            "2" => Ok(StopBits::Two),
            _ => Err(Error::InvalidParameter(format!("stop bits {s:?}"))),
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    /// Hardware flow control (RTS/CTS lines).
    RtsCts,
    /// Software flow control (XON/XOFF characters).
    XonXoff,
}

impl FromStr for FlowControl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(FlowControl::None),
            "rts/cts" => Ok(FlowControl::RtsCts),
            "xon/xoff" => Ok(FlowControl::XonXoff),
            _ => Err(Error::InvalidFlowControl(s.to_string())),
        }
    }
}

/// Data bits per character, clamped into the 5..=8 range the serial
/// hardware understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterLength(u8);

impl CharacterLength {
    /// Create a character length, clamping out-of-range requests to the
    /// nearest supported value.
    pub fn new(bits: u8) -> Self {
        CharacterLength(bits.clamp(5, 8))
    }

    /// The number of data bits (always in 5..=8).
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl Default for CharacterLength {
    fn default() -> Self {
        CharacterLength(8)
    }
}

/// Platform-neutral serial line configuration.
///
/// Construct with [`LineConfig::new`], which validates the baud rate
/// against [`SUPPORTED_BAUD_RATES`], then adjust individual fields with
/// the `with_*` methods before handing the record to the serial line's
/// `apply_configuration`.
///
/// # Example
///
/// ```
/// use gsmlink_core::config::{LineConfig, Parity};
///
/// let cfg = LineConfig::new(115_200).unwrap().with_parity(Parity::Even);
/// assert_eq!(cfg.baud_rate(), 115_200);
/// assert_eq!(cfg.parity(), Parity::Even);
///
/// assert!(LineConfig::new(12_345).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConfig {
    baud_rate: u32,
    parity: Parity,
    character_length: CharacterLength,
    stop_bits: StopBits,
    flow_control: FlowControl,
}

impl LineConfig {
    /// Create a configuration with the given baud rate and 8-N-1 defaults.
    ///
    /// Fails with [`Error::InvalidBaudRate`] if the rate is not a member
    /// of [`SUPPORTED_BAUD_RATES`].
    pub fn new(baud_rate: u32) -> Result<Self> {
        if !SUPPORTED_BAUD_RATES.contains(&baud_rate) {
            return Err(Error::InvalidBaudRate(baud_rate));
        }
        Ok(LineConfig {
            baud_rate,
            parity: Parity::None,
            character_length: CharacterLength::default(),
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        })
    }

    /// Replace the parity setting.
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Replace the character length (clamped into 5..=8).
    pub fn with_character_length(mut self, bits: u8) -> Self {
        self.character_length = CharacterLength::new(bits);
        self
    }

    /// Replace the stop bits setting.
    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Replace the flow control setting.
    pub fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn character_length(&self) -> CharacterLength {
        self.character_length
    }

    pub fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }

    pub fn flow_control(&self) -> FlowControl {
        self.flow_control
    }
}

impl Default for LineConfig {
    /// 9600 baud, 8 data bits, no parity, one stop bit, no flow control.
    fn default() -> Self {
        LineConfig {
            baud_rate: 9600,
            parity: Parity::None,
            character_length: CharacterLength::default(),
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

/// Translates a [`LineConfig`] into arguments for the platform
/// line-configuration tool.
///
/// Implementations are pure: they produce an argument vector without
/// performing any I/O. The baud rate is revalidated here because some
/// platforms encode rates through their own tables.
pub trait LineConfigTranslator: Send + Sync {
    /// Produce the tool arguments for one configuration invocation.
    fn translate(&self, cfg: &LineConfig) -> Result<Vec<String>>;
}
