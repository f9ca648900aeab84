//! gsmlink-modem: AT command protocol driver for GSM modems.
//!
//! This crate implements the text-mode AT command protocol over a
//! [`SerialLine`](gsmlink_transport::SerialLine). It provides:
//!
//! - **Wire codec** ([`protocol`]) -- command framing and reply
//!   line-normalization (strip carriage returns, split on line feeds,
//!   drop empty lines).
//! - **Command builders** ([`commands`]) -- construct the AT commands used
//!   by the driver and the SIM state reply markers.
//! - **Reply classification** ([`response`]) -- independent
//!   `ERROR`/`OK` substring flags on the joined reply text.
//! - **Signal decoding** ([`signal`]) -- raw RSSI index to percentage,
//!   dBm, and qualitative level.
//! - **SMS codec** ([`sms`]) -- number internationalization rules and
//!   inbound `+CMT` notification parsing.
//! - **Modem driver** ([`modem`]) -- the command channel: frame, send,
//!   settle, single read, with a session transcript.
//! - **Builder** ([`builder`]) -- fluent construction with mock
//!   injection for tests.
//!
//! # Example
//!
//! ```
//! use gsmlink_modem::protocol::{frame_command, split_lines, CRLF};
//! use gsmlink_modem::response::CommandResponse;
//!
//! // Frame a SIM state query.
//! let frame = frame_command("AT+CPIN?", CRLF);
//! assert_eq!(frame, b"AT+CPIN?\r\n");
//!
//! // Normalize and classify a reply.
//! let lines = split_lines(b"+CPIN: READY\r\n\r\nOK\r\n");
//! let reply = CommandResponse::new(lines.join("\n"));
//! assert!(reply.is_ok());
//! ```

pub mod builder;
pub mod commands;
pub mod modem;
pub mod protocol;
pub mod response;
pub mod signal;
pub mod sms;

// Re-export the primary types for ergonomic `use gsmlink_modem::*`.
pub use builder::ModemBuilder;
pub use modem::Modem;
pub use response::CommandResponse;
pub use signal::{SignalLevel, SignalQuality};
pub use sms::Sms;
