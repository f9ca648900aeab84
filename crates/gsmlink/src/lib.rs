//! # gsmlink -- GSM Modem Control over a Serial Line
//!
//! `gsmlink` is an asynchronous Rust library for driving GSM modems with
//! text-mode AT commands: checking the link, querying SIM readiness and
//! signal quality, and sending and receiving short messages.
//!
//! ## Quick Start
//!
//! Add `gsmlink` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! gsmlink = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Bind a device, open the line, and talk to the modem:
//!
//! ```no_run
//! use gsmlink::{LineConfig, ModemBuilder, Sms};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut modem = ModemBuilder::new()
//!         .device("/dev/ttyUSB0")
//!         .line_config(LineConfig::new(115_200)?)
//!         .build()
//!         .await?;
//!     modem.open_default().await?;
//!
//!     if modem.check().await?.is_ok() && modem.is_ready().await? {
//!         let sms = Sms::new("0612345678", "hello from gsmlink")
//!             .with_country_code(33);
//!         let reply = modem.send_sms(&sms).await?;
//!         println!("sent: {}", reply.is_ok());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                  | Purpose                                      |
//! |------------------------|----------------------------------------------|
//! | `gsmlink-core`         | Traits, line configuration, errors           |
//! | `gsmlink-transport`    | Serial line state machine, stty/mode transports |
//! | `gsmlink-modem`        | AT protocol driver, SMS codec, signal decoding |
//! | `gsmlink-test-harness` | Mock transport for tests                     |
//! | **`gsmlink`**          | This facade crate -- re-exports everything   |
//!
//! ## Design
//!
//! The serial line is a three-state machine (`Unset -> Configured ->
//! Open`) driven through an injected platform capability: `stty` on
//! Unix-like systems, `mode` on Windows, or a mock in tests. The AT
//! layer is strictly one-command-at-a-time: each command is written,
//! given a fixed settle interval, and answered by a single read whose
//! lines are normalized and classified. There is no background reader,
//! no retry, and no cancellation once a settle has started.

pub use gsmlink_core::{
    com_port_index, Access, CharacterLength, Error, FlowControl, LineConfig,
    LineConfigTranslator, LineHandle, OpenMode, Parity, Result, StopBits, Transport,
    SUPPORTED_BAUD_RATES,
};

pub use gsmlink_transport::{LineState, SerialLine, SttyTranslator};

#[cfg(unix)]
pub use gsmlink_transport::SttyTransport;

pub use gsmlink_modem::{
    commands, protocol, CommandResponse, Modem, ModemBuilder, SignalLevel, SignalQuality, Sms,
};
