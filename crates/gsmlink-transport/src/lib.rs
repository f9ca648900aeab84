//! Transport implementations for gsmlink.
//!
//! This crate provides the [`SerialLine`] lifecycle state machine and the
//! concrete [`Transport`](gsmlink_core::Transport) implementations that
//! back it:
//!
//! - [`SttyTransport`] / [`SttyTranslator`]: Unix-like systems, configured
//!   through the `stty` tool, byte stream over a non-blocking device file
//! - `ModeTransport` / [`ModeTranslator`]: Windows COM ports, configured
//!   through the `mode` command
//!
//! The platform pieces are selected once, at construction time, by
//! [`native_stack`] (or the [`SerialLine::native`] shorthand); everything
//! above that point is platform-agnostic.
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
//! line.apply_configuration(&LineConfig::new(9600)?).await?;
//! line.open("r+b").await?;
//! # Ok(())
//! # }
//! ```

pub mod line;
pub mod stty;
pub mod winmode;

pub use line::{LineState, SerialLine};
pub use stty::SttyTranslator;
pub use winmode::ModeTranslator;

#[cfg(unix)]
pub use stty::SttyTransport;
#[cfg(windows)]
pub use winmode::ModeTransport;

use gsmlink_core::config::LineConfigTranslator;
use gsmlink_core::error::Result;
use gsmlink_core::transport::Transport;

/// Select the native transport and translator for the running platform.
///
/// Fails with [`ConfigToolUnavailable`](gsmlink_core::Error::ConfigToolUnavailable)
/// when the platform configuration tool cannot run, and with
/// [`UnsupportedPlatform`](gsmlink_core::Error::UnsupportedPlatform) on
/// operating systems without a native transport.
pub async fn native_stack() -> Result<(Box<dyn Transport>, Box<dyn LineConfigTranslator>)> {
    #[cfg(unix)]
    {
        let transport = SttyTransport::new().await?;
        Ok((Box::new(transport), Box::new(SttyTranslator)))
    }

    #[cfg(windows)]
    {
        let transport = ModeTransport::new().await?;
        Ok((Box::new(transport), Box::new(ModeTranslator)))
    }

    #[cfg(not(any(unix, windows)))]
    {
        Err(gsmlink_core::Error::UnsupportedPlatform)
    }
}
