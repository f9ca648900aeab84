//! Transport capability traits for serial line access.
//!
//! The [`Transport`] trait abstracts everything that touches the platform:
//! validating that a device exists, running the line-configuration tool,
//! and acquiring the byte-stream handle. The state machine in
//! `gsmlink-transport` drives these capabilities with derived, validated
//! arguments and never talks to the hardware directly.
//!
//! Implementations exist for `stty`-configured Unix device files,
//! `mode`-configured Windows COM ports, and a mock transport for testing
//! (`gsmlink-test-harness`).

use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Access requested when opening the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Append,
}

/// A parsed device opening mode.
///
/// The accepted grammar is the `fopen`-style `^[raw]\+?b?$`: one access
/// character (`r`, `a`, or `w`), an optional `+` for update (read and
/// write), and an optional trailing `b` binary marker. Anything else is
/// rejected with [`Error::InvalidOpeningMode`].
///
/// # Example
///
/// ```
/// use gsmlink_core::transport::{Access, OpenMode};
///
/// let mode: OpenMode = "r+b".parse().unwrap();
/// assert_eq!(mode.access(), Access::Read);
/// assert!(mode.update());
/// assert!(mode.binary());
///
/// assert!("rw".parse::<OpenMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    access: Access,
    update: bool,
    binary: bool,
}

impl OpenMode {
    /// The primary access requested (`r`, `a`, or `w`).
    pub fn access(self) -> Access {
        self.access
    }

    /// Whether the `+` update marker was present.
    pub fn update(self) -> bool {
        self.update
    }

    /// Whether the `b` binary marker was present.
    pub fn binary(self) -> bool {
        self.binary
    }

    /// Whether the handle must be readable.
    pub fn readable(self) -> bool {
        self.update || self.access == Access::Read
    }

    /// Whether the handle must be writable.
    pub fn writable(self) -> bool {
        self.update || matches!(self.access, Access::Write | Access::Append)
    }
}

impl Default for OpenMode {
    /// The default mode is `"r+b"`: read/update, binary.
    fn default() -> Self {
        OpenMode {
            access: Access::Read,
            update: true,
            binary: true,
        }
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let access = match chars.next() {
            Some('r') => Access::Read,
            Some('a') => Access::Append,
            Some('w') => Access::Write,
            _ => return Err(Error::InvalidOpeningMode(s.to_string())),
        };

        let mut rest = chars.as_str();
        let update = rest.starts_with('+');
        if update {
            rest = &rest[1..];
        }
        let binary = rest.starts_with('b');
        if binary {
            rest = &rest[1..];
        }
        if !rest.is_empty() {
            return Err(Error::InvalidOpeningMode(s.to_string()));
        }

        Ok(OpenMode {
            access,
            update,
            binary,
        })
    }
}

/// Extract the port number from a `COM<N>`-style device alias.
///
/// The match is case-insensitive and tolerates a trailing colon
/// (`"COM3:"`). Returns `None` for anything that is not a COM alias, in
/// which case transports pass the device name through unchanged.
///
/// # Example
///
/// ```
/// use gsmlink_core::transport::com_port_index;
///
/// assert_eq!(com_port_index("COM3"), Some(3));
/// assert_eq!(com_port_index("com12:"), Some(12));
/// assert_eq!(com_port_index("/dev/ttyUSB0"), None);
/// ```
pub fn com_port_index(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?;
    if !prefix.eq_ignore_ascii_case("COM") {
        return None;
    }
    let rest = &name[3..];
    let digits = rest.strip_suffix(':').unwrap_or(rest);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// An open byte-stream handle to a serial device.
///
/// The handle is acquired in non-blocking read mode so that the caller's
/// bounded chunk loop can detect "no more data" without hanging.
#[async_trait]
pub trait LineHandle: Send {
    /// Read up to `buf.len()` bytes of currently-available data.
    ///
    /// Returns the number of bytes placed in `buf`. A return of 0 means
    /// no data is available right now; it never means end-of-stream.
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `data` to the device.
    async fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Release the handle.
    ///
    /// Dropping the handle also releases it; `close()` exists so the
    /// release can be observed and its failure surfaced as
    /// [`Error::CantCloseDevice`].
    async fn close(&mut self) -> Result<()>;
}

/// Platform capability for configuring and opening serial devices.
///
/// The serial line state machine invokes this with already-validated
/// arguments: device names have been normalized, configuration values
/// translated by a [`LineConfigTranslator`](crate::config::LineConfigTranslator),
/// and opening modes parsed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Map a platform-style device alias to the native device path.
    ///
    /// `COM<N>`-style names map to the platform serial path (on Unix,
    /// `COM3` becomes `/dev/ttyS2`); anything else passes through
    /// unchanged.
    fn normalize_device(&self, name: &str) -> String;

    /// Check that the device exists and is addressable.
    async fn probe(&self, device: &str) -> Result<()>;

    /// Run the platform line-configuration tool with the given arguments.
    async fn configure(&self, device: &str, args: &[String]) -> Result<()>;

    /// Acquire the byte-stream handle in non-blocking read mode.
    async fn open(&self, device: &str, mode: &OpenMode) -> Result<Box<dyn LineHandle>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_modes() {
        for (s, access) in [("r", Access::Read), ("a", Access::Append), ("w", Access::Write)] {
            let mode: OpenMode = s.parse().unwrap();
            assert_eq!(mode.access(), access);
            assert!(!mode.update());
            assert!(!mode.binary());
        }
    }

    #[test]
    fn parse_full_modes() {
        let mode: OpenMode = "r+b".parse().unwrap();
        assert_eq!(mode.access(), Access::Read);
        assert!(mode.update());
        assert!(mode.binary());

        let mode: OpenMode = "wb".parse().unwrap();
        assert_eq!(mode.access(), Access::Write);
        assert!(!mode.update());
        assert!(mode.binary());

        let mode: OpenMode = "a+".parse().unwrap();
        assert_eq!(mode.access(), Access::Append);
        assert!(mode.update());
        assert!(!mode.binary());
    }

    #[test]
    fn reject_malformed_modes() {
        for s in ["", "x", "rw", "r++", "rb+", "r+bb", "br", "r+x", "R"] {
            match s.parse::<OpenMode>() {
                Err(Error::InvalidOpeningMode(m)) => assert_eq!(m, s),
                other => panic!("mode {s:?}: expected InvalidOpeningMode, got {other:?}"),
            }
        }
    }

    #[test]
    fn default_mode_is_read_update_binary() {
        let mode = OpenMode::default();
        assert_eq!(mode.access(), Access::Read);
        assert!(mode.update());
        assert!(mode.binary());
        assert_eq!(mode, "r+b".parse().unwrap());
    }

    #[test]
    fn com_alias_matches() {
        assert_eq!(com_port_index("COM1"), Some(1));
        assert_eq!(com_port_index("COM3:"), Some(3));
        assert_eq!(com_port_index("com12"), Some(12));
        assert_eq!(com_port_index("CoM4"), Some(4));
    }

    #[test]
    fn com_alias_rejects_non_aliases() {
        assert_eq!(com_port_index("/dev/ttyUSB0"), None);
        assert_eq!(com_port_index("COM"), None);
        assert_eq!(com_port_index("COMx"), None);
        assert_eq!(com_port_index("COM3x"), None);
        assert_eq!(com_port_index("commodore"), None);
        assert_eq!(com_port_index(""), None);
    }

    #[test]
    fn readable_writable_derivation() {
        let read_only: OpenMode = "rb".parse().unwrap();
        assert!(read_only.readable());
        assert!(!read_only.writable());

        let write_only: OpenMode = "w".parse().unwrap();
        assert!(!write_only.readable());
        assert!(write_only.writable());

        let update: OpenMode = "r+b".parse().unwrap();
        assert!(update.readable());
        assert!(update.writable());

        let append: OpenMode = "a".parse().unwrap();
        assert!(!append.readable());
        assert!(append.writable());
    }
}
