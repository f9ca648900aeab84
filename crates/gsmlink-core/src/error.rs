//! Error types for gsmlink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Lifecycle-sequencing, validation, and
//! transport-layer errors are all captured here.
//!
//! Every error is a local, synchronous failure surfaced to the immediate
//! caller: a sequencing error is fatal to the call but not to the session,
//! a validation error is rejected before any transport invocation, and a
//! transport error carries the failing operation in its variant. There is
//! no retry machinery anywhere in the library; callers decide whether to
//! retry, abort, or prompt a user.

/// The error type for all gsmlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device failed probe validation when binding.
    #[error("unknown serial device: {0}")]
    UnknownDevice(String),

    /// An operation requiring a closed line was attempted while open
    /// (binding another device, or opening a second time).
    #[error("the device is already opened")]
    DeviceAlreadyOpened,

    /// `open()` was attempted before any device was bound.
    #[error("the device must be set before being opened")]
    OpenOnUnsetDevice,

    /// The opening mode string does not match the accepted grammar.
    ///
    /// Accepted modes are `r`, `a`, or `w`, optionally followed by `+`,
    /// optionally followed by `b` (e.g. `"r+b"`).
    #[error("invalid opening mode: {0}")]
    InvalidOpeningMode(String),

    /// The transport failed to acquire the device handle.
    #[error("unable to open the device: {0}")]
    CantOpenDevice(String),

    /// The transport failed to release the device handle.
    #[error("unable to close the device: {0}")]
    CantCloseDevice(String),

    /// The platform line-configuration tool reported failure.
    #[error("unable to configure the device: {0}")]
    CantConfigureDevice(String),

    /// A write or flush was attempted while the line is not open.
    #[error("can't write on a closed serial device")]
    WriteOnClosedDevice,

    /// A read was attempted while the line is not open.
    #[error("can't read on a closed serial device")]
    ReadOnClosedDevice,

    /// The transport write failed. The pending write buffer has already
    /// been cleared and is not replayed.
    #[error("error while writing to the device: {0}")]
    CantWriteOnDevice(String),

    /// Line configuration was attempted while the device is either unset
    /// or already opened.
    #[error("the device is either not set or already opened")]
    DeviceNotReady,

    /// The requested baud rate is not in the supported set.
    #[error("baud rate {0} is not valid")]
    InvalidBaudRate(u32),

    /// The requested parity value is not recognised.
    #[error("parity {0:?} is not valid")]
    InvalidParity(String),

    /// The requested flow control value is not recognised.
    #[error("flow control {0:?} is not valid")]
    InvalidFlowControl(String),

    /// The platform line-configuration tool is not runnable.
    #[error("line configuration tool unavailable: {0}")]
    ConfigToolUnavailable(String),

    /// No native transport exists for the running operating system.
    #[error("unsupported operating system")]
    UnsupportedPlatform,

    /// An invalid parameter was passed to a gsmlink API.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The modem reply did not match the expected grammar.
    #[error("bad response from modem: {0}")]
    BadResponse(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unknown_device() {
        let e = Error::UnknownDevice("/dev/ttyS9".into());
        assert_eq!(e.to_string(), "unknown serial device: /dev/ttyS9");
    }

    #[test]
    fn error_display_already_opened() {
        let e = Error::DeviceAlreadyOpened;
        assert_eq!(e.to_string(), "the device is already opened");
    }

    #[test]
    fn error_display_invalid_baud_rate() {
        let e = Error::InvalidBaudRate(12345);
        assert_eq!(e.to_string(), "baud rate 12345 is not valid");
    }

    #[test]
    fn error_display_bad_response() {
        let e = Error::BadResponse("no +CSQ in reply".into());
        assert_eq!(e.to_string(), "bad response from modem: no +CSQ in reply");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<u32> = Ok(42);
        assert_eq!(ok.unwrap(), 42);

        let err: Result<u32> = Err(Error::DeviceNotReady);
        assert!(err.is_err());
    }
}
