//! AT wire codec: command framing and reply line delimiting.
//!
//! Commands go out as their text followed by a terminator (CR LF unless a
//! caller overrides it). Replies come back as raw bytes in which carriage
//! returns are noise and line feeds are delimiters; empty lines are
//! discarded. All functions here are pure -- the caller is responsible for
//! moving the bytes over a transport.
//!
//! # Example
//!
//! ```
//! use gsmlink_modem::protocol::{frame_command, split_lines, CRLF};
//!
//! assert_eq!(frame_command("AT", CRLF), b"AT\r\n");
//!
//! let lines = split_lines(b"AT\r\n\r\nOK\r\n");
//! assert_eq!(lines, vec!["AT", "OK"]);
//! ```

use bytes::{BufMut, BytesMut};

/// Default command terminator.
pub const CRLF: &str = "\r\n";

/// SMS body terminator byte (CTRL-Z / SUB).
pub const CTRL_Z: u8 = 0x1A;

/// Frame a command for transmission: text followed by the terminator.
pub fn frame_command(command: &str, end: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(command.len() + end.len());
    buf.put_slice(command.as_bytes());
    buf.put_slice(end.as_bytes());
    buf.to_vec()
}

/// Normalize raw reply bytes into logical lines.
///
/// Decodes lossily as UTF-8, strips carriage returns, splits on line
/// feeds, and drops empty lines.
pub fn split_lines(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .replace('\r', "")
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join logical lines back into the reply text handed to callers.
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}
