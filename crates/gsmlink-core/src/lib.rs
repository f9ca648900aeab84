//! gsmlink-core: Core traits, types, and error definitions for gsmlink.
//!
//! This crate defines the platform-agnostic abstractions the rest of the
//! workspace builds on. Applications normally depend on the `gsmlink`
//! facade crate instead.
//!
//! # Key types
//!
//! - [`Transport`] / [`LineHandle`] -- the capability that touches the
//!   platform (probe, configure, open, raw bytes)
//! - [`LineConfig`] / [`LineConfigTranslator`] -- platform-neutral line
//!   settings and their translation to tool arguments
//! - [`OpenMode`] -- the device opening mode grammar
//! - [`Error`] / [`Result`] -- error handling

pub mod config;
pub mod error;
pub mod transport;

// Re-export key types at crate root for ergonomic `use gsmlink_core::*`.
pub use config::{
    CharacterLength, FlowControl, LineConfig, LineConfigTranslator, Parity, StopBits,
    SUPPORTED_BAUD_RATES,
};
pub use error::{Error, Result};
pub use transport::{com_port_index, Access, LineHandle, OpenMode, Transport};
