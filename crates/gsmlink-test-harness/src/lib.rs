//! gsmlink-test-harness: Mock transport and test utilities for gsmlink.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the serial line state machine and the AT protocol layer without real
//! modem hardware.

pub mod mock_serial;

pub use mock_serial::{MockLineHandle, MockTransport};
