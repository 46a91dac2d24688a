//! Utility modules for the session engine.
//!
//! This module provides deadline tracking for absolute waits and inactivity windows.

pub mod timeout;

pub use timeout::{Deadline, InactivityTimer};
