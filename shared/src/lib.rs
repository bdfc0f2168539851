//! Shared types and utilities for ratebench
//!
//! This crate contains the wire protocol, the vector and summary-row types, and
//! the streaming statistics used by both the sending server and the measuring
//! client.

pub mod protocol;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use protocol::frame::{FrameCodec, FramingError};
pub use stats::RunningStat;
pub use types::vector::{SummaryRow, Vector};
