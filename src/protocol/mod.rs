//! Channel message types.
//!
//! # Protocol Overview
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | `OutboundMessage` | Local → Remote | JSON or raw text frame |
//! | `InboundMessage` | Remote → Local | Decoded frame, broadcast to every subscriber |
//! | `ConnectionStatus` | Local | Transport lifecycle value |
//!
//! Inbound frames carry no request id. Consumers recognise replies by
//! payload shape (see [`crate::correlation`]).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Inbound decoding and outbound encoding |
//! | `session` | Session hydration payload helpers |
//! | `status` | Connection status enum |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound and outbound message types.
pub mod message;

/// Session hydration payloads.
pub mod session;

/// Connection status values.
pub mod status;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{InboundMessage, KIND_JSON, KIND_TEXT, OutboundMessage};
pub use session::SessionGrant;
pub use status::ConnectionStatus;
