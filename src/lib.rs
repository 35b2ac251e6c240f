//! rseme - DRM key acquisition orchestrator.
//!
//! This crate provides:
//! - A per-surface session orchestrator deduplicating need-key signals and
//!   driving key sessions to usable keys.
//! - Adapters for the standard key-session protocol and the WebKit
//!   (FairPlay) and MS (PlayReady) prefixed legacy protocols.
//! - Default certificate and license exchanges over an injectable transport.
//! - PlayReady key-message and FairPlay payload codecs.
//!
//! Feature flags:
//! - `http`: reqwest-backed default transport.
//! - `tracing`: enable tracing macros.
//! - `cli`: enable the CLI binary.
#![allow(clippy::result_large_err)]

#[macro_use]
mod macros;

/// Key-system adapters per protocol variant.
pub mod adapter;
/// Byte and string helpers shared by the adapters.
pub mod codec;
/// Key-system configuration and acquisition hooks.
pub mod config;
/// Common error types and Result alias.
pub mod error;
/// Orchestration events and sinks.
pub mod events;
/// Key status representation.
pub mod key;
/// Certificate and license exchange.
pub mod license;
/// Session orchestrator.
pub mod orchestrator;
/// Platform primitives implemented by hosts.
pub mod platform;
/// PlayReady key-message parsing.
pub mod playready;
/// Session registry and pending queue.
pub mod registry;
/// Session state machine.
pub mod session;
/// Request/response transport.
pub mod transport;

#[cfg(test)]
mod testkit;

pub use config::{EmeOptions, KeySystemOptions};
pub use error::{Error, ErrorKind, Result};
pub use orchestrator::{Acquisition, InitData, NeedKeySignal, Orchestrator, ProtocolHint};
