//! RustyCoc - A Rust client for Bluetooth L2CAP connection-oriented channels
//!
//! This library dials a single L2CAP channel to a remote device identified by
//! address and PSM on Linux, negotiates its parameters (security, link mode,
//! MTUs, flow control, linger, receive buffer) and exchanges length-prefixed
//! messages over it.

pub mod error;
pub mod gap;
pub mod l2cap;

// Re-export common types for convenience
pub use error::{
    ChannelClosed, ConfigError, ConfigStage, DialError, DialPhase, ReadError, ReadErrorKind,
    WriteError,
};
pub use gap::{AddressType, BdAddr};
pub use l2cap::{
    ChannelSession, ConnectionParameters, Endpoint, FlowControlMode, Frame, L2capSocket,
    LinkFlags, NegotiatedParameters, Psm, SecurityLevel, SessionState, Transport,
};
