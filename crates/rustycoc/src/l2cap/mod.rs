//! L2CAP (Logical Link Control and Adaptation Protocol) channels
//!
//! This module provides a client for one connection-oriented L2CAP channel:
//! - Negotiating channel parameters on the socket before and after connect
//! - Dialing a remote device by address and PSM
//! - Exchanging length-prefixed frames over the open channel

pub mod configure;
pub mod constants;
pub mod frame;
pub mod options;
pub mod psm;
pub mod session;
pub mod socket;
pub mod types;

// Re-export the public API
pub use self::configure::{apply_post_connect, apply_pre_connect, Baseline};
pub use self::frame::{encode_frame, Frame, PayloadTooLarge, Truncated};
pub use self::options::{L2capOptions, OptionKey, OptionLevel, SocketOption};
pub use self::psm::Psm;
pub use self::session::ChannelSession;
pub use self::socket::{L2capSocket, Transport};
pub use self::types::*;
