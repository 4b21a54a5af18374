//! Error types for the rustycoc library
//!
//! Every failure names the stage or phase it happened in, so callers can tell
//! configuration problems from connectivity problems from framing problems.

use crate::l2cap::frame::{PayloadTooLarge, Truncated};
use crate::l2cap::types::{Endpoint, SessionState};
use std::fmt;
use std::io;
use thiserror::Error;

/// Configuration stage at which an option application failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigStage {
    Security,
    Baseline,
    MtuFlowControl,
    LinkMode,
    ChannelPolicy,
    Linger,
    ReceiveBuffer,
    PostConnect,
}

impl fmt::Display for ConfigStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            ConfigStage::Security => "security",
            ConfigStage::Baseline => "baseline read",
            ConfigStage::MtuFlowControl => "mtu/flow-control",
            ConfigStage::LinkMode => "link-mode",
            ConfigStage::ChannelPolicy => "channel-policy",
            ConfigStage::Linger => "linger",
            ConfigStage::ReceiveBuffer => "buffer-size",
            ConfigStage::PostConnect => "post-connect",
        };
        f.write_str(stage)
    }
}

/// An option application failed. The handle must be discarded.
#[derive(Debug, Error)]
#[error("Failed to apply {stage} options: {source}")]
pub struct ConfigError {
    pub stage: ConfigStage,
    #[source]
    pub source: io::Error,
}

impl ConfigError {
    pub fn new(stage: ConfigStage, source: io::Error) -> Self {
        Self { stage, source }
    }

    /// OS error code reported by the transport, if any
    pub fn underlying_code(&self) -> Option<i32> {
        self.source.raw_os_error()
    }
}

/// Operation attempted on a session that is not open
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Channel is not open (state: {state})")]
pub struct ChannelClosed {
    pub state: SessionState,
}

/// Phase of `dial` that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialPhase {
    /// The session was not in a state that allows dialing
    Precondition,
    Allocate,
    Config,
    Bind,
    Connect,
}

/// Errors that can occur while dialing a channel
#[derive(Debug, Error)]
pub enum DialError {
    #[error("Failed to allocate L2CAP socket: {0}")]
    Allocate(#[source] io::Error),

    #[error("Failed to configure channel: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind local endpoint: {0}")]
    Bind(#[source] io::Error),

    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    #[error("Session cannot be opened from state {0}")]
    NotUnopened(SessionState),
}

impl DialError {
    pub fn phase(&self) -> DialPhase {
        match self {
            DialError::NotUnopened(_) => DialPhase::Precondition,
            DialError::Allocate(_) => DialPhase::Allocate,
            DialError::Config(_) => DialPhase::Config,
            DialError::Bind(_) => DialPhase::Bind,
            DialError::Connect { .. } => DialPhase::Connect,
        }
    }
}

/// Errors that can occur while writing a frame
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Closed(#[from] ChannelClosed),

    #[error("Payload of {0} bytes does not fit a 16-bit length prefix")]
    PayloadTooLarge(usize),

    #[error("Frame of {frame_len} bytes exceeds outbound MTU {mtu}")]
    MtuExceeded { frame_len: usize, mtu: u16 },

    #[error("Transport rejected write: {0}")]
    Transport(#[source] io::Error),

    #[error("Transport accepted no bytes")]
    NoProgress,

    #[error("Partial write: {written} of {expected} bytes")]
    Partial { written: usize, expected: usize },
}

impl From<PayloadTooLarge> for WriteError {
    fn from(err: PayloadTooLarge) -> Self {
        WriteError::PayloadTooLarge(err.0)
    }
}

impl WriteError {
    /// Whether the error leaves the session unusable
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WriteError::Transport(_) | WriteError::NoProgress | WriteError::Partial { .. }
        )
    }
}

/// Category of a read failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadErrorKind {
    Closed,
    Eof,
    TransportError,
    Truncated,
}

/// Errors that can occur while reading a frame
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Closed(#[from] ChannelClosed),

    #[error("Channel closed by peer")]
    Eof,

    #[error("Transport receive failed: {0}")]
    Transport(#[source] io::Error),

    #[error("Frame needs {needed} bytes but only {available} were received")]
    Truncated { needed: usize, available: usize },
}

impl From<Truncated> for ReadError {
    fn from(err: Truncated) -> Self {
        ReadError::Truncated {
            needed: err.needed,
            available: err.available,
        }
    }
}

impl ReadError {
    pub fn kind(&self) -> ReadErrorKind {
        match self {
            ReadError::Closed(_) => ReadErrorKind::Closed,
            ReadError::Eof => ReadErrorKind::Eof,
            ReadError::Transport(_) => ReadErrorKind::TransportError,
            ReadError::Truncated { .. } => ReadErrorKind::Truncated,
        }
    }

    /// Whether the error leaves the session unusable
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReadError::Eof | ReadError::Transport(_))
    }
}
