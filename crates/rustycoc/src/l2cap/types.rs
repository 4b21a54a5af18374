//! Type definitions for L2CAP channel operations
//!
//! This module contains the connection parameters a caller chooses, the
//! parameters actually in effect after negotiation, and the endpoint a
//! channel connects to.

use super::constants::*;
use super::psm::Psm;
use crate::error::{ConfigError, ConfigStage};
use crate::gap::{AddressParseError, AddressType, BdAddr};
use bitflags::bitflags;
use std::fmt;
use std::io;
use thiserror::Error;

/// L2CAP Security Level requested through `BT_SECURITY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityLevel {
    /// No security (SDP level)
    None,
    /// Unauthenticated pairing, encryption optional
    Low,
    /// Unauthenticated pairing with encryption
    Medium,
    /// Authenticated pairing with encryption
    High,
}

impl SecurityLevel {
    /// Kernel value for this level
    pub fn to_raw(self) -> u8 {
        match self {
            SecurityLevel::None => BT_SECURITY_SDP,
            SecurityLevel::Low => BT_SECURITY_LOW,
            SecurityLevel::Medium => BT_SECURITY_MEDIUM,
            SecurityLevel::High => BT_SECURITY_HIGH,
        }
    }

    /// Parse a kernel security level. FIPS (4) is reported as `High`.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            BT_SECURITY_SDP => Some(SecurityLevel::None),
            BT_SECURITY_LOW => Some(SecurityLevel::Low),
            BT_SECURITY_MEDIUM => Some(SecurityLevel::Medium),
            BT_SECURITY_HIGH | 4 => Some(SecurityLevel::High),
            _ => None,
        }
    }
}

bitflags! {
    /// Link mode flags written through `L2CAP_LM` as one combined bitmask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LinkFlags: u32 {
        /// Request the central (master) role
        const CENTRAL = L2CAP_LM_MASTER;
        /// Require authentication
        const AUTH = L2CAP_LM_AUTH;
        /// Require encryption
        const ENCRYPT = L2CAP_LM_ENCRYPT;
        /// Reliable delivery
        const RELIABLE = L2CAP_LM_RELIABLE;
        /// Require Secure Connections
        const SECURE = L2CAP_LM_SECURE;
    }
}

impl Default for LinkFlags {
    fn default() -> Self {
        LinkFlags::all()
    }
}

/// Flow control mode of the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowControlMode {
    /// Basic L2CAP mode (no retransmission or flow control)
    Basic,
    /// Enhanced retransmission mode
    Retransmission,
    /// Streaming mode
    Streaming,
    /// LE credit-based flow control
    LeFlowControl,
    /// Enhanced credit-based flow control
    ExtendedFlowControl,
}

impl Default for FlowControlMode {
    fn default() -> Self {
        FlowControlMode::Basic
    }
}

impl FlowControlMode {
    /// Value written through `BT_MODE`
    pub fn bt_mode(self) -> u8 {
        match self {
            FlowControlMode::Basic => BT_MODE_BASIC,
            FlowControlMode::Retransmission => BT_MODE_ERTM,
            FlowControlMode::Streaming => BT_MODE_STREAMING,
            FlowControlMode::LeFlowControl => BT_MODE_LE_FLOWCTL,
            FlowControlMode::ExtendedFlowControl => BT_MODE_EXT_FLOWCTL,
        }
    }

    /// Value written in the legacy `L2CAP_OPTIONS` struct
    pub fn l2cap_mode(self) -> u8 {
        match self {
            FlowControlMode::Basic => L2CAP_MODE_BASIC,
            FlowControlMode::Retransmission => L2CAP_MODE_ERTM,
            FlowControlMode::Streaming => L2CAP_MODE_STREAMING,
            FlowControlMode::LeFlowControl => L2CAP_MODE_LE_FLOWCTL,
            FlowControlMode::ExtendedFlowControl => L2CAP_MODE_FLOWCTL,
        }
    }

    pub fn from_bt_mode(value: u8) -> Option<Self> {
        match value {
            BT_MODE_BASIC => Some(FlowControlMode::Basic),
            BT_MODE_ERTM => Some(FlowControlMode::Retransmission),
            BT_MODE_STREAMING => Some(FlowControlMode::Streaming),
            BT_MODE_LE_FLOWCTL => Some(FlowControlMode::LeFlowControl),
            BT_MODE_EXT_FLOWCTL => Some(FlowControlMode::ExtendedFlowControl),
            _ => None,
        }
    }

    pub fn from_l2cap_mode(value: u8) -> Option<Self> {
        match value {
            L2CAP_MODE_BASIC => Some(FlowControlMode::Basic),
            L2CAP_MODE_ERTM => Some(FlowControlMode::Retransmission),
            L2CAP_MODE_STREAMING => Some(FlowControlMode::Streaming),
            L2CAP_MODE_LE_FLOWCTL => Some(FlowControlMode::LeFlowControl),
            L2CAP_MODE_FLOWCTL => Some(FlowControlMode::ExtendedFlowControl),
            _ => None,
        }
    }
}

/// Retransmission tuning, consulted only in `FlowControlMode::Retransmission`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetransmissionTuning {
    /// Transmission window size
    pub window: u16,
    /// Maximum number of transmissions of one frame
    pub max_transmissions: u8,
    /// Frame Check Sequence option
    pub frame_check_sequence: u8,
}

impl Default for RetransmissionTuning {
    fn default() -> Self {
        Self {
            window: L2CAP_DEFAULT_TX_WINDOW,
            max_transmissions: L2CAP_DEFAULT_MAX_TRANSMIT,
            frame_check_sequence: L2CAP_DEFAULT_FCS,
        }
    }
}

/// Parameters requested for a channel.
///
/// The value is chosen once per dial and never shared between sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    /// Security level, applied before every other option
    pub security_level: SecurityLevel,
    /// Link mode flags
    pub link_flags: LinkFlags,
    /// Largest payload accepted in one inbound frame
    pub inbound_mtu: u16,
    /// Largest payload sent in one outbound frame
    pub outbound_mtu: u16,
    /// Flow control mode
    pub flow_control_mode: FlowControlMode,
    /// Retransmission tuning
    pub retransmission: RetransmissionTuning,
    /// Seconds to flush unsent data on close
    pub linger_seconds: Option<u16>,
    /// Requested kernel receive buffer size
    pub receive_buffer_bytes: Option<u32>,
    /// Channel policy; `None` leaves the transport default
    pub channel_policy: Option<u32>,
}

impl Default for ConnectionParameters {
    fn default() -> Self {
        Self {
            security_level: SecurityLevel::High,
            link_flags: LinkFlags::default(),
            inbound_mtu: L2CAP_DEFAULT_MTU,
            outbound_mtu: L2CAP_DEFAULT_MTU,
            flow_control_mode: FlowControlMode::Basic,
            retransmission: RetransmissionTuning::default(),
            linger_seconds: Some(L2CAP_DEFAULT_LINGER_SECS),
            receive_buffer_bytes: Some(L2CAP_DEFAULT_RCVBUF),
            channel_policy: None,
        }
    }
}

impl ConnectionParameters {
    pub fn with_security_level(mut self, level: SecurityLevel) -> Self {
        self.security_level = level;
        self
    }

    pub fn with_link_flags(mut self, flags: LinkFlags) -> Self {
        self.link_flags = flags;
        self
    }

    pub fn with_mtu(mut self, inbound: u16, outbound: u16) -> Self {
        self.inbound_mtu = inbound;
        self.outbound_mtu = outbound;
        self
    }

    pub fn with_flow_control_mode(mut self, mode: FlowControlMode) -> Self {
        self.flow_control_mode = mode;
        self
    }

    pub fn with_retransmission(mut self, tuning: RetransmissionTuning) -> Self {
        self.retransmission = tuning;
        self
    }

    /// Linger on close for `seconds`. Zero is rejected by `validate`: the
    /// kernel treats it as an abortive close that discards unsent data.
    pub fn with_linger_seconds(mut self, seconds: Option<u16>) -> Self {
        self.linger_seconds = seconds;
        self
    }

    pub fn with_receive_buffer_bytes(mut self, bytes: Option<u32>) -> Self {
        self.receive_buffer_bytes = bytes;
        self
    }

    /// Set the channel policy. Negative values leave the transport default.
    pub fn with_channel_policy(mut self, policy: i32) -> Self {
        self.channel_policy = u32::try_from(policy).ok();
        self
    }

    /// Check the parameters before any of them reach the transport. The
    /// error names the stage the offending value belongs to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |stage: ConfigStage, msg: String| -> Result<(), ConfigError> {
            Err(ConfigError::new(
                stage,
                io::Error::new(io::ErrorKind::InvalidInput, msg),
            ))
        };

        let min = FRAME_HEADER_SIZE as u16;
        if self.inbound_mtu < min || self.outbound_mtu < min {
            return invalid(
                ConfigStage::MtuFlowControl,
                format!(
                    "MTU must be at least {} bytes (inbound {}, outbound {})",
                    min, self.inbound_mtu, self.outbound_mtu
                ),
            );
        }

        if self.flow_control_mode == FlowControlMode::Retransmission
            && (self.retransmission.window == 0 || self.retransmission.max_transmissions == 0)
        {
            return invalid(
                ConfigStage::MtuFlowControl,
                "retransmission window and max transmissions must be non-zero".to_string(),
            );
        }

        if self.linger_seconds == Some(0) {
            return invalid(
                ConfigStage::Linger,
                "linger of 0 seconds would discard unsent data on close".to_string(),
            );
        }

        Ok(())
    }
}

/// Parameters in effect after configuration. Transport-granted values may
/// differ from the requested ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedParameters {
    pub security_level: SecurityLevel,
    pub link_flags: LinkFlags,
    pub inbound_mtu: u16,
    pub outbound_mtu: u16,
    pub flow_control_mode: FlowControlMode,
    /// Tuning written to the transport; only BR/EDR retransmission mode carries it
    pub retransmission: Option<RetransmissionTuning>,
    /// Flush timeout preserved from the transport baseline
    pub flush_timeout: Option<u16>,
    pub linger_seconds: Option<u16>,
    pub receive_buffer_bytes: Option<u32>,
    /// Receive buffer size granted by the kernel
    pub negotiated_receive_buffer_bytes: Option<u32>,
    pub channel_policy: Option<u32>,
}

impl NegotiatedParameters {
    /// Start from the requested values; the configurator overwrites what the
    /// transport reports back.
    pub fn requested(params: &ConnectionParameters) -> Self {
        Self {
            security_level: params.security_level,
            link_flags: params.link_flags,
            inbound_mtu: params.inbound_mtu,
            outbound_mtu: params.outbound_mtu,
            flow_control_mode: params.flow_control_mode,
            retransmission: (params.flow_control_mode == FlowControlMode::Retransmission)
                .then_some(params.retransmission),
            flush_timeout: None,
            linger_seconds: params.linger_seconds,
            receive_buffer_bytes: params.receive_buffer_bytes,
            negotiated_receive_buffer_bytes: None,
            channel_policy: params.channel_policy,
        }
    }
}

/// Error building an `Endpoint`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressParseError),

    #[error("Invalid PSM: {0}")]
    InvalidPsm(u16),
}

/// Remote endpoint of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub address: BdAddr,
    pub psm: Psm,
    pub address_type: AddressType,
}

impl Endpoint {
    pub fn new(address: BdAddr, psm: Psm, address_type: AddressType) -> Self {
        Self {
            address,
            psm,
            address_type,
        }
    }

    /// Build an endpoint from a textual address such as `"AA:BB:CC:DD:EE:FF"`
    pub fn parse(address: &str, psm: u16, address_type: AddressType) -> Result<Self, EndpointError> {
        let address = address.parse::<BdAddr>()?;
        let psm = Psm::new(psm).ok_or(EndpointError::InvalidPsm(psm))?;
        Ok(Self::new(address, psm, address_type))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}) {}", self.address, self.address_type, self.psm)
    }
}

/// Lifecycle state of a channel session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, no transport handle yet
    Unopened,
    /// Handle allocated, options being applied
    Configuring,
    /// Bound, connect in progress
    Connecting,
    /// Channel is open and ready for data transfer
    Open,
    /// Closed by the caller
    Closed,
    /// Closed after an unrecoverable error
    Failed,
}

impl SessionState {
    /// Whether a session in this state owns a transport handle
    pub fn holds_handle(&self) -> bool {
        matches!(
            self,
            SessionState::Configuring | SessionState::Connecting | SessionState::Open
        )
    }

    /// Whether the session has reached its final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unopened => write!(f, "Unopened"),
            Self::Configuring => write!(f, "Configuring"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}
