//! Socket option vocabulary for L2CAP channels
//!
//! Every option the configurator reads or writes is named by an `OptionKey`
//! (an option level plus an option name) and carried as a typed
//! `SocketOption` value.

use super::constants::*;
use super::types::{FlowControlMode, LinkFlags, SecurityLevel};
use std::fmt;

/// Option level (the `level` argument of `setsockopt`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionLevel {
    /// `SOL_SOCKET`
    Socket,
    /// `SOL_L2CAP`
    L2cap,
    /// `SOL_BLUETOOTH`
    Bluetooth,
}

impl OptionLevel {
    pub fn raw(self) -> i32 {
        match self {
            OptionLevel::Socket => libc::SOL_SOCKET,
            OptionLevel::L2cap => SOL_L2CAP,
            OptionLevel::Bluetooth => SOL_BLUETOOTH,
        }
    }
}

/// Name of a socket option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Security,
    Mode,
    ReceiveMtu,
    SendMtu,
    ChannelPolicy,
    L2capOptions,
    LinkMode,
    Linger,
    ReceiveBuffer,
}

impl OptionKey {
    pub fn level(self) -> OptionLevel {
        match self {
            OptionKey::Security
            | OptionKey::Mode
            | OptionKey::ReceiveMtu
            | OptionKey::SendMtu
            | OptionKey::ChannelPolicy => OptionLevel::Bluetooth,
            OptionKey::L2capOptions | OptionKey::LinkMode => OptionLevel::L2cap,
            OptionKey::Linger | OptionKey::ReceiveBuffer => OptionLevel::Socket,
        }
    }

    pub fn name(self) -> i32 {
        match self {
            OptionKey::Security => BT_SECURITY,
            OptionKey::Mode => BT_MODE,
            OptionKey::ReceiveMtu => BT_RCVMTU,
            OptionKey::SendMtu => BT_SNDMTU,
            OptionKey::ChannelPolicy => BT_CHANNEL_POLICY,
            OptionKey::L2capOptions => L2CAP_OPTIONS,
            OptionKey::LinkMode => L2CAP_LM,
            OptionKey::Linger => libc::SO_LINGER,
            OptionKey::ReceiveBuffer => libc::SO_RCVBUF,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionKey::Security => "BT_SECURITY",
            OptionKey::Mode => "BT_MODE",
            OptionKey::ReceiveMtu => "BT_RCVMTU",
            OptionKey::SendMtu => "BT_SNDMTU",
            OptionKey::ChannelPolicy => "BT_CHANNEL_POLICY",
            OptionKey::L2capOptions => "L2CAP_OPTIONS",
            OptionKey::LinkMode => "L2CAP_LM",
            OptionKey::Linger => "SO_LINGER",
            OptionKey::ReceiveBuffer => "SO_RCVBUF",
        };
        f.write_str(name)
    }
}

/// Legacy `struct l2cap_options`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct L2capOptions {
    /// Outgoing MTU
    pub omtu: u16,
    /// Incoming MTU
    pub imtu: u16,
    /// Flush timeout
    pub flush_to: u16,
    /// Channel mode, legacy numbering
    pub mode: u8,
    /// Frame Check Sequence
    pub fcs: u8,
    /// Maximum transmissions
    pub max_tx: u8,
    /// Transmission window size
    pub txwin_size: u16,
}

/// A typed socket option value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketOption {
    Security(SecurityLevel),
    Mode(FlowControlMode),
    ReceiveMtu(u16),
    SendMtu(u16),
    ChannelPolicy(u32),
    L2capOptions(L2capOptions),
    LinkMode(LinkFlags),
    /// `Some(seconds)` enables linger, `None` disables it
    Linger(Option<u16>),
    ReceiveBuffer(u32),
}

impl SocketOption {
    pub fn key(&self) -> OptionKey {
        match self {
            SocketOption::Security(_) => OptionKey::Security,
            SocketOption::Mode(_) => OptionKey::Mode,
            SocketOption::ReceiveMtu(_) => OptionKey::ReceiveMtu,
            SocketOption::SendMtu(_) => OptionKey::SendMtu,
            SocketOption::ChannelPolicy(_) => OptionKey::ChannelPolicy,
            SocketOption::L2capOptions(_) => OptionKey::L2capOptions,
            SocketOption::LinkMode(_) => OptionKey::LinkMode,
            SocketOption::Linger(_) => OptionKey::Linger,
            SocketOption::ReceiveBuffer(_) => OptionKey::ReceiveBuffer,
        }
    }
}
