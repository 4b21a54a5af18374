//! L2CAP socket constants
//!
//! Values mirror the Linux kernel's `<bluetooth/bluetooth.h>` and
//! `<bluetooth/l2cap.h>` headers.

// Socket family and protocol
pub const AF_BLUETOOTH: i32 = 31;
pub const BTPROTO_L2CAP: i32 = 0;

// Option levels
pub const SOL_L2CAP: i32 = 6;
pub const SOL_BLUETOOTH: i32 = 274;

// SOL_BLUETOOTH option names
pub const BT_SECURITY: i32 = 4;
pub const BT_CHANNEL_POLICY: i32 = 10;
pub const BT_SNDMTU: i32 = 12;
pub const BT_RCVMTU: i32 = 13;
pub const BT_MODE: i32 = 15;

// Security levels for BT_SECURITY
pub const BT_SECURITY_SDP: u8 = 0;
pub const BT_SECURITY_LOW: u8 = 1;
pub const BT_SECURITY_MEDIUM: u8 = 2;
pub const BT_SECURITY_HIGH: u8 = 3;

// Channel modes for BT_MODE
pub const BT_MODE_BASIC: u8 = 0x00;
pub const BT_MODE_ERTM: u8 = 0x01;
pub const BT_MODE_STREAMING: u8 = 0x02;
pub const BT_MODE_LE_FLOWCTL: u8 = 0x03;
pub const BT_MODE_EXT_FLOWCTL: u8 = 0x04;

// SOL_L2CAP option names
pub const L2CAP_OPTIONS: i32 = 0x01;
pub const L2CAP_LM: i32 = 0x03;

// Legacy L2CAP_OPTIONS channel modes
pub const L2CAP_MODE_BASIC: u8 = 0x00;
pub const L2CAP_MODE_FLOWCTL: u8 = 0x02;
pub const L2CAP_MODE_ERTM: u8 = 0x03;
pub const L2CAP_MODE_STREAMING: u8 = 0x04;
pub const L2CAP_MODE_LE_FLOWCTL: u8 = 0x80;

// Link mode bits for L2CAP_LM
pub const L2CAP_LM_MASTER: u32 = 0x0001;
pub const L2CAP_LM_AUTH: u32 = 0x0002;
pub const L2CAP_LM_ENCRYPT: u32 = 0x0004;
pub const L2CAP_LM_TRUSTED: u32 = 0x0008;
pub const L2CAP_LM_RELIABLE: u32 = 0x0010;
pub const L2CAP_LM_SECURE: u32 = 0x0020;

// Defaults
pub const L2CAP_DEFAULT_MTU: u16 = 2048;
pub const L2CAP_DEFAULT_FCS: u8 = 0x01;
pub const L2CAP_DEFAULT_TX_WINDOW: u16 = 1000;
pub const L2CAP_DEFAULT_MAX_TRANSMIT: u8 = 30;
pub const L2CAP_DEFAULT_LINGER_SECS: u16 = 1;
pub const L2CAP_DEFAULT_RCVBUF: u32 = 2048;

// Frame length prefix size in bytes
pub const FRAME_HEADER_SIZE: usize = 2;
// Largest payload a 16-bit length prefix can describe
pub const FRAME_MAX_PAYLOAD: usize = u16::MAX as usize;
