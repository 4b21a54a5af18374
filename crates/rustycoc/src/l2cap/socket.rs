//! L2CAP socket transport
//!
//! This module defines the `Transport` boundary the channel layer drives and
//! `L2capSocket`, its implementation over a kernel `SOCK_SEQPACKET` L2CAP
//! socket.

use super::constants::*;
use super::options::{L2capOptions, OptionKey, SocketOption};
use super::types::{Endpoint, FlowControlMode, LinkFlags, SecurityLevel};
use log::{debug, trace};
use std::io;
use std::mem;
use std::os::unix::io::{AsRawFd, RawFd};

/// Connection-oriented, datagram-preserving channel transport.
///
/// Implementations are not required to be thread safe; the owning session
/// serializes every call.
pub trait Transport {
    /// Write one socket option
    fn set_option(&mut self, option: &SocketOption) -> io::Result<()>;

    /// Read one socket option
    fn get_option(&self, key: OptionKey) -> io::Result<SocketOption>;

    /// Bind the local side of the channel
    fn bind(&mut self, local: &Endpoint) -> io::Result<()>;

    /// Connect to the remote endpoint, blocking until done
    fn connect(&mut self, remote: &Endpoint) -> io::Result<()>;

    /// Send one datagram, returning the number of bytes accepted
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Receive one datagram into `buf`, returning its length
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the handle
    fn close(&mut self);
}

// struct sockaddr_l2
#[repr(C)]
struct SockaddrL2 {
    l2_family: libc::sa_family_t,
    l2_psm: u16,
    l2_bdaddr: [u8; 6],
    l2_cid: u16,
    l2_bdaddr_type: u8,
}

impl SockaddrL2 {
    fn from_endpoint(endpoint: &Endpoint) -> Self {
        Self {
            l2_family: AF_BLUETOOTH as libc::sa_family_t,
            l2_psm: endpoint.psm.value().to_le(),
            l2_bdaddr: endpoint.address.bytes,
            l2_cid: 0,
            l2_bdaddr_type: endpoint.address_type.into(),
        }
    }
}

// struct bt_security
#[repr(C)]
#[derive(Default)]
struct BtSecurity {
    level: u8,
    key_size: u8,
}

// struct linger
#[repr(C)]
#[derive(Default)]
struct Linger {
    l_onoff: libc::c_int,
    l_linger: libc::c_int,
}

/// Kernel L2CAP socket
#[derive(Debug)]
pub struct L2capSocket {
    fd: RawFd,
}

impl L2capSocket {
    /// Allocates a new, unbound L2CAP socket
    pub fn allocate() -> io::Result<Self> {
        let fd = unsafe {
            libc::socket(
                AF_BLUETOOTH,
                libc::SOCK_SEQPACKET | libc::SOCK_CLOEXEC,
                BTPROTO_L2CAP,
            )
        };

        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        debug!("Allocated L2CAP socket fd={}", fd);
        Ok(L2capSocket { fd })
    }

    fn check_open(&self) -> io::Result<()> {
        if self.fd < 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        Ok(())
    }

    fn setsockopt_raw<T>(&self, key: OptionKey, value: &T) -> io::Result<()> {
        self.check_open()?;
        let result = unsafe {
            libc::setsockopt(
                self.fd,
                key.level().raw(),
                key.name(),
                value as *const T as *const libc::c_void,
                mem::size_of::<T>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn getsockopt_raw<T: Default>(&self, key: OptionKey) -> io::Result<T> {
        self.check_open()?;
        let mut value = T::default();
        let mut len = mem::size_of::<T>() as libc::socklen_t;
        let result = unsafe {
            libc::getsockopt(
                self.fd,
                key.level().raw(),
                key.name(),
                &mut value as *mut T as *mut libc::c_void,
                &mut len,
            )
        };

        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(value)
    }
}

fn invalid_data(key: OptionKey, raw: impl std::fmt::Display) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("unexpected {} value {}", key, raw),
    )
}

impl Transport for L2capSocket {
    fn set_option(&mut self, option: &SocketOption) -> io::Result<()> {
        let key = option.key();
        trace!("setsockopt {} = {:?}", key, option);
        match *option {
            SocketOption::Security(level) => self.setsockopt_raw(
                key,
                &BtSecurity {
                    level: level.to_raw(),
                    key_size: 0,
                },
            ),
            SocketOption::Mode(mode) => self.setsockopt_raw(key, &mode.bt_mode()),
            SocketOption::ReceiveMtu(mtu) | SocketOption::SendMtu(mtu) => {
                self.setsockopt_raw(key, &mtu)
            }
            SocketOption::ChannelPolicy(policy) => self.setsockopt_raw(key, &policy),
            SocketOption::L2capOptions(opts) => self.setsockopt_raw(key, &opts),
            SocketOption::LinkMode(flags) => self.setsockopt_raw(key, &flags.bits()),
            SocketOption::Linger(seconds) => {
                let linger = Linger {
                    l_onoff: seconds.is_some() as libc::c_int,
                    l_linger: libc::c_int::from(seconds.unwrap_or(0)),
                };
                self.setsockopt_raw(key, &linger)
            }
            SocketOption::ReceiveBuffer(bytes) => {
                let bytes = libc::c_int::try_from(bytes)
                    .map_err(|_| invalid_data(key, bytes))?;
                self.setsockopt_raw(key, &bytes)
            }
        }
    }

    fn get_option(&self, key: OptionKey) -> io::Result<SocketOption> {
        let option = match key {
            OptionKey::Security => {
                let sec: BtSecurity = self.getsockopt_raw(key)?;
                let level =
                    SecurityLevel::from_raw(sec.level).ok_or_else(|| invalid_data(key, sec.level))?;
                SocketOption::Security(level)
            }
            OptionKey::Mode => {
                let raw: u8 = self.getsockopt_raw(key)?;
                let mode = FlowControlMode::from_bt_mode(raw).ok_or_else(|| invalid_data(key, raw))?;
                SocketOption::Mode(mode)
            }
            OptionKey::ReceiveMtu => SocketOption::ReceiveMtu(self.getsockopt_raw(key)?),
            OptionKey::SendMtu => SocketOption::SendMtu(self.getsockopt_raw(key)?),
            OptionKey::ChannelPolicy => SocketOption::ChannelPolicy(self.getsockopt_raw(key)?),
            OptionKey::L2capOptions => {
                SocketOption::L2capOptions(self.getsockopt_raw::<L2capOptions>(key)?)
            }
            OptionKey::LinkMode => {
                let raw: u32 = self.getsockopt_raw(key)?;
                SocketOption::LinkMode(LinkFlags::from_bits_truncate(raw))
            }
            OptionKey::Linger => {
                let linger: Linger = self.getsockopt_raw(key)?;
                let seconds = (linger.l_onoff != 0)
                    .then(|| u16::try_from(linger.l_linger).unwrap_or(u16::MAX));
                SocketOption::Linger(seconds)
            }
            OptionKey::ReceiveBuffer => {
                let raw: libc::c_int = self.getsockopt_raw(key)?;
                let bytes = u32::try_from(raw).map_err(|_| invalid_data(key, raw))?;
                SocketOption::ReceiveBuffer(bytes)
            }
        };

        trace!("getsockopt {} -> {:?}", key, option);
        Ok(option)
    }

    fn bind(&mut self, local: &Endpoint) -> io::Result<()> {
        self.check_open()?;
        let addr = SockaddrL2::from_endpoint(local);
        let result = unsafe {
            libc::bind(
                self.fd,
                &addr as *const _ as *const libc::sockaddr,
                mem::size_of::<SockaddrL2>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn connect(&mut self, remote: &Endpoint) -> io::Result<()> {
        self.check_open()?;
        let addr = SockaddrL2::from_endpoint(remote);
        let result = unsafe {
            libc::connect(
                self.fd,
                &addr as *const _ as *const libc::sockaddr,
                mem::size_of::<SockaddrL2>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        let sent = unsafe {
            libc::send(
                self.fd,
                bytes.as_ptr() as *const libc::c_void,
                bytes.len(),
                0,
            )
        };

        if sent < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(sent as usize)
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        let received = unsafe {
            libc::recv(
                self.fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                0,
            )
        };

        if received < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(received as usize)
    }

    fn close(&mut self) {
        if self.fd >= 0 {
            debug!("Closing L2CAP socket fd={}", self.fd);
            // With SO_LINGER enabled the kernel holds close until unsent data
            // is flushed or the linger time expires.
            unsafe { libc::close(self.fd) };
            self.fd = -1;
        }
    }
}

impl AsRawFd for L2capSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for L2capSocket {
    fn drop(&mut self) {
        self.close();
    }
}
