//! L2CAP channel session
//!
//! A `ChannelSession` owns one connection-oriented channel to a fixed
//! endpoint: it dials, exchanges length-prefixed frames, and releases the
//! transport handle exactly once, on `close`, on a terminal error, or when
//! dropped.

use super::configure::{apply_post_connect, apply_pre_connect};
use super::constants::*;
use super::frame::{encode_frame, Frame};
use super::socket::{L2capSocket, Transport};
use super::types::{ConnectionParameters, Endpoint, NegotiatedParameters, SessionState};
use crate::error::{ChannelClosed, DialError, ReadError, WriteError};
use crate::gap::BdAddr;
use log::{debug, info, trace, warn};
use std::io;

/// A single connection-oriented channel.
///
/// Blocking and not internally synchronized: callers sharing a session
/// between threads must serialize access themselves.
pub struct ChannelSession<T: Transport = L2capSocket> {
    endpoint: Endpoint,
    params: ConnectionParameters,
    state: SessionState,
    transport: Option<T>,
    negotiated: Option<NegotiatedParameters>,
    recv_buf: Vec<u8>,
}

impl ChannelSession<L2capSocket> {
    /// Dial `endpoint` over a kernel L2CAP socket
    pub fn dial(endpoint: Endpoint, params: ConnectionParameters) -> Result<Self, DialError> {
        Self::dial_with(L2capSocket::allocate, endpoint, params)
    }

    /// Open this session over a kernel L2CAP socket
    pub fn open(&mut self) -> Result<(), DialError> {
        self.open_with(L2capSocket::allocate)
    }
}

impl<T: Transport> ChannelSession<T> {
    /// Create an unopened session
    pub fn new(endpoint: Endpoint, params: ConnectionParameters) -> Self {
        Self {
            endpoint,
            params,
            state: SessionState::Unopened,
            transport: None,
            negotiated: None,
            recv_buf: Vec::new(),
        }
    }

    /// Dial `endpoint` over a transport produced by `allocate`
    pub fn dial_with<F>(
        allocate: F,
        endpoint: Endpoint,
        params: ConnectionParameters,
    ) -> Result<Self, DialError>
    where
        F: FnOnce() -> io::Result<T>,
    {
        let mut session = Self::new(endpoint, params);
        session.open_with(allocate)?;
        Ok(session)
    }

    /// Allocate a handle, configure it, bind and connect.
    ///
    /// Any failure leaves the session in `Failed` with its handle released.
    pub fn open_with<F>(&mut self, allocate: F) -> Result<(), DialError>
    where
        F: FnOnce() -> io::Result<T>,
    {
        if self.state != SessionState::Unopened {
            return Err(DialError::NotUnopened(self.state));
        }

        let transport = match allocate() {
            Ok(transport) => transport,
            Err(err) => {
                warn!("Failed to allocate channel to {}: {}", self.endpoint, err);
                self.state = SessionState::Failed;
                return Err(DialError::Allocate(err));
            }
        };
        self.transport = Some(transport);
        self.state = SessionState::Configuring;

        match self.establish() {
            Ok(negotiated) => {
                info!(
                    "Channel to {} open (in MTU {}, out MTU {})",
                    self.endpoint, negotiated.inbound_mtu, negotiated.outbound_mtu
                );
                self.negotiated = Some(negotiated);
                self.state = SessionState::Open;
                Ok(())
            }
            Err(err) => {
                warn!("Dial to {} failed: {}", self.endpoint, err);
                self.release(SessionState::Failed);
                Err(err)
            }
        }
    }

    fn establish(&mut self) -> Result<NegotiatedParameters, DialError> {
        let address_type = self.endpoint.address_type;
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => return Err(DialError::NotUnopened(self.state)),
        };

        let mut negotiated = apply_pre_connect(transport, &self.params, address_type)?;

        // The local PSM matches the target PSM; the local address is left to the kernel
        let local = Endpoint::new(BdAddr::ANY, self.endpoint.psm, address_type);
        transport.bind(&local).map_err(DialError::Bind)?;

        self.state = SessionState::Connecting;
        debug!("Connecting to {}", self.endpoint);
        transport
            .connect(&self.endpoint)
            .map_err(|source| DialError::Connect {
                endpoint: self.endpoint,
                source,
            })?;

        apply_post_connect(transport, &mut negotiated, address_type)?;
        Ok(negotiated)
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Parameters as requested by the caller
    pub fn requested_parameters(&self) -> &ConnectionParameters {
        &self.params
    }

    /// Parameters in effect, once the session has been opened
    pub fn negotiated_parameters(&self) -> Option<&NegotiatedParameters> {
        self.negotiated.as_ref()
    }

    /// Whether the session currently holds a transport handle
    pub fn has_handle(&self) -> bool {
        self.transport.is_some()
    }

    /// Borrow the underlying transport while the session holds one
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    fn ensure_open(&self) -> Result<(), ChannelClosed> {
        if self.state == SessionState::Open {
            Ok(())
        } else {
            Err(ChannelClosed { state: self.state })
        }
    }

    fn release(&mut self, state: SessionState) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.state = state;
    }

    /// Frame `payload` and send it in a single write.
    ///
    /// Returns the number of bytes written including the length prefix. A
    /// transport error, a zero-byte write or a partial write closes the
    /// session; redialing is up to the caller.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize, WriteError> {
        self.ensure_open()?;

        let wire = encode_frame(payload)?;
        let mtu = self
            .negotiated
            .as_ref()
            .map_or(self.params.outbound_mtu, |n| n.outbound_mtu);
        if wire.len() > mtu as usize {
            return Err(WriteError::MtuExceeded {
                frame_len: wire.len(),
                mtu,
            });
        }

        let transport = self
            .transport
            .as_mut()
            .ok_or(ChannelClosed { state: self.state })?;

        trace!("TX {}", hex::encode(&wire));
        let result = match transport.send(&wire) {
            Ok(0) => Err(WriteError::NoProgress),
            Ok(written) if written < wire.len() => Err(WriteError::Partial {
                written,
                expected: wire.len(),
            }),
            Ok(written) => Ok(written),
            Err(err) => Err(WriteError::Transport(err)),
        };

        if let Err(err) = &result {
            warn!("Write to {} failed: {}", self.endpoint, err);
            self.release(SessionState::Failed);
        }
        result
    }

    /// Receive one datagram of at most the inbound MTU and decode its frame.
    ///
    /// End of stream and transport errors close the session. A frame whose
    /// prefix declares more bytes than were received is reported as
    /// truncated and leaves the session open.
    pub fn read(&mut self) -> Result<Frame, ReadError> {
        self.ensure_open()?;

        let mtu = self
            .negotiated
            .as_ref()
            .map_or(self.params.inbound_mtu, |n| n.inbound_mtu) as usize;
        let capacity = mtu.max(FRAME_HEADER_SIZE);
        if self.recv_buf.len() != capacity {
            self.recv_buf.resize(capacity, 0);
        }

        let transport = self
            .transport
            .as_mut()
            .ok_or(ChannelClosed { state: self.state })?;

        let received = match transport.receive(&mut self.recv_buf) {
            Ok(0) => {
                info!("Channel to {} closed by peer", self.endpoint);
                self.release(SessionState::Failed);
                return Err(ReadError::Eof);
            }
            Ok(received) => received.min(self.recv_buf.len()),
            Err(err) => {
                warn!("Read from {} failed: {}", self.endpoint, err);
                self.release(SessionState::Failed);
                return Err(ReadError::Transport(err));
            }
        };

        let data = &self.recv_buf[..received];
        trace!("RX {}", hex::encode(data));
        match Frame::decode(data) {
            Ok(frame) => {
                if frame.len() + FRAME_HEADER_SIZE < received {
                    debug!(
                        "Ignoring {} trailing bytes after frame",
                        received - frame.len() - FRAME_HEADER_SIZE
                    );
                }
                Ok(frame)
            }
            Err(truncated) => {
                warn!("Malformed frame from {}: {}", self.endpoint, truncated);
                Err(truncated.into())
            }
        }
    }

    /// Close the channel. Closing a closed or failed session is a no-op.
    ///
    /// When linger was negotiated the transport may block for up to that
    /// many seconds while unsent data is flushed.
    pub fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        if let Some(seconds) = self.negotiated.as_ref().and_then(|n| n.linger_seconds) {
            debug!("Closing {} with up to {}s linger", self.endpoint, seconds);
        }
        self.release(SessionState::Closed);
        info!("Channel to {} closed", self.endpoint);
    }
}

impl<T: Transport> Drop for ChannelSession<T> {
    fn drop(&mut self) {
        if self.transport.is_some() {
            self.release(SessionState::Closed);
        }
    }
}
