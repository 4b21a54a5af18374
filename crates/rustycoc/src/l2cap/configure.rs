//! Channel configuration
//!
//! Applies `ConnectionParameters` to a freshly allocated L2CAP socket before
//! it is connected, and reads back the MTUs in effect once it is.
//!
//! The pre-connect order is fixed: security, baseline read, MTU/flow-control
//! write, link mode, channel policy, linger, receive buffer. Some kernels
//! reject later writes when security is not the first option applied.

use super::options::{L2capOptions, OptionKey, SocketOption};
use super::socket::Transport;
use super::types::{ConnectionParameters, FlowControlMode, NegotiatedParameters};
use crate::error::{ConfigError, ConfigStage};
use crate::gap::AddressType;
use log::debug;
use std::io;

/// Option set the transport reports before any MTU/flow-control write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    /// Full legacy `L2CAP_OPTIONS` struct
    Legacy(L2capOptions),
    /// LE sockets only expose the receive MTU before connecting
    Le { inbound_mtu: u16 },
}

/// Whether the baseline is read as the legacy `L2CAP_OPTIONS` struct
pub fn uses_legacy_baseline(address_type: AddressType, mode: FlowControlMode) -> bool {
    !address_type.is_le() || mode != FlowControlMode::Basic
}

fn unexpected(key: OptionKey, option: SocketOption) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("transport answered {} with {:?}", key, option),
    )
}

fn get_u16<T: Transport + ?Sized>(transport: &T, key: OptionKey) -> io::Result<u16> {
    match transport.get_option(key)? {
        SocketOption::ReceiveMtu(mtu) if key == OptionKey::ReceiveMtu => Ok(mtu),
        SocketOption::SendMtu(mtu) if key == OptionKey::SendMtu => Ok(mtu),
        other => Err(unexpected(key, other)),
    }
}

fn get_legacy<T: Transport + ?Sized>(transport: &T) -> io::Result<L2capOptions> {
    match transport.get_option(OptionKey::L2capOptions)? {
        SocketOption::L2capOptions(opts) => Ok(opts),
        other => Err(unexpected(OptionKey::L2capOptions, other)),
    }
}

/// Read the transport's current options
pub fn read_baseline<T: Transport + ?Sized>(
    transport: &T,
    address_type: AddressType,
    mode: FlowControlMode,
) -> io::Result<Baseline> {
    if uses_legacy_baseline(address_type, mode) {
        Ok(Baseline::Legacy(get_legacy(transport)?))
    } else {
        Ok(Baseline::Le {
            inbound_mtu: get_u16(transport, OptionKey::ReceiveMtu)?,
        })
    }
}

/// Overlay the requested MTUs and flow-control settings onto a legacy
/// baseline. Fields the caller does not control keep the transport value.
pub fn overlay_legacy(mut opts: L2capOptions, params: &ConnectionParameters) -> L2capOptions {
    opts.omtu = params.outbound_mtu;
    opts.imtu = params.inbound_mtu;
    opts.mode = params.flow_control_mode.l2cap_mode();

    if params.flow_control_mode == FlowControlMode::Retransmission {
        opts.fcs = params.retransmission.frame_check_sequence;
        opts.txwin_size = params.retransmission.window;
        opts.max_tx = params.retransmission.max_transmissions;
    }

    opts
}

/// Apply `params` to an unconnected transport handle.
///
/// On error the handle is left partially configured; discard it and dial
/// again from a fresh one.
pub fn apply_pre_connect<T: Transport + ?Sized>(
    transport: &mut T,
    params: &ConnectionParameters,
    address_type: AddressType,
) -> Result<NegotiatedParameters, ConfigError> {
    params.validate()?;

    let mut negotiated = NegotiatedParameters::requested(params);

    debug!("Setting security level {:?}", params.security_level);
    transport
        .set_option(&SocketOption::Security(params.security_level))
        .map_err(|e| ConfigError::new(ConfigStage::Security, e))?;

    let baseline = read_baseline(&*transport, address_type, params.flow_control_mode)
        .map_err(|e| ConfigError::new(ConfigStage::Baseline, e))?;
    debug!("Baseline options: {:?}", baseline);
    if let Baseline::Legacy(opts) = baseline {
        negotiated.flush_timeout = Some(opts.flush_to);
    }

    let mtu_result = if address_type.is_le() {
        // Retransmission tuning only travels in the legacy struct
        negotiated.retransmission = None;
        let mode = params.flow_control_mode;
        let mode_result = if mode != FlowControlMode::Basic {
            transport.set_option(&SocketOption::Mode(mode))
        } else {
            Ok(())
        };
        mode_result
            .and_then(|_| transport.set_option(&SocketOption::ReceiveMtu(params.inbound_mtu)))
    } else {
        let legacy = match baseline {
            Baseline::Legacy(opts) => opts,
            // BR/EDR always reads the legacy struct
            Baseline::Le { inbound_mtu } => L2capOptions {
                imtu: inbound_mtu,
                ..L2capOptions::default()
            },
        };
        let opts = overlay_legacy(legacy, params);
        transport.set_option(&SocketOption::L2capOptions(opts))
    };
    mtu_result.map_err(|e| ConfigError::new(ConfigStage::MtuFlowControl, e))?;
    debug!(
        "Applied MTU in={} out={} mode={:?}",
        params.inbound_mtu, params.outbound_mtu, params.flow_control_mode
    );

    transport
        .set_option(&SocketOption::LinkMode(params.link_flags))
        .map_err(|e| ConfigError::new(ConfigStage::LinkMode, e))?;
    debug!("Applied link mode {:?}", params.link_flags);

    if let Some(policy) = params.channel_policy {
        transport
            .set_option(&SocketOption::ChannelPolicy(policy))
            .map_err(|e| ConfigError::new(ConfigStage::ChannelPolicy, e))?;
        debug!("Applied channel policy {}", policy);
    }

    if let Some(seconds) = params.linger_seconds {
        transport
            .set_option(&SocketOption::Linger(Some(seconds)))
            .map_err(|e| ConfigError::new(ConfigStage::Linger, e))?;
        debug!("Enabled linger for {}s", seconds);
    }

    if let Some(bytes) = params.receive_buffer_bytes.filter(|bytes| *bytes > 0) {
        transport
            .set_option(&SocketOption::ReceiveBuffer(bytes))
            .map_err(|e| ConfigError::new(ConfigStage::ReceiveBuffer, e))?;

        let granted = match transport
            .get_option(OptionKey::ReceiveBuffer)
            .map_err(|e| ConfigError::new(ConfigStage::ReceiveBuffer, e))?
        {
            SocketOption::ReceiveBuffer(granted) => granted,
            other => {
                return Err(ConfigError::new(
                    ConfigStage::ReceiveBuffer,
                    unexpected(OptionKey::ReceiveBuffer, other),
                ))
            }
        };
        debug!("Requested receive buffer {} bytes, granted {}", bytes, granted);
        negotiated.negotiated_receive_buffer_bytes = Some(granted);
    }

    Ok(negotiated)
}

/// Read `(inbound, outbound)` MTUs from a connected transport. LE sockets
/// reject `L2CAP_OPTIONS` once bound, so they are read one by one.
fn read_connected_mtus<T: Transport + ?Sized>(
    transport: &T,
    address_type: AddressType,
) -> io::Result<(u16, u16)> {
    if address_type.is_le() {
        Ok((
            get_u16(transport, OptionKey::ReceiveMtu)?,
            get_u16(transport, OptionKey::SendMtu)?,
        ))
    } else {
        get_legacy(transport).map(|opts| (opts.imtu, opts.omtu))
    }
}

/// Read back the MTUs in effect on a connected transport
pub fn apply_post_connect<T: Transport + ?Sized>(
    transport: &mut T,
    negotiated: &mut NegotiatedParameters,
    address_type: AddressType,
) -> Result<(), ConfigError> {
    let (inbound_mtu, outbound_mtu) = read_connected_mtus(&*transport, address_type)
        .map_err(|e| ConfigError::new(ConfigStage::PostConnect, e))?;

    debug!(
        "Connected MTU in={} out={} (requested in={} out={})",
        inbound_mtu, outbound_mtu, negotiated.inbound_mtu, negotiated.outbound_mtu
    );
    negotiated.inbound_mtu = inbound_mtu;
    negotiated.outbound_mtu = outbound_mtu;
    Ok(())
}
