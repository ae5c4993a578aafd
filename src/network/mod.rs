//! Network subsystem seam
//!
//! The engine never touches sockets itself. Outbound frames and receive
//! stream control go through a [`Transport`]; inbound payloads are handed to
//! [`HermesEngine::on_inbound_frame`](crate::engine::HermesEngine::on_inbound_frame)
//! by whoever owns the socket.

pub mod channel;

pub use channel::{ChannelTransport, OutboundPacket, PacketTally};

use crate::error::TransportError;

/// Outbound link to a Hermes/Metis board
///
/// Called from the network thread (transmit pairs) and from the control
/// thread (stream start/stop, initial register upload), so implementations
/// must be shareable.
pub trait Transport: Send + Sync {
    /// Write one 512-byte frame to `endpoint`
    fn send(&self, endpoint: u8, frame: &[u8]) -> Result<(), TransportError>;

    /// Ask the board to start or stop streaming receive frames
    fn set_receive_stream(&self, enabled: bool) -> Result<(), TransportError>;
}
