//! In-process transport backed by a crossbeam channel
//!
//! Used by the bench harness and the integration tests in place of a
//! socket: every outbound frame is recorded as an [`OutboundPacket`].

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use super::Transport;
use crate::error::TransportError;
use crate::protocol::MOX_BIT;

/// One frame written to the radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPacket {
    pub endpoint: u8,
    pub payload: Bytes,
}

impl OutboundPacket {
    /// C0 of the frame, bank address plus MOX
    pub fn c0(&self) -> Option<u8> {
        self.payload.get(3).copied()
    }

    pub fn is_keyed(&self) -> bool {
        self.c0().is_some_and(|c0| c0 & MOX_BIT != 0)
    }
}

/// Packet counts from [`ChannelTransport::tally`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketTally {
    pub packets: u64,
    pub keyed: u64,
}

impl std::ops::AddAssign for PacketTally {
    fn add_assign(&mut self, other: Self) {
        self.packets += other.packets;
        self.keyed += other.keyed;
    }
}

pub struct ChannelTransport {
    tx: Sender<OutboundPacket>,
    rx: Receiver<OutboundPacket>,
    streaming: AtomicBool,
    closed: AtomicBool,
}

impl ChannelTransport {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            streaming: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Receiving side of the packet channel
    pub fn packets(&self) -> Receiver<OutboundPacket> {
        self.rx.clone()
    }

    /// Everything sent since the last drain
    pub fn drain(&self) -> Vec<OutboundPacket> {
        let mut packets = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(packet) => packets.push(packet),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        packets
    }

    /// Count and discard everything sent since the last drain
    pub fn tally(&self) -> PacketTally {
        let mut tally = PacketTally::default();
        while let Ok(packet) = self.rx.try_recv() {
            tally.packets += 1;
            tally.keyed += u64::from(packet.is_keyed());
        }
        tally
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Make every later call fail with [`TransportError::Closed`]
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ChannelTransport {
    fn send(&self, endpoint: u8, frame: &[u8]) -> Result<(), TransportError> {
        self.ensure_open()?;
        let packet = OutboundPacket { endpoint, payload: Bytes::copy_from_slice(frame) };
        self.tx.send(packet).map_err(|e| TransportError::SendFailed {
            endpoint,
            reason: e.to_string(),
        })
    }

    fn set_receive_stream(&self, enabled: bool) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.streaming.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}
