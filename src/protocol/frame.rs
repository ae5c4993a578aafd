//! Inbound frame parsing and sequence accounting

use crate::error::FrameError;
use crate::protocol::{
    Receivers, CONTROL_BLOCK_LEN, INBOUND_FRAME_LEN, SEQUENCE_OFFSET, SUBFRAME_LEN, SYNC,
    TRANSPORT_HEADER_LEN,
};

/// C0..C4 of one inbound sub-frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlBlock {
    pub c0: u8,
    pub c1: u8,
    pub c2: u8,
    pub c3: u8,
    pub c4: u8,
}

/// A validated inbound payload borrowed from the transport's buffer
#[derive(Debug)]
pub struct InboundFrame<'a> {
    sequence: u32,
    subframes: [&'a [u8]; 2],
}

/// Read the sequence number from a transport header, if present
pub fn sequence_number(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(SEQUENCE_OFFSET..SEQUENCE_OFFSET + 4)?;
    Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

impl<'a> InboundFrame<'a> {
    /// Validate length and both sync patterns
    ///
    /// Both sub-frames are checked before anything is returned, so a frame
    /// with one bad sub-frame yields no partial content.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FrameError> {
        if bytes.len() != INBOUND_FRAME_LEN {
            return Err(FrameError::BadLength(bytes.len()));
        }

        let body = &bytes[TRANSPORT_HEADER_LEN..];
        let (first, second) = body.split_at(SUBFRAME_LEN);
        let subframes = [first, second];

        for (index, sub) in subframes.iter().enumerate() {
            let sync = [sub[0], sub[1], sub[2]];
            if sync != [SYNC; 3] {
                return Err(FrameError::SyncMismatch { subframe: index, bytes: sync });
            }
        }

        Ok(Self {
            sequence: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            subframes,
        })
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Status/control block of sub-frame 0 or 1
    pub fn control_block(&self, subframe: usize) -> ControlBlock {
        let s = self.subframes[subframe];
        ControlBlock { c0: s[3], c1: s[4], c2: s[5], c3: s[6], c4: s[7] }
    }

    /// Sample rows of both sub-frames in wire order
    pub fn rows(&self, receivers: Receivers) -> impl Iterator<Item = &'a [u8]> + 'a {
        let row_len = receivers.row_len();
        let count = receivers.rows_per_subframe();
        let subframes = self.subframes;
        subframes.into_iter().flat_map(move |sub| {
            sub[CONTROL_BLOCK_LEN..CONTROL_BLOCK_LEN + count * row_len].chunks_exact(row_len)
        })
    }
}

/// Tracks the device sequence number and counts skipped frames
#[derive(Debug, Default)]
pub struct SequenceTracker {
    current: u32,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a sequence number, returning the loss to account for it
    ///
    /// A forward jump counts the full difference. Repeats, reordering and
    /// device restarts leave the tracker untouched.
    pub fn observe(&mut self, sequence: u32) -> u64 {
        let next = self.current.wrapping_add(1);
        if sequence > next {
            let lost = u64::from(sequence.wrapping_sub(self.current));
            self.current = sequence;
            lost
        } else {
            if sequence == next {
                self.current = next;
            }
            0
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }
}

/// Hex dump of the header and first rows of each sub-frame
pub fn hex_dump(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let header = &bytes[..bytes.len().min(TRANSPORT_HEADER_LEN)];
    let _ = write!(out, "0x000:: {:02X?}", header);

    for base in [TRANSPORT_HEADER_LEN, TRANSPORT_HEADER_LEN + SUBFRAME_LEN] {
        if let Some(head) = bytes.get(base..(base + 78).min(bytes.len())) {
            let _ = write!(out, " | 0x{:03X}:: {:02X?}", base, head);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame(sequence: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; INBOUND_FRAME_LEN];
        bytes[..4].copy_from_slice(&[0xEF, 0xFE, 0x01, 0x06]);
        bytes[4..8].copy_from_slice(&sequence.to_be_bytes());
        for base in [8, 520] {
            bytes[base..base + 3].copy_from_slice(&[SYNC; 3]);
        }
        bytes
    }

    #[test]
    fn test_parse_valid_frame() {
        let mut bytes = blank_frame(0x0102_0304);
        bytes[8 + 3] = 0x08;
        bytes[520 + 7] = 0x2A;

        let frame = InboundFrame::parse(&bytes).unwrap();
        assert_eq!(frame.sequence(), 0x0102_0304);
        assert_eq!(frame.control_block(0).c0, 0x08);
        assert_eq!(frame.control_block(1).c4, 0x2A);
        assert_eq!(sequence_number(&bytes), Some(0x0102_0304));
    }

    #[test]
    fn test_parse_rejects_bad_sync() {
        let mut bytes = blank_frame(1);
        bytes[520 + 1] = 0x7e;
        assert_eq!(
            InboundFrame::parse(&bytes).unwrap_err(),
            FrameError::SyncMismatch { subframe: 1, bytes: [0x7f, 0x7e, 0x7f] }
        );

        let mut bytes = blank_frame(1);
        bytes[8] = 0;
        assert!(matches!(
            InboundFrame::parse(&bytes),
            Err(FrameError::SyncMismatch { subframe: 0, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert_eq!(InboundFrame::parse(&[0u8; 100]).unwrap_err(), FrameError::BadLength(100));
        assert_eq!(sequence_number(&[0u8; 6]), None);
    }

    #[test]
    fn test_row_iteration() {
        let mut bytes = blank_frame(0);
        bytes[8 + 8] = 0xAA; // first row of sub-frame 0
        bytes[520 + 8] = 0xBB; // first row of sub-frame 1
        let frame = InboundFrame::parse(&bytes).unwrap();

        let rows: Vec<&[u8]> = frame.rows(Receivers::Single).collect();
        assert_eq!(rows.len(), 126);
        assert!(rows.iter().all(|r| r.len() == 8));
        assert_eq!(rows[0][0], 0xAA);
        assert_eq!(rows[63][0], 0xBB);

        let rows: Vec<&[u8]> = frame.rows(Receivers::Dual).collect();
        assert_eq!(rows.len(), 72);
        assert!(rows.iter().all(|r| r.len() == 14));
        assert_eq!(rows[36][0], 0xBB);
    }

    #[test]
    fn test_sequence_gaps() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.observe(0), 0);
        assert_eq!(tracker.observe(1), 0);
        assert_eq!(tracker.observe(2), 0);
        assert_eq!(tracker.observe(7), 5);
        assert_eq!(tracker.current(), 7);
        assert_eq!(tracker.observe(8), 0);
        // duplicates and stale numbers are ignored
        assert_eq!(tracker.observe(8), 0);
        assert_eq!(tracker.observe(3), 0);
        assert_eq!(tracker.current(), 8);
    }

    #[test]
    fn test_hex_dump_short_input() {
        let dump = hex_dump(&[0xEF, 0xFE]);
        assert_eq!(dump, "0x000:: [EF, FE]");
    }
}
