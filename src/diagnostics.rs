//! Loss and throughput counters
//!
//! Every runtime fault in the data path ends up here. The counters are
//! reported once at teardown, and on demand through
//! [`HermesEngine::report_diagnostics`](crate::engine::HermesEngine::report_diagnostics).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct Diagnostics {
    lost_rx: AtomicU64,
    total_rx: AtomicU64,
    lost_tx: AtomicU64,
    total_tx: AtomicU64,
    corrupt_rx: AtomicU64,
    lost_ethernet: AtomicU64,
    frames_sent: AtomicU64,
    send_failures: AtomicU64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inbound frame that found the receive pool full
    pub fn record_lost_rx(&self) {
        self.lost_rx.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an inbound frame, returning its 0-based index
    pub fn record_rx_frame(&self) -> u64 {
        self.total_rx.fetch_add(1, Ordering::Relaxed)
    }

    /// Transmit opportunity with fewer than two frames ready
    pub fn record_lost_tx(&self) {
        self.lost_tx.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tx_opportunity(&self) {
        self.total_tx.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corrupt(&self) {
        self.corrupt_rx.fetch_add(1, Ordering::Relaxed);
    }

    /// Add a gap in the inbound sequence numbers
    pub fn record_lost_ethernet(&self, frames: u64) {
        if frames > 0 {
            self.lost_ethernet.fetch_add(frames, Ordering::Relaxed);
        }
    }

    pub fn record_frame_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_rx(&self) -> u64 {
        self.total_rx.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> DiagnosticsReport {
        DiagnosticsReport {
            lost_rx: self.lost_rx.load(Ordering::Relaxed),
            total_rx: self.total_rx.load(Ordering::Relaxed),
            lost_tx: self.lost_tx.load(Ordering::Relaxed),
            total_tx: self.total_tx.load(Ordering::Relaxed),
            corrupt_rx: self.corrupt_rx.load(Ordering::Relaxed),
            lost_ethernet: self.lost_ethernet.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticsReport {
    pub lost_rx: u64,
    pub total_rx: u64,
    pub lost_tx: u64,
    pub total_tx: u64,
    pub corrupt_rx: u64,
    pub lost_ethernet: u64,
    pub frames_sent: u64,
    pub send_failures: u64,
}

impl DiagnosticsReport {
    /// Whether any loss, corruption or send failure was recorded
    pub fn is_clean(&self) -> bool {
        self.lost_rx == 0
            && self.lost_tx == 0
            && self.corrupt_rx == 0
            && self.lost_ethernet == 0
            && self.send_failures == 0
    }
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LostRxBufCount = {}  TotalRxBufCount = {}  LostTxBufCount = {}  \
             TotalTxBufCount = {}  CorruptRxCount = {}  LostEthernetRx = {}  \
             TxFramesSent = {}  SendFailures = {}",
            self.lost_rx,
            self.total_rx,
            self.lost_tx,
            self.total_tx,
            self.corrupt_rx,
            self.lost_ethernet,
            self.frames_sent,
            self.send_failures,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let diag = Diagnostics::new();
        assert_eq!(diag.record_rx_frame(), 0);
        assert_eq!(diag.record_rx_frame(), 1);
        diag.record_lost_ethernet(0);
        diag.record_lost_ethernet(3);
        diag.record_corrupt();
        diag.record_tx_opportunity();
        diag.record_lost_tx();

        let report = diag.snapshot();
        assert_eq!(report.total_rx, 2);
        assert_eq!(report.lost_ethernet, 3);
        assert_eq!(report.corrupt_rx, 1);
        assert_eq!(report.total_tx, 1);
        assert_eq!(report.lost_tx, 1);
        assert!(!report.is_clean());
        assert!(DiagnosticsReport::default().is_clean());
    }

    #[test]
    fn test_report_formats() {
        let report = DiagnosticsReport { lost_rx: 1, total_rx: 40, corrupt_rx: 2, ..Default::default() };
        let line = report.to_string();
        assert!(line.starts_with("LostRxBufCount = 1  TotalRxBufCount = 40"));
        assert!(line.contains("CorruptRxCount = 2"));

        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["total_rx"], 40);
        assert_eq!(json["send_failures"], 0);
    }
}
