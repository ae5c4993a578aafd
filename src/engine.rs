//! Hermes frame engine
//!
//! Sits between the network thread and the stream consumer:
//!
//! ```text
//!  network thread                               consumer thread
//!  ──────────────                               ───────────────
//!  on_inbound_frame ─► SequenceTracker
//!        │          ─► TxScheduler ─► TxPool ─► Transport (2 × 512 bytes)
//!        │                              ▲
//!        ▼                              └────── push_samples_to_encode
//!  InboundFrame ─► StatusSnapshot
//!        │
//!        └───────► RowDecoder ─► RxPool ───────► pull_decoded_buffer
//! ```
//!
//! The network path may block on the pool locks. The consumer path never
//! does: if a lock is busy it reports "nothing available" and retries on
//! its next call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;
use num_complex::Complex32;
use parking_lot::{Mutex, RwLock};

use crate::buffer::rx::recycle_into;
use crate::buffer::{RxBuffer, RxPool, TxPool};
use crate::codec::{encode_tx_frame, RowDecoder};
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostics, DiagnosticsReport};
use crate::error::{ConfigError, FrameError, Result};
use crate::network::Transport;
use crate::protocol::control::build_control_registers;
use crate::protocol::frame::{hex_dump, sequence_number};
use crate::protocol::{
    BankCycler, ControlBank, InboundFrame, RadioSettings, SequenceTracker, StatusSnapshot,
    SUBFRAME_LEN, TX_ENDPOINT, TX_SAMPLES_PER_FRAME,
};
use crate::ptt::PttMode;
use crate::scheduler::TxScheduler;

/// Status updates between verbose telemetry lines
const TELEMETRY_INTERVAL_MASK: u64 = 0x1ff;

/// Banks uploaded, each preceded by bank 0, before the stream starts
const INITIAL_BANKS: [ControlBank; 3] =
    [ControlBank::TxFrequency, ControlBank::Rx0Frequency, ControlBank::Rx1Frequency];

/// What happened to an inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Every row reached the receive pool
    Decoded { rows: usize },
    /// The receive pool filled up after `rows` rows; the rest was discarded
    Dropped { rows: usize },
    /// Failed validation, nothing was decoded
    Corrupt(FrameError),
}

/// Result of handing one inbound payload to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    /// Transport sequence number, absent for payloads shorter than the header
    pub sequence: Option<u32>,
    /// The scheduler granted a transmit opportunity on this frame
    pub tx_opportunity: bool,
    /// A transmit pair was written to the transport
    pub tx_sent: bool,
    pub disposition: Disposition,
}

struct TxState {
    pool: TxPool,
    cycler: BankCycler,
}

/// Shared Hermes protocol state
///
/// Built once per radio and shared behind an `Arc` between the thread that
/// owns the socket and the thread that produces and consumes samples.
pub struct HermesEngine {
    settings: RwLock<RadioSettings>,
    rx: Mutex<RxPool>,
    spares: Arc<ArrayQueue<Vec<f32>>>,
    rx_buffer_len: usize,
    tx: Mutex<TxState>,
    sequence: Mutex<SequenceTracker>,
    status: Mutex<StatusSnapshot>,
    scheduler: TxScheduler,
    decoder: RowDecoder,
    transport: Arc<dyn Transport>,
    diagnostics: Diagnostics,
    tx_enabled: AtomicBool,
    verbose: bool,
}

impl HermesEngine {
    /// Validate `config`, allocate the pools and upload the initial registers
    ///
    /// The receive stream is switched off first; call [`start`](Self::start)
    /// to begin streaming.
    pub fn new(config: &EngineConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let settings = RadioSettings::from_config(config);
        let rx = RxPool::new(config.buffers.rx_pool_size, config.buffers.rx_buffer_len)?;
        let mut tx = TxPool::new(config.buffers.tx_pool_size)?;

        transport.set_receive_stream(false)?;

        let mut frame = [0u8; SUBFRAME_LEN];
        for bank in INITIAL_BANKS {
            build_control_registers(ControlBank::Config, &settings, &mut frame);
            transport.send(TX_ENDPOINT, &frame)?;
            build_control_registers(bank, &settings, &mut frame);
            transport.send(TX_ENDPOINT, &frame)?;
        }

        // first transmit frame carries bank 0 and no samples
        build_control_registers(ControlBank::Config, &settings, tx.current_mut());

        tracing::info!(
            "Hermes engine ready: {} receiver(s) at {} Hz, rx pool {} x {}, tx pool {}",
            settings.receivers.count(),
            settings.sample_rate.hz(),
            rx.capacity(),
            rx.buffer_len(),
            tx.capacity()
        );

        Ok(Self {
            scheduler: TxScheduler::new(settings.sample_rate, settings.receivers),
            decoder: RowDecoder::new(settings.receivers),
            spares: rx.spares(),
            rx_buffer_len: rx.buffer_len(),
            settings: RwLock::new(settings),
            rx: Mutex::new(rx),
            tx: Mutex::new(TxState { pool: tx, cycler: BankCycler::new() }),
            sequence: Mutex::new(SequenceTracker::new()),
            status: Mutex::new(StatusSnapshot::default()),
            transport,
            diagnostics: Diagnostics::new(),
            tx_enabled: AtomicBool::new(true),
            verbose: config.verbose,
        })
    }

    /// Allow transmit frames and turn the receive stream on
    pub fn start(&self) -> Result<()> {
        self.tx_enabled.store(true, Ordering::SeqCst);
        self.transport.set_receive_stream(true)?;
        tracing::info!("Hermes receive stream started");
        Ok(())
    }

    /// Turn the receive stream off and stop sending transmit frames
    pub fn stop(&self) -> Result<()> {
        let result = self.transport.set_receive_stream(false);
        self.tx_enabled.store(false, Ordering::SeqCst);
        result?;
        tracing::info!("Hermes receive stream stopped");
        Ok(())
    }

    pub fn is_transmit_enabled(&self) -> bool {
        self.tx_enabled.load(Ordering::SeqCst)
    }

    /// Process one payload received from the radio
    ///
    /// Sequence accounting and transmit scheduling happen for every payload
    /// carrying a transport header, whether or not its content is valid.
    pub fn on_inbound_frame(&self, bytes: &[u8]) -> FrameOutcome {
        let Some(sequence) = sequence_number(bytes) else {
            self.diagnostics.record_corrupt();
            tracing::debug!("Discarding {}-byte payload without transport header", bytes.len());
            return FrameOutcome {
                sequence: None,
                tx_opportunity: false,
                tx_sent: false,
                disposition: Disposition::Corrupt(FrameError::BadLength(bytes.len())),
            };
        };

        let lost = self.sequence.lock().observe(sequence);
        if lost > 0 {
            tracing::debug!("Sequence jumped to {}, {} frame(s) lost", sequence, lost);
            self.diagnostics.record_lost_ethernet(lost);
        }

        let count = self.diagnostics.record_rx_frame();
        let tx_opportunity = self.scheduler.should_transmit(count);
        let tx_sent = tx_opportunity && self.send_tx_pair();

        let disposition = match InboundFrame::parse(bytes) {
            Ok(frame) => {
                self.update_status(&frame);
                self.decode_rows(&frame)
            }
            Err(e) => {
                self.diagnostics.record_corrupt();
                tracing::debug!("Discarding inbound frame {}: {}", sequence, e);
                tracing::trace!("{}", hex_dump(bytes));
                Disposition::Corrupt(e)
            }
        };

        FrameOutcome { sequence: Some(sequence), tx_opportunity, tx_sent, disposition }
    }

    /// Oldest decoded buffer, if one is complete and the pool is free
    pub fn pull_decoded_buffer(&self) -> Option<RxBuffer> {
        self.rx.try_lock()?.pop()
    }

    /// Give a pulled buffer's storage back for reuse
    pub fn recycle(&self, buffer: RxBuffer) {
        recycle_into(&self.spares, self.rx_buffer_len, buffer);
    }

    /// Encode `samples` into transmit frames, 63 per frame
    ///
    /// Returns the number of samples consumed. Stops at the first frame
    /// that cannot get a transmit buffer; returns 0 without blocking if the
    /// settings or the transmit pool are busy.
    pub fn push_samples_to_encode(&self, samples: &[Complex32]) -> usize {
        let Some(settings) = self.settings.try_read().map(|s| *s) else {
            return 0;
        };
        let Some(mut tx) = self.tx.try_lock() else {
            return 0;
        };
        let TxState { pool, cycler } = &mut *tx;

        let mut consumed = 0;
        for chunk in samples.chunks(TX_SAMPLES_PER_FRAME) {
            let Some(slot) = pool.acquire_next() else {
                tracing::debug!("Transmit pool full, {} sample(s) left", samples.len() - consumed);
                break;
            };
            let encoded = encode_tx_frame(slot, cycler.advance(), &settings, chunk);
            consumed += encoded.samples;
        }
        consumed
    }

    pub fn report_diagnostics(&self) -> DiagnosticsReport {
        self.diagnostics.snapshot()
    }

    /// Latest device telemetry
    pub fn status(&self) -> StatusSnapshot {
        *self.status.lock()
    }

    pub fn settings(&self) -> RadioSettings {
        *self.settings.read()
    }

    /// Last accepted transport sequence number
    pub fn current_sequence(&self) -> u32 {
        self.sequence.lock().current()
    }

    /// Completed receive buffers waiting to be pulled
    pub fn rx_ready(&self) -> usize {
        self.rx.lock().ready()
    }

    /// Encoded transmit frames not yet sent
    pub fn tx_ready(&self) -> usize {
        self.tx.lock().pool.ready()
    }

    pub fn set_rx_frequency(&self, receiver: usize, hz: u32) -> std::result::Result<(), ConfigError> {
        let mut settings = self.settings.write();
        let slot = settings
            .rx_frequencies
            .get_mut(receiver)
            .ok_or(ConfigError::ReceiverIndex(receiver))?;
        *slot = hz;
        Ok(())
    }

    pub fn set_tx_frequency(&self, hz: u32) {
        self.settings.write().tx_frequency = hz;
    }

    pub fn set_tx_drive(&self, level: u8) {
        self.settings.write().tx_drive = level;
    }

    pub fn set_ptt_mode(&self, mode: PttMode) {
        self.settings.write().ptt.mode = mode;
        tracing::info!("PTT mode {:?}", mode);
    }

    /// Input attenuation in dB, 0..=31
    pub fn set_attenuator(&self, db: u8) -> std::result::Result<(), ConfigError> {
        if db > 31 {
            return Err(ConfigError::Attenuator(db));
        }
        self.settings.write().attenuator = db;
        Ok(())
    }

    pub fn set_preamp(&self, enabled: bool) {
        self.settings.write().preamp = enabled;
    }

    pub fn set_dither(&self, enabled: bool) {
        self.settings.write().dither = enabled;
    }

    pub fn set_random(&self, enabled: bool) {
        self.settings.write().random = enabled;
    }

    /// Drain one transmit pair if at least two frames are ready
    fn send_tx_pair(&self) -> bool {
        if !self.is_transmit_enabled() {
            return false;
        }

        self.diagnostics.record_tx_opportunity();
        let Some(pair) = self.tx.lock().pool.take_pair() else {
            self.diagnostics.record_lost_tx();
            return false;
        };

        let mut sent = true;
        for frame in pair {
            match self.transport.send(TX_ENDPOINT, &frame) {
                Ok(()) => self.diagnostics.record_frame_sent(),
                Err(e) => {
                    self.diagnostics.record_send_failure();
                    tracing::warn!("Failed to send transmit frame: {}", e);
                    sent = false;
                }
            }
        }
        sent
    }

    fn update_status(&self, frame: &InboundFrame<'_>) {
        let mut status = self.status.lock();
        for subframe in 0..2 {
            status.apply(&frame.control_block(subframe));
            if self.verbose && status.updates & TELEMETRY_INTERVAL_MASK == TELEMETRY_INTERVAL_MASK {
                status.log_telemetry();
            }
        }
    }

    fn decode_rows(&self, frame: &InboundFrame<'_>) -> Disposition {
        let muted = self.settings.read().ptt.mutes_rx();
        let floats = self.decoder.floats_per_row();
        let mut pool = self.rx.lock();

        let mut rows = 0;
        for row in frame.rows(self.decoder.receivers()) {
            match pool.acquire_next() {
                Ok(dest) => {
                    self.decoder.decode_row(row, muted, dest);
                    pool.commit(floats);
                    rows += 1;
                }
                Err(_) => {
                    self.diagnostics.record_lost_rx();
                    tracing::debug!("Receive pool full, dropping frame after {} row(s)", rows);
                    return Disposition::Dropped { rows };
                }
            }
        }
        Disposition::Decoded { rows }
    }
}

impl Drop for HermesEngine {
    fn drop(&mut self) {
        if let Err(e) = self.transport.set_receive_stream(false) {
            tracing::warn!("Failed to stop receive stream: {}", e);
        }
        tracing::info!("{}", self.diagnostics.snapshot());
    }
}
