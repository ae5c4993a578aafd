//! Hermes Bench Harness
//!
//! Drives the engine with a synthetic radio at wire rate, consumes the
//! decoded stream, feeds a transmit tone back in, and prints the final
//! diagnostics as JSON.
//!
//! ```text
//! hermes-sim [--config <path>] [--seconds <n>] [--faults]
//! ```

use anyhow::{bail, Context, Result};
use num_complex::Complex32;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hermes_bridge::{
    config::EngineConfig,
    constants::inbound_frames_per_second,
    diagnostics::DiagnosticsReport,
    network::{ChannelTransport, PacketTally},
    protocol::{StatusSnapshot, TX_SAMPLE_RATE},
    sim::{Signal, SyntheticRadio},
    HermesEngine,
};

/// Inject a sequence gap and a corrupt frame every this many frames
const FAULT_INTERVAL: u64 = 2_000;

struct Args {
    config: Option<PathBuf>,
    seconds: Option<u64>,
    faults: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args { config: None, seconds: None, faults: false };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--seconds" => {
                let value = iter.next().context("--seconds needs a value")?;
                args.seconds = Some(value.parse().context("--seconds must be an integer")?);
            }
            "--faults" => args.faults = true,
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(args)
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig> {
    if let Some(path) = path {
        return EngineConfig::load(&path)
            .with_context(|| format!("failed to load {}", path.display()));
    }

    match EngineConfig::default_path() {
        Some(path) if path.exists() => {
            tracing::info!("Using config {}", path.display());
            Ok(EngineConfig::load(&path)?)
        }
        _ => Ok(EngineConfig::default()),
    }
}

#[derive(Serialize)]
struct SimReport {
    elapsed_secs: f64,
    rx_buffers_pulled: u64,
    tx_samples_pushed: u64,
    tx_packets: u64,
    tx_packets_keyed: u64,
    diagnostics: DiagnosticsReport,
    status: StatusSnapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hermes bench harness");

    let args = parse_args()?;
    let config = load_config(args.config)?;

    let transport = Arc::new(ChannelTransport::new());
    let engine = Arc::new(HermesEngine::new(&config, transport.clone())?);

    let rate = config.radio.sample_rate;
    let receivers = config.radio.receivers;
    let frames_per_second =
        inbound_frames_per_second(rate.hz(), receivers.count() as u32).max(1);
    let frame_period = Duration::from_secs_f64(1.0 / f64::from(frames_per_second));
    tracing::info!(
        "Simulating {} receiver(s) at {} Hz, {} frames/s",
        receivers.count(),
        rate.hz(),
        frames_per_second
    );

    let radio_running = Arc::new(AtomicBool::new(true));
    let consumer_running = Arc::new(AtomicBool::new(true));
    let rx_buffers = Arc::new(AtomicU64::new(0));
    let tx_samples = Arc::new(AtomicU64::new(0));

    engine.start()?;
    let started = std::time::Instant::now();

    // Radio: paced inbound frames
    let radio_task = {
        let engine = engine.clone();
        let running = radio_running.clone();
        let faults = args.faults;
        tokio::spawn(async move {
            let mut radio = SyntheticRadio::new(receivers, rate)
                .with_signal(Signal::Tone { frequency: 1_500.0, amplitude: 0.25 });
            radio.set_power(900, 120);
            let mut interval = tokio::time::interval(frame_period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Burst);
            let mut frame = vec![0u8; hermes_bridge::protocol::INBOUND_FRAME_LEN];
            let mut count: u64 = 0;

            while running.load(Ordering::Relaxed) {
                interval.tick().await;
                count += 1;
                if faults && count % FAULT_INTERVAL == 0 {
                    radio.skip(2);
                    radio.corrupt_next((count / FAULT_INTERVAL % 2) as usize);
                }
                radio.fill_frame(&mut frame);
                engine.on_inbound_frame(&frame);
            }
        })
    };

    // Consumer: drain decoded buffers, keep the transmit pool topped up,
    // count outbound packets without keeping them
    let consumer_task = {
        let engine = engine.clone();
        let transport = transport.clone();
        let running = consumer_running.clone();
        let rx_buffers = rx_buffers.clone();
        let tx_samples = tx_samples.clone();
        tokio::spawn(async move {
            let step = std::f32::consts::TAU * 700.0 / TX_SAMPLE_RATE as f32;
            let mut phase = 0.0f32;
            let mut pending: Vec<Complex32> = Vec::with_capacity(63 * 16);
            let mut sent = PacketTally::default();

            while running.load(Ordering::Relaxed) {
                while let Some(buffer) = engine.pull_decoded_buffer() {
                    rx_buffers.fetch_add(1, Ordering::Relaxed);
                    engine.recycle(buffer);
                }

                while pending.len() < 63 * 16 {
                    pending.push(Complex32::from_polar(0.3, phase));
                    phase = (phase + step) % std::f32::consts::TAU;
                }
                let consumed = engine.push_samples_to_encode(&pending);
                pending.drain(..consumed);
                tx_samples.fetch_add(consumed as u64, Ordering::Relaxed);
                sent += transport.tally();

                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            sent
        })
    };

    tracing::info!("Running - press Ctrl+C to stop");
    match args.seconds {
        Some(seconds) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
        }
    }

    tracing::info!("Shutting down...");
    // Inbound side first, then the consumer
    engine.stop()?;
    radio_running.store(false, Ordering::Relaxed);
    radio_task.await?;
    consumer_running.store(false, Ordering::Relaxed);
    let mut sent = consumer_task.await?;
    sent += transport.tally();

    let report = SimReport {
        elapsed_secs: started.elapsed().as_secs_f64(),
        rx_buffers_pulled: rx_buffers.load(Ordering::Relaxed),
        tx_samples_pushed: tx_samples.load(Ordering::Relaxed),
        tx_packets: sent.packets,
        tx_packets_keyed: sent.keyed,
        diagnostics: engine.report_diagnostics(),
        status: engine.status(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
