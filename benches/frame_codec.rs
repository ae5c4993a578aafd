use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use num_complex::Complex32;

use hermes_bridge::codec::{encode_tx_frame, RowDecoder};
use hermes_bridge::config::EngineConfig;
use hermes_bridge::network::ChannelTransport;
use hermes_bridge::protocol::{ControlBank, InboundFrame, RadioSettings, Receivers, SampleRate};
use hermes_bridge::sim::SyntheticRadio;
use hermes_bridge::HermesEngine;

fn decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for receivers in [Receivers::Single, Receivers::Dual] {
        let mut radio = SyntheticRadio::new(receivers, SampleRate::Hz192000);
        let bytes = radio.next_frame();
        let decoder = RowDecoder::new(receivers);
        let mut out = vec![0.0f32; 4];

        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(format!("rows_{}rx", receivers.count()), |b| {
            b.iter(|| {
                let frame = InboundFrame::parse(black_box(&bytes)).unwrap();
                for row in frame.rows(receivers) {
                    decoder.decode_row(row, false, &mut out);
                }
                black_box(&out);
            })
        });
    }

    group.finish();
}

fn encode(c: &mut Criterion) {
    let settings = RadioSettings::from_config(&EngineConfig::default());
    let samples: Vec<Complex32> =
        (0..63).map(|n| Complex32::from_polar(0.5, n as f32 * 0.1)).collect();
    let mut out = [0u8; 512];

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(samples.len() as u64));
    group.bench_function("tx_frame", |b| {
        b.iter(|| {
            black_box(encode_tx_frame(&mut out, ControlBank::TxFrequency, &settings, black_box(&samples)))
        })
    });
    group.finish();
}

fn engine(c: &mut Criterion) {
    let mut config = EngineConfig::default();
    config.radio.sample_rate = SampleRate::Hz192000;
    let transport = Arc::new(ChannelTransport::new());
    let engine = HermesEngine::new(&config, transport.clone()).unwrap();
    let mut radio = SyntheticRadio::new(Receivers::Single, SampleRate::Hz192000);
    let tone = vec![Complex32::new(0.1, -0.1); 63];

    c.bench_function("engine_round_trip", |b| {
        b.iter(|| {
            let bytes = radio.next_frame();
            black_box(engine.on_inbound_frame(&bytes));
            while let Some(buffer) = engine.pull_decoded_buffer() {
                engine.recycle(buffer);
            }
            engine.push_samples_to_encode(&tone);
            transport.drain();
        })
    });
}

criterion_group!(benches, decode, encode, engine);
criterion_main!(benches);
