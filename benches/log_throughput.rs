//! Benchmarks for packet log writing and reading
//!
//! Measures record encoding, buffered appends with metadata injection, and decoding a
//! finished log back into packets.
//!
//! Platform: Cross-platform (writes into a temporary directory)

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use pktlog::config::{MetaPacketLogWriterConfig, PacketLogWriterConfig};
use pktlog::log::format::LogRecord;
use pktlog::test_utils::{command_packet, sample_registry, telemetry_packet};
use pktlog::types::LogType;
use pktlog::{MetaPacketLogWriter, PacketLogReader, PacketLogWriter};
use std::hint::black_box;
use std::sync::Arc;
use std::time::SystemTime;

const PACKETS_PER_LOG: usize = 1_000;

fn bench_record_encoding(c: &mut Criterion) {
    let registry = sample_registry();
    let mut adcs = telemetry_packet(&registry, "INST", "ADCS");
    adcs.set_received_time(Some(SystemTime::now()));
    let abort = command_packet(&registry, "INST", "ABORT");

    let mut group = c.benchmark_group("record_encoding");
    group.throughput(Throughput::Elements(1));

    group.bench_function("telemetry", |b| {
        b.iter(|| {
            let record = LogRecord::from_packet(black_box(&adcs), LogType::Tlm)
                .and_then(|record| record.encode())
                .expect("record encodes");
            black_box(record)
        })
    });

    group.bench_function("command", |b| {
        b.iter(|| {
            let record = LogRecord::from_packet(black_box(&abort), LogType::Cmd)
                .and_then(|record| record.encode())
                .expect("record encodes");
            black_box(record)
        })
    });

    group.finish();
}

fn bench_log_writing(c: &mut Criterion) {
    let registry = Arc::new(sample_registry());
    let adcs = telemetry_packet(&registry, "INST", "ADCS");
    let dir = tempfile::tempdir().expect("temporary directory");

    let mut group = c.benchmark_group("log_writing");
    group.throughput(Throughput::Elements(PACKETS_PER_LOG as u64));

    group.bench_function("plain_writer", |b| {
        b.iter(|| {
            let config = PacketLogWriterConfig::new(dir.path());
            let mut writer = PacketLogWriter::new(LogType::Tlm, config, Arc::clone(&registry))
                .expect("writer opens");
            for _ in 0..PACKETS_PER_LOG {
                writer.write(black_box(&adcs)).expect("packet written");
            }
            writer.stop().expect("log closes");
        })
    });

    group.bench_function("meta_before_every_write", |b| {
        b.iter(|| {
            let config = MetaPacketLogWriterConfig::new(
                LogType::Tlm,
                "META",
                "DATA",
                PacketLogWriterConfig::new(dir.path()),
            )
            .with_log_meta_before_write(true);
            let mut writer =
                MetaPacketLogWriter::new(config, Arc::clone(&registry)).expect("writer opens");
            for _ in 0..PACKETS_PER_LOG {
                writer.write(black_box(&adcs)).expect("packet written");
            }
            writer.stop().expect("log closes");
        })
    });

    group.finish();
}

fn bench_log_reading(c: &mut Criterion) {
    let registry = Arc::new(sample_registry());
    let dir = tempfile::tempdir().expect("temporary directory");

    let mut writer = PacketLogWriter::new(
        LogType::Tlm,
        PacketLogWriterConfig::new(dir.path()),
        Arc::clone(&registry),
    )
    .expect("writer opens");
    for name in ["ADCS", "HEALTH_STATUS"].iter().cycle().take(PACKETS_PER_LOG) {
        writer.write(&telemetry_packet(&registry, "INST", name)).expect("packet written");
    }
    writer.stop().expect("log closes");
    let path = writer.filename().expect("log written").to_path_buf();

    let mut group = c.benchmark_group("log_reading");
    group.throughput(Throughput::Elements(PACKETS_PER_LOG as u64));

    group.bench_function("decode_all", |b| {
        let reader = PacketLogReader::new(Arc::clone(&registry));
        b.iter(|| {
            let packets = reader.read_all(black_box(&path)).expect("log decodes");
            black_box(packets.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_record_encoding, bench_log_writing, bench_log_reading);
criterion_main!(benches);
