//! Benchmarks for log fan-out.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use neuroflow::logging::{LineFormat, Logger, MemorySink, Severity, Sink, WriterSink};
use std::io;
use std::sync::Arc;

fn memory_logger(sinks: usize) -> Logger {
    Logger::new(
        (0..sinks)
            .map(|_| Arc::new(MemorySink::new()) as Arc<dyn Sink>)
            .collect(),
    )
}

fn fanout_benchmark(c: &mut Criterion) {
    c.bench_function("log_to_three_memory_sinks", |b| {
        let logger = memory_logger(3);
        b.iter(|| {
            logger.log(
                Severity::CommandOutput,
                Some("3dcalc"),
                black_box("++ Output dataset ./brain+orig.BRIK"),
            );
        });
    });

    c.bench_function("log_below_min_level", |b| {
        let logger = Logger::new(vec![
            Arc::new(MemorySink::with_min_level(Severity::Warn)) as Arc<dyn Sink>,
        ]);
        b.iter(|| logger.debug(black_box("pid is 4242")));
    });

    c.bench_function("render_plain_and_json", |b| {
        let logger = Logger::new(vec![
            Arc::new(WriterSink::new(io::sink(), LineFormat::Plain)) as Arc<dyn Sink>,
            Arc::new(WriterSink::new(io::sink(), LineFormat::Json)) as Arc<dyn Sink>,
        ]);
        b.iter(|| {
            logger.log(
                Severity::Command,
                Some("3dSkullStrip"),
                black_box("3dSkullStrip -input head.nii.gz"),
            );
        });
    });
}

criterion_group!(benches, fanout_benchmark);
criterion_main!(benches);
