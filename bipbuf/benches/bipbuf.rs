use std::hint::black_box;

use bipbuf::{channel, BipBuffer, WakeupStrategy};

fn main() {
    divan::main();
}

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

const BUFFER_SIZE: usize = 1024 * 1024;

#[divan::bench(args = [8, 64, 1024])]
fn bench_reserve_commit_read(bencher: divan::Bencher, record_size: usize) {
    let record = vec![0u8; record_size];
    let mut out = vec![0u8; record_size];
    let mut buf = BipBuffer::new(BUFFER_SIZE).unwrap();
    bencher.bench_local(move || {
        for _ in 0..1000 {
            let span = buf.reserve(record_size).unwrap();
            span.copy_from_slice(&record);
            black_box(buf.commit(record_size));
            black_box(buf.read(&mut out).unwrap());
        }
    });
}

#[divan::bench(args = [8, 64, 1024])]
fn bench_fill_then_drain(bencher: divan::Bencher, record_size: usize) {
    let record = vec![0u8; record_size];
    bencher
        .with_inputs(|| BipBuffer::new(BUFFER_SIZE).unwrap())
        .bench_local_values(|mut buf| {
            while let Some(span) = buf.reserve(record_size) {
                span.copy_from_slice(&record);
                buf.commit(record_size);
            }
            while let Some(record) = buf.next_record() {
                black_box(record.len());
            }
        });
}

#[divan::bench(
    args = [(64, WakeupStrategy::Forced), (64, WakeupStrategy::NoWakeup), (1024, WakeupStrategy::NoWakeup)]
)]
fn bench_channel_send(bencher: divan::Bencher, (record_size, wakeup): (usize, WakeupStrategy)) {
    let record = vec![0u8; record_size];
    bencher
        .with_inputs(|| channel(BipBuffer::new(BUFFER_SIZE).unwrap(), wakeup))
        .bench_local_values(|(writer, reader)| {
            let mut out = vec![0u8; record_size];
            for _ in 0..1000 {
                writer.send(&record).unwrap();
                black_box(reader.try_read(&mut out).unwrap());
            }
        });
}
