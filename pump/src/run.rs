use crate::config::{Config, HeaderWidth, ProducerConfig, RECORD_PREFIX};
use bipbuf::{channel, BipBufError, BipBuffer, FrameHeader, Reader, WakeupStrategy, Writer};
use eyre::{eyre, Result, WrapErr};
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one pump run, printed as a single JSON line.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub sent: u64,
    pub dropped: u64,
    pub full_retries: u64,
    pub received: u64,
    pub order_violations: u64,
    pub corrupt: u64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
    pub elapsed_ms: u64,
}

impl Summary {
    /// Every sent record arrived intact and in order.
    pub fn is_clean(&self) -> bool {
        self.order_violations == 0 && self.corrupt == 0 && self.received == self.sent
    }
}

#[derive(Debug, Default)]
struct ProducerStats {
    sent: u64,
    dropped: u64,
    full_retries: u64,
}

struct ConsumerStats {
    received: u64,
    order_violations: u64,
    corrupt: u64,
    histogram: Histogram<u64>,
}

/// Pumps `config.producer.records` records through a fresh buffer from a
/// producer thread to a consumer thread. Production stops early once
/// `duration` has elapsed.
pub fn run(config: &Config, duration: Option<Duration>) -> Result<Summary> {
    config.validate()?;
    match config.buffer.header {
        HeaderWidth::U16 => run_with::<u16>(config, duration),
        HeaderWidth::U32 => run_with::<u32>(config, duration),
    }
}

fn run_with<H: FrameHeader>(config: &Config, duration: Option<Duration>) -> Result<Summary> {
    let buffer = BipBuffer::<H>::with_header(config.buffer.capacity)
        .wrap_err("failed to allocate buffer")?;
    let wakeup_strategy: WakeupStrategy = config.producer.wakeup_strategy.into();
    let (writer, reader) = channel(buffer, wakeup_strategy);

    info!(
        capacity = config.buffer.capacity,
        header_width = H::WIDTH,
        records = config.producer.records,
        record_size = config.producer.record_size,
        wakeup_strategy = ?wakeup_strategy,
        "starting pump"
    );

    let start = Instant::now();
    let deadline = duration.map(|duration| start + duration);

    let producer_config = config.producer.clone();
    let producer = thread::Builder::new()
        .name("pump-producer".to_string())
        .spawn(move || produce(writer, &producer_config, start, deadline))
        .wrap_err("failed to spawn producer thread")?;

    let record_size = config.producer.record_size;
    let consumer = thread::Builder::new()
        .name("pump-consumer".to_string())
        .spawn(move || consume(reader, record_size, start))
        .wrap_err("failed to spawn consumer thread")?;

    let produced = producer
        .join()
        .map_err(|_| eyre!("producer thread panicked"))??;
    let consumed = consumer
        .join()
        .map_err(|_| eyre!("consumer thread panicked"))??;

    let summary = Summary {
        sent: produced.sent,
        dropped: produced.dropped,
        full_retries: produced.full_retries,
        received: consumed.received,
        order_violations: consumed.order_violations,
        corrupt: consumed.corrupt,
        p50_us: consumed.histogram.value_at_quantile(0.50),
        p99_us: consumed.histogram.value_at_quantile(0.99),
        max_us: consumed.histogram.max(),
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        sent = summary.sent,
        received = summary.received,
        dropped = summary.dropped,
        full_retries = summary.full_retries,
        p50_us = summary.p50_us,
        p99_us = summary.p99_us,
        elapsed_ms = summary.elapsed_ms,
        "pump finished"
    );
    Ok(summary)
}

fn produce<H: FrameHeader>(
    writer: Writer<H>,
    config: &ProducerConfig,
    start: Instant,
    deadline: Option<Instant>,
) -> Result<ProducerStats> {
    let rate_limiter = config
        .rate
        .and_then(NonZeroU32::new)
        .map(|rate| RateLimiter::direct(Quota::per_second(rate)));
    let backoff = Duration::from_micros(config.backoff_us);
    let no_wakeup = writer.wakeup_strategy() == WakeupStrategy::NoWakeup;
    let mut stats = ProducerStats::default();

    for sequence in 0..config.records {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            info!(sequence = sequence, "duration elapsed, stopping producer");
            break;
        }

        if let Some(rate_limiter) = &rate_limiter {
            while rate_limiter.check().is_err() {
                thread::sleep(Duration::from_micros(100));
            }
        }

        loop {
            let timestamp = start.elapsed().as_nanos() as u64;
            match writer.write_with(config.record_size, |span| {
                encode_record(span, sequence, timestamp)
            }) {
                Ok(_) => {
                    stats.sent += 1;
                    break;
                }
                Err(BipBufError::InsufficientSpace { needed, available }) => {
                    // A reader that is never woken would never make room.
                    if no_wakeup {
                        writer.notify();
                    }
                    if config.drop_when_full {
                        writer.increment_dropped();
                        stats.dropped += 1;
                        debug!(sequence = sequence, needed = needed, available = available, "buffer full, record dropped");
                        break;
                    }
                    stats.full_retries += 1;
                    debug!(sequence = sequence, needed = needed, available = available, "buffer full, retrying");
                    thread::sleep(backoff);
                }
                Err(e) => {
                    return Err(e)
                        .wrap_err_with(|| format!("failed to write record sequence={}", sequence));
                }
            }
        }

        if no_wakeup && (sequence + 1) % config.notify_interval == 0 {
            writer.notify();
        }

        if (sequence + 1) % config.print_interval == 0 {
            info!(
                sent = stats.sent,
                dropped = stats.dropped,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "progress update"
            );
        }
    }

    Ok(stats)
}

fn consume<H: FrameHeader>(
    reader: Reader<H>,
    record_size: usize,
    start: Instant,
) -> Result<ConsumerStats> {
    let mut stats = ConsumerStats {
        received: 0,
        order_violations: 0,
        corrupt: 0,
        histogram: Histogram::<u64>::new(3).wrap_err("failed to create histogram")?,
    };
    let mut out = vec![0u8; record_size];
    let mut previous: Option<u64> = None;

    while let Some(n) = reader.read_blocking(&mut out)? {
        stats.received += 1;

        let Some((sequence, timestamp)) = decode_record(&out[..n], record_size) else {
            stats.corrupt += 1;
            warn!(len = n, "corrupt record");
            continue;
        };

        if previous.is_some_and(|previous| sequence <= previous) {
            stats.order_violations += 1;
            warn!(sequence = sequence, previous = ?previous, "record out of order");
        }
        previous = Some(sequence);

        let now = start.elapsed().as_nanos() as u64;
        stats
            .histogram
            .saturating_record(now.saturating_sub(timestamp) / 1_000);
    }

    debug!(received = stats.received, dropped = reader.dropped(), "consumer drained");
    Ok(stats)
}

/// Fills `span` with `[sequence | timestamp | filler]` and returns its length.
fn encode_record(span: &mut [u8], sequence: u64, timestamp: u64) -> usize {
    span[..8].copy_from_slice(&sequence.to_le_bytes());
    span[8..RECORD_PREFIX].copy_from_slice(&timestamp.to_le_bytes());
    span[RECORD_PREFIX..].fill(sequence as u8);
    span.len()
}

fn decode_record(data: &[u8], record_size: usize) -> Option<(u64, u64)> {
    if data.len() != record_size {
        return None;
    }
    let sequence = u64::from_le_bytes(data[..8].try_into().ok()?);
    let timestamp = u64::from_le_bytes(data[8..RECORD_PREFIX].try_into().ok()?);
    let filler = sequence as u8;
    data[RECORD_PREFIX..]
        .iter()
        .all(|&byte| byte == filler)
        .then_some((sequence, timestamp))
}
