use clap::Parser;
use eyre::{ensure, Result, WrapErr};
use pump::config::{Config, Wakeup};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

static LONG_VERSION: OnceLock<String> = OnceLock::new();

fn get_long_version() -> &'static str {
    LONG_VERSION.get_or_init(|| {
        format!(
            "{} (commit: {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_REVISION", "unknown"),
        )
    })
}

#[derive(Parser, Debug)]
#[command(name = "bipbuf-pump")]
#[command(about = "pump framed records through a bipbuf between two threads")]
#[command(version = None, long_version = get_long_version())]
struct Args {
    #[arg(help = "configuration file path (toml format)")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "number of records to send")]
    records: Option<u64>,

    #[arg(short = 's', long, help = "payload bytes per record")]
    record_size: Option<usize>,

    #[arg(short, long, help = "buffer capacity in bytes")]
    capacity: Option<usize>,

    #[arg(long, help = "records per second")]
    rate: Option<u32>,

    #[arg(short, long, help = "forced or no-wakeup")]
    wakeup_strategy: Option<Wakeup>,

    #[arg(
        short,
        long,
        value_parser = humantime::parse_duration,
        help = "stop producing after this long (e.g. 10s, 5m)"
    )]
    duration: Option<Duration>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(records) = self.records {
            config.producer.records = records;
        }
        if let Some(record_size) = self.record_size {
            config.producer.record_size = record_size;
        }
        if let Some(capacity) = self.capacity {
            config.buffer.capacity = capacity;
        }
        if let Some(rate) = self.rate {
            config.producer.rate = Some(rate);
        }
        if let Some(wakeup_strategy) = self.wakeup_strategy {
            config.producer.wakeup_strategy = wakeup_strategy;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .wrap_err_with(|| format!("failed to load config path={}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(?args, "pump arguments");

    let summary = pump::run(&config, args.duration)?;
    println!("{}", serde_json::to_string(&summary)?);

    ensure!(
        summary.is_clean(),
        "records lost or reordered: sent={} received={} order_violations={} corrupt={}",
        summary.sent,
        summary.received,
        summary.order_violations,
        summary.corrupt
    );
    Ok(())
}
