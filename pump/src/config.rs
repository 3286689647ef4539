use bipbuf::WakeupStrategy;
use eyre::{ensure, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bytes every pumped record starts with: sequence number and timestamp.
pub const RECORD_PREFIX: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub producer: ProducerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub header: HeaderWidth,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderWidth {
    #[default]
    U16,
    U32,
}

impl HeaderWidth {
    pub fn bytes(&self) -> usize {
        match self {
            HeaderWidth::U16 => 2,
            HeaderWidth::U32 => 4,
        }
    }

    pub fn max_len(&self) -> usize {
        match self {
            HeaderWidth::U16 => u16::MAX as usize,
            HeaderWidth::U32 => u32::MAX as usize,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerConfig {
    #[serde(default = "default_records")]
    pub records: u64,
    #[serde(default = "default_record_size")]
    pub record_size: usize,
    /// Records per second. Unlimited when unset.
    #[serde(default)]
    pub rate: Option<u32>,
    #[serde(default)]
    pub wakeup_strategy: Wakeup,
    /// With `no-wakeup`, notify the reader after this many records.
    #[serde(default = "default_notify_interval")]
    pub notify_interval: u64,
    /// Drop a record instead of retrying when the buffer is full.
    #[serde(default)]
    pub drop_when_full: bool,
    #[serde(default = "default_backoff_us")]
    pub backoff_us: u64,
    #[serde(default = "default_print_interval")]
    pub print_interval: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Wakeup {
    #[default]
    Forced,
    NoWakeup,
}

impl From<Wakeup> for WakeupStrategy {
    fn from(wakeup: Wakeup) -> Self {
        match wakeup {
            Wakeup::Forced => WakeupStrategy::Forced,
            Wakeup::NoWakeup => WakeupStrategy::NoWakeup,
        }
    }
}

impl std::str::FromStr for Wakeup {
    type Err = String;

    fn from_str(strategy: &str) -> Result<Self, Self::Err> {
        match strategy.to_lowercase().as_str() {
            "forced" => Ok(Wakeup::Forced),
            "no-wakeup" | "nowakeup" => Ok(Wakeup::NoWakeup),
            _ => Err(format!(
                "Invalid wakeup strategy: {}. Valid options: forced, no-wakeup",
                strategy
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_filter: default_log_filter(),
            buffer: BufferConfig::default(),
            producer: ProducerConfig::default(),
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            capacity: default_capacity(),
            header: HeaderWidth::default(),
        }
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        ProducerConfig {
            records: default_records(),
            record_size: default_record_size(),
            rate: None,
            wakeup_strategy: Wakeup::default(),
            notify_interval: default_notify_interval(),
            drop_when_full: false,
            backoff_us: default_backoff_us(),
            print_interval: default_print_interval(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_capacity() -> usize {
    1 << 20
}

fn default_records() -> u64 {
    100_000
}

fn default_record_size() -> usize {
    64
}

fn default_notify_interval() -> u64 {
    64
}

fn default_backoff_us() -> u64 {
    50
}

fn default_print_interval() -> u64 {
    10_000
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Checks that a pumped record fits both the header range and the store.
    pub fn validate(&self) -> eyre::Result<()> {
        let producer = &self.producer;
        let buffer = &self.buffer;

        ensure!(
            producer.record_size >= RECORD_PREFIX,
            "record_size must be at least {} bytes, got {}",
            RECORD_PREFIX,
            producer.record_size
        );
        ensure!(
            producer.record_size <= buffer.header.max_len(),
            "record_size {} exceeds {:?} header range",
            producer.record_size,
            buffer.header
        );
        ensure!(
            producer.record_size + buffer.header.bytes() <= buffer.capacity,
            "record_size {} plus header does not fit capacity {}",
            producer.record_size,
            buffer.capacity
        );
        ensure!(producer.notify_interval > 0, "notify_interval must be positive");
        if let Some(rate) = producer.rate {
            ensure!(rate > 0, "rate must be positive");
        }
        Ok(())
    }

    pub fn to_toml(&self) -> eyre::Result<String> {
        toml::to_string(self).wrap_err("failed to serialize config")
    }
}
