//! Price sample persistence
//!
//! Line-delimited JSON, one file per venue, pair, and day, append-only so a
//! crash mid-window loses at most the current sample.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// One observed price point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSample {
    pub venue: String,
    pub base: String,
    pub quote: String,
    /// Quote units per base unit
    pub price: Decimal,
    pub sampled_at: DateTime<Utc>,
}

/// Appends samples under a data directory
pub struct SampleWriter {
    dir: PathBuf,
}

impl SampleWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, sample: &PriceSample) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}_{}.jsonl",
            sample.venue,
            sample.base,
            sample.quote,
            sample.sampled_at.format("%Y-%m-%d")
        ))
    }

    pub fn append(&self, sample: &PriceSample) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(sample))?;
        serde_json::to_writer(&mut file, sample)?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
