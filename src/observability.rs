use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use log::LevelFilter;

/// Receives counts of stored records a ranked query had to skip.
pub trait QueryObserver: Send + Sync {
    fn records_skipped(&self, operation: &'static str, count: u64);
}

#[derive(Default)]
pub struct SkipCounter {
    skipped: AtomicU64,
}

impl SkipCounter {
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

impl QueryObserver for SkipCounter {
    fn records_skipped(&self, operation: &'static str, count: u64) {
        let total = self.skipped.fetch_add(count, Ordering::Relaxed) + count;
        warn!(
            "{} skipped {} undecodable score record(s), {} since startup",
            operation, count, total
        );
    }
}

pub fn setup_logger(level: &str) -> anyhow::Result<()> {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // driver and server internals are only interesting when something is wrong
        .level_for("mongodb", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("rocket", LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_counter_accumulates() {
        let counter = SkipCounter::default();
        counter.records_skipped("query_top_n", 2);
        counter.records_skipped("query_top_n", 1);
        assert_eq!(counter.skipped(), 3);
    }
}
