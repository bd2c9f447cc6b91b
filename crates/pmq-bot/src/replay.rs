//! Replayed market data and simulated time.
//!
//! The replay loop owns the clock: it advances simulated time to each
//! snapshot's timestamp and fires any alerts that came due.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use pmq_core::BookSnapshot;
use pmq_engine::{Clock, ClockError, MarketDataSource};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Read book snapshots from a JSON Lines file.
///
/// Blank lines and lines starting with `#` are skipped. Snapshots without a
/// timestamp are spaced `step_ms` after the previous one.
pub fn load_books(path: impl AsRef<Path>, step_ms: u64) -> AppResult<Vec<BookSnapshot>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Replay(format!("Failed to read book file {}: {e}", path.display()))
    })?;

    let mut books = Vec::new();
    let mut last_ts = 0u64;
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut book = BookSnapshot::from_json_line(line)
            .map_err(|e| AppError::Replay(format!("line {}: {e}", idx + 1)))?;
        if book.ts_ms == 0 {
            book.ts_ms = last_ts + step_ms;
        }
        if book.ts_ms < last_ts {
            return Err(AppError::Replay(format!(
                "line {}: timestamp {} goes backwards (previous {})",
                idx + 1,
                book.ts_ms,
                last_ts
            )));
        }
        last_ts = book.ts_ms;
        books.push(book);
    }
    Ok(books)
}

/// Latest replayed book, served to the pulse timer.
#[derive(Debug, Default)]
pub struct ReplayFeed {
    current: Mutex<Option<BookSnapshot>>,
}

impl ReplayFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, book: BookSnapshot) {
        *self.current.lock() = Some(book);
    }
}

impl MarketDataSource for ReplayFeed {
    fn book(&self) -> Option<BookSnapshot> {
        self.current.lock().clone()
    }
}

/// Simulated clock with named one-shot alerts.
///
/// Re-arming an alert under the same name replaces the pending one.
#[derive(Debug, Default)]
pub struct ReplayClock {
    now_ms: AtomicU64,
    alerts: Mutex<BTreeMap<String, u64>>,
}

impl ReplayClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
            alerts: Mutex::new(BTreeMap::new()),
        }
    }

    /// Move time forward. Earlier timestamps are ignored.
    pub fn advance_to(&self, ts_ms: u64) {
        self.now_ms.fetch_max(ts_ms, Ordering::SeqCst);
    }

    /// Remove and return alerts due at or before the current time, earliest first.
    pub fn take_due(&self) -> Vec<String> {
        let now = self.now_ms.load(Ordering::SeqCst);
        let mut alerts = self.alerts.lock();
        let mut due: Vec<(u64, String)> = alerts
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(name, at)| (*at, name.clone()))
            .collect();
        due.sort();
        for (_, name) in &due {
            alerts.remove(name);
        }
        due.into_iter().map(|(_, name)| name).collect()
    }

    pub fn pending(&self) -> usize {
        self.alerts.lock().len()
    }
}

impl Clock for ReplayClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn set_time_alert(&self, name: &str, alert_at_ms: u64) -> Result<(), ClockError> {
        let now = self.now_ms();
        if alert_at_ms < now {
            return Err(ClockError::AlertRejected {
                name: name.to_string(),
                reason: format!("alert time {alert_at_ms} is before now {now}"),
            });
        }
        debug!(timer = name, alert_at_ms, "Alert armed");
        self.alerts.lock().insert(name.to_string(), alert_at_ms);
        Ok(())
    }
}
