//! Weekly statistics of blocked attempts.

use chrono::{DateTime, Datelike as _, Days, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::BlockedAttemptNotice;
use crate::store::{read_plist, write_plist};

/// File holding the statistics.
pub const STATS_FILE: &str = "blocking_statistics.plist";

/// How long weekly buckets are kept.
const RETENTION_DAYS: u64 = 28;

/// One intercepted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub at: DateTime<Utc>,
    pub identifier: String,
}

/// Blocked attempts bucketed by the Monday starting each week (`YYYY-MM-DD`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingStats {
    #[serde(default)]
    pub total_blocks: u64,
    #[serde(default)]
    pub weekly_blocks: BTreeMap<String, u32>,
    #[serde(default)]
    pub weekly_attempts: BTreeMap<String, Vec<Attempt>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_blocked: Option<DateTime<Utc>>,
}

/// Monday of the local week containing `at`.
pub fn week_start(at: DateTime<Utc>) -> NaiveDate {
    let date = at.with_timezone(&Local).date_naive();
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

fn week_key(at: DateTime<Utc>) -> String {
    week_start(at).format("%Y-%m-%d").to_string()
}

impl BlockingStats {
    /// Record an attempt, returning the count for its week.
    pub fn record(&mut self, notice: &BlockedAttemptNotice) -> u32 {
        let key = week_key(notice.at);

        let count = self.weekly_blocks.entry(key.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        self.weekly_attempts.entry(key).or_default().push(Attempt {
            at: notice.at,
            identifier: notice.identifier.clone(),
        });
        self.total_blocks += 1;
        self.last_blocked = Some(notice.at);

        count
    }

    /// Attempts in the week containing `now`.
    pub fn week_blocks(&self, now: DateTime<Utc>) -> u32 {
        self.weekly_blocks.get(&week_key(now)).copied().unwrap_or(0)
    }

    /// Most blocked apps in the week containing `now`, most first.
    pub fn most_blocked(&self, now: DateTime<Utc>, limit: usize) -> Vec<(String, u32)> {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for attempt in self.weekly_attempts.get(&week_key(now)).into_iter().flatten() {
            *counts.entry(attempt.identifier.as_str()).or_default() += 1;
        }

        let mut ranked: Vec<(String, u32)> = counts
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Drop weeks that started more than four weeks before `now`.
    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let today = now.with_timezone(&Local).date_naive();
        let Some(cutoff) = today.checked_sub_days(Days::new(RETENTION_DAYS)) else {
            return;
        };
        let cutoff = cutoff.format("%Y-%m-%d").to_string();

        self.weekly_blocks.retain(|week, _| *week >= cutoff);
        self.weekly_attempts.retain(|week, _| *week >= cutoff);
    }
}

/// Shared, optionally persisted statistics.
pub struct StatsRecorder {
    path: Option<PathBuf>,
    stats: Mutex<BlockingStats>,
}

impl StatsRecorder {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            stats: Mutex::new(BlockingStats::default()),
        }
    }

    /// Open the statistics file in `dir`; unreadable files start empty.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let path = dir.into().join(STATS_FILE);
        let stats = load(&path).unwrap_or_default();
        Self {
            path: Some(path),
            stats: Mutex::new(stats),
        }
    }

    pub fn snapshot(&self) -> BlockingStats {
        let mut stats = self.lock();
        self.reload(&mut stats);
        stats.clone()
    }

    /// Record an attempt, returning this week's count.
    ///
    /// The file may have been rewritten by another process, so it is read
    /// again before the attempt is added.
    pub fn record(&self, notice: &BlockedAttemptNotice) -> u32 {
        let mut stats = self.lock();
        self.reload(&mut stats);
        let count = stats.record(notice);
        stats.cleanup(notice.at);
        self.persist(&stats);

        info!(app = %notice.identifier, weekly = count, "blocked attempt recorded");
        count
    }

    pub fn reset(&self) {
        let mut stats = self.lock();
        *stats = BlockingStats::default();
        self.persist(&stats);
        info!("blocking statistics reset");
    }

    /// Record every notice from `rx` until the channel closes.
    pub async fn drain(&self, mut rx: mpsc::UnboundedReceiver<BlockedAttemptNotice>) {
        while let Some(notice) = rx.recv().await {
            self.record(&notice);
        }
        debug!("blocked-attempt channel closed");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BlockingStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace `stats` with the file contents. A missing file means empty
    /// statistics; an unreadable one keeps what is in memory.
    fn reload(&self, stats: &mut BlockingStats) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(current) = load(path) {
            *stats = current;
        }
    }

    fn persist(&self, stats: &BlockingStats) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_plist(path, stats) {
            warn!(error = %e, "failed to save blocking statistics");
        }
    }
}

/// `None` when the file exists but cannot be read.
fn load(path: &Path) -> Option<BlockingStats> {
    match read_plist::<BlockingStats>(path) {
        Ok(stats) => Some(stats.unwrap_or_default()),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to load blocking statistics");
            None
        }
    }
}
