//! Per-user daily quota accounting
//!
//! The quota window is the UTC calendar day. Counters live in the backing
//! store and are reset lazily the first time a user shows up on a new day.

use chrono::Utc;
use lumina_foundation::{BackingStore, Error, QuotaRecord, QuotaStatus, Result};
use std::sync::Arc;
use tracing::debug;

/// Tracks and enforces per-user daily usage
#[derive(Clone)]
pub struct QuotaTracker {
    store: Arc<dyn BackingStore>,
    limit: u64,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn BackingStore>, limit: u64) -> Self {
        Self { store, limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Today's UTC calendar date as an ISO date string
    fn today() -> String {
        Utc::now().format("%Y-%m-%d").to_string()
    }

    /// Reset the user's counter if the day has rolled over.
    ///
    /// A missing record is implicitly `{usage: 0, lastReset: today}` and
    /// needs no write; the record is created lazily by the first increment.
    /// The reset is written back before any other quota logic runs.
    pub async fn ensure_fresh_window(&self, user_id: &str) -> Result<()> {
        let today = Self::today();

        match self.store.quota_get(user_id).await? {
            Some(record) if record.last_reset != today => {
                debug!(user_id, last_reset = %record.last_reset, "resetting quota window");
                self.store
                    .quota_put(&QuotaRecord {
                        user_id: user_id.to_string(),
                        daily_usage: 0,
                        last_reset: today,
                    })
                    .await
            }
            _ => Ok(()),
        }
    }

    /// Reject with `QuotaExceeded` once the day's usage reaches the limit.
    ///
    /// This is the enforcement checkpoint: after the cache check, before
    /// any generation. The default configured limit is high enough to be
    /// effectively disabled.
    pub async fn check(&self, user_id: &str) -> Result<()> {
        let status = self.read(user_id).await?;
        if status.usage >= self.limit {
            return Err(Error::QuotaExceeded {
                usage: status.usage,
                limit: self.limit,
            });
        }
        Ok(())
    }

    /// Add one to the user's counter, returning the new usage.
    ///
    /// This is a read-modify-write with no isolation: two concurrent
    /// requests from the same user may both read `usage = k` and both write
    /// `k + 1`, undercounting by one. Accepted behavior; the fix would be a
    /// single atomic increment-with-upsert in the backing store (see
    /// DESIGN.md), not a change here.
    pub async fn increment(&self, user_id: &str) -> Result<u64> {
        let existing = self.store.quota_get(user_id).await?;

        let (usage, last_reset) = match existing {
            Some(record) => (record.daily_usage, record.last_reset),
            None => (0, Self::today()),
        };

        let new_usage = usage + 1;
        self.store
            .quota_put(&QuotaRecord {
                user_id: user_id.to_string(),
                daily_usage: new_usage,
                last_reset,
            })
            .await?;

        Ok(new_usage)
    }

    /// Current usage and the configured limit
    pub async fn read(&self, user_id: &str) -> Result<QuotaStatus> {
        let usage = self
            .store
            .quota_get(user_id)
            .await?
            .map(|record| record.daily_usage)
            .unwrap_or(0);

        Ok(QuotaStatus {
            usage,
            limit: self.limit,
        })
    }
}
