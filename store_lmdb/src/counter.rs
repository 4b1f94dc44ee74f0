//! LMDB implementation of CounterStore.
//!
//! One row per limiter key holding the count and the window's reset time.

use serde::{Deserialize, Serialize};
use vouch_store::{CounterStore, StoreError, WindowDecision};
use vouch_types::Timestamp;

use crate::keys::{decode, encode};
use crate::{LmdbError, LmdbStore};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct WindowRow {
    count: u32,
    reset_at: Timestamp,
}

impl CounterStore for LmdbStore {
    fn consume_window(
        &self,
        key: &str,
        max: u32,
        window_secs: u64,
        now: Timestamp,
    ) -> Result<WindowDecision, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = self
            .dbs
            .windows
            .get(&wtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .map(decode::<WindowRow>)
            .transpose()?;

        let mut row = match existing {
            Some(row) if row.reset_at > now => row,
            _ => WindowRow {
                count: 0,
                reset_at: now.plus(window_secs),
            },
        };

        if row.count >= max {
            return Ok(WindowDecision {
                allowed: false,
                remaining: 0,
            });
        }

        row.count += 1;
        let bytes = encode(&row)?;
        self.dbs
            .windows
            .put(&mut wtxn, key.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(WindowDecision {
            allowed: true,
            remaining: max - row.count,
        })
    }

    fn purge_expired_windows(&self, now: Timestamp) -> Result<usize, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut expired = Vec::new();
        for entry in self.dbs.windows.iter(&wtxn).map_err(LmdbError::from)? {
            let (key, val) = entry.map_err(LmdbError::from)?;
            let row: WindowRow = decode(val)?;
            if row.reset_at <= now {
                expired.push(key.to_vec());
            }
        }
        for key in &expired {
            self.dbs
                .windows
                .delete(&mut wtxn, key)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(expired.len())
    }
}
