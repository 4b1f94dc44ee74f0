//! Schema versioning for the LMDB environment.
//!
//! The meta table records the version that last wrote the environment. Opening
//! applies every step between that version and [`CURRENT_SCHEMA_VERSION`] in
//! order, then records the new version.

use vouch_store::MetaStore;

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// One upgrade step, applied to an environment at version `to - 1`.
struct Step {
    to: u32,
    name: &'static str,
    apply: fn(&dyn MetaStore) -> Result<(), LmdbError>,
}

/// Every table is created by `LmdbStore::open`, so v1 has no data to move.
const STEPS: &[Step] = &[Step {
    to: 1,
    name: "users, places, reviews, votes, rate windows",
    apply: |_| Ok(()),
}];

pub struct Migrator;

impl Migrator {
    /// Bring `meta` up to [`CURRENT_SCHEMA_VERSION`].
    ///
    /// Version 0 is a fresh environment. A newer stored version was written
    /// by a newer build and is refused.
    pub fn run(meta: &dyn MetaStore) -> Result<(), LmdbError> {
        let found = meta
            .get_schema_version()
            .map_err(|e| LmdbError::Heed(e.to_string()))?;
        if found > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if found == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = found, "schema is current");
            return Ok(());
        }

        for step in STEPS.iter().filter(|s| s.to > found) {
            tracing::info!(to = step.to, step = step.name, "applying schema step");
            (step.apply)(meta)?;
            meta.set_schema_version(step.to)
                .map_err(|e| LmdbError::Heed(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_end_at_current_version() {
        assert_eq!(STEPS.last().map(|s| s.to), Some(CURRENT_SCHEMA_VERSION));
        assert!(STEPS.windows(2).all(|w| w[1].to == w[0].to + 1));
    }
}
