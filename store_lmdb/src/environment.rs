//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::{LmdbError, Migrator};

/// Number of named databases opened below.
const MAX_DBS: u32 = 10;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

#[derive(Clone, Copy)]
pub(crate) struct Databases {
    pub users: Database<Bytes, Bytes>,
    pub places: Database<Bytes, Bytes>,
    pub reviews: Database<Bytes, Bytes>,
    /// `place ++ created_at ++ seq ++ review` → empty
    pub place_reviews: Database<Bytes, Bytes>,
    /// `author ++ 0 ++ created_at ++ seq ++ review` → empty
    pub author_reviews: Database<Bytes, Bytes>,
    /// `author ++ 0 ++ submission key` → review id
    pub submissions: Database<Bytes, Bytes>,
    /// `review ++ voter` → vote
    pub votes: Database<Bytes, Bytes>,
    pub windows: Database<Bytes, Bytes>,
    pub meta: Database<Bytes, Bytes>,
}

/// The LMDB environment and every database handle. Implements all store traits.
#[derive(Clone)]
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    pub(crate) dbs: Databases,
}

impl std::fmt::Debug for LmdbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbStore").finish_non_exhaustive()
    }
}

impl LmdbStore {
    /// Open or create an environment in `path`, create missing databases,
    /// and bring the schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and the
        // directory is not shared with another opener of a different map size.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let dbs = Databases {
            users: env.create_database(&mut wtxn, Some("users"))?,
            places: env.create_database(&mut wtxn, Some("places"))?,
            reviews: env.create_database(&mut wtxn, Some("reviews"))?,
            place_reviews: env.create_database(&mut wtxn, Some("place_reviews"))?,
            author_reviews: env.create_database(&mut wtxn, Some("author_reviews"))?,
            submissions: env.create_database(&mut wtxn, Some("submissions"))?,
            votes: env.create_database(&mut wtxn, Some("votes"))?,
            windows: env.create_database(&mut wtxn, Some("rate_windows"))?,
            meta: env.create_database(&mut wtxn, Some("meta"))?,
        };
        wtxn.commit()?;

        let store = Self {
            env: Arc::new(env),
            dbs,
        };
        Migrator::run(&store)?;
        tracing::info!(path = %path.display(), map_size, "LMDB environment opened");
        Ok(store)
    }
}
