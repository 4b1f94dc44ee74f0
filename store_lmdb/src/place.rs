//! LMDB implementation of PlaceStore.

use vouch_store::{PlaceRecord, PlaceStore, StoreError};
use vouch_types::PlaceId;

use crate::keys::{decode, encode};
use crate::{LmdbError, LmdbStore};

impl PlaceStore for LmdbStore {
    fn put_place(&self, place: &PlaceRecord) -> Result<(), StoreError> {
        let bytes = encode(place)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.dbs
            .places
            .put(&mut wtxn, place.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_place(&self, id: &PlaceId) -> Result<Option<PlaceRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let place = self
            .dbs
            .places
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .map(decode::<PlaceRecord>)
            .transpose()?;
        Ok(place)
    }

    fn list_places(&self) -> Result<Vec<PlaceRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut places = Vec::new();
        for entry in self.dbs.places.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            places.push(decode::<PlaceRecord>(val)?);
        }
        Ok(places)
    }
}
