//! Place storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use vouch_types::{Category, Coordinates, PlaceId};

/// A point of interest. Immutable once seeded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: PlaceId,
    pub name: String,
    /// Name in the local language, if different.
    pub name_local: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub category: Category,
    /// Identifier on an external map provider.
    pub external_map_id: Option<String>,
    pub address: Option<String>,
}

impl PlaceRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Trait for place storage operations.
pub trait PlaceStore {
    /// Insert or replace a place. Administrative seeding only.
    fn put_place(&self, place: &PlaceRecord) -> Result<(), StoreError>;

    fn get_place(&self, id: &PlaceId) -> Result<Option<PlaceRecord>, StoreError>;

    fn list_places(&self) -> Result<Vec<PlaceRecord>, StoreError>;
}
