//! Single-slot weather cache with a fixed time-to-live.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    location::{Coordinates, MIN_MOVE_METERS},
    model::{ClothingOutfit, DailyForecastItem, WeatherReading},
    storage::GroupStore,
};

/// Bump the suffix whenever [`CachePayload`] changes incompatibly; old entries
/// then simply stop being found.
pub const CACHE_KEY: &str = "core-cache-v4";

pub const CACHE_TTL_SECS: i64 = 15 * 60;

/// Everything needed to repaint the primary surface without a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachePayload {
    pub saved_at: DateTime<Utc>,
    pub location_name: String,
    /// Where the reading was fetched for.
    pub coordinates: Coordinates,
    pub weather: WeatherReading,
    pub outfit: ClothingOutfit,
    #[serde(default)]
    pub daily: Vec<DailyForecastItem>,
    #[serde(default)]
    pub is_bad_air: bool,
}

impl CachePayload {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.saved_at <= ttl()
    }

    /// Whether this reading can stand in for weather at `coords`.
    pub fn covers(&self, coords: &Coordinates) -> bool {
        self.coordinates.distance_to(coords) < MIN_MOVE_METERS
    }
}

pub fn ttl() -> Duration {
    Duration::seconds(CACHE_TTL_SECS)
}

#[derive(Debug, Clone)]
pub struct WeatherCache {
    store: GroupStore,
}

impl WeatherCache {
    pub fn new(store: GroupStore) -> Self {
        Self { store }
    }

    /// The cached payload if it is still within the TTL at `now`.
    pub fn read(&self, now: DateTime<Utc>) -> Option<CachePayload> {
        self.read_even_if_stale().filter(|payload| payload.is_fresh(now))
    }

    /// Like [`read`](Self::read), but only for a reading taken near `coords`.
    pub fn read_near(&self, now: DateTime<Utc>, coords: &Coordinates) -> Option<CachePayload> {
        self.read(now).filter(|payload| payload.covers(coords))
    }

    /// The cached payload regardless of age. Expired entries are kept for this.
    pub fn read_even_if_stale(&self) -> Option<CachePayload> {
        self.store.load(CACHE_KEY)
    }

    pub fn write(&self, payload: &CachePayload) {
        self.store.save(payload, CACHE_KEY);
    }
}
