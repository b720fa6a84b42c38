//! Coordinates, movement throttling and "latest request wins" bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Moves shorter than this are not worth a refresh.
pub const MIN_MOVE_METERS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

/// Drops location updates that barely moved from the last accepted one.
#[derive(Debug, Default)]
pub struct LocationFilter {
    last: Mutex<Option<Coordinates>>,
}

impl LocationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and remembers `coords` if it is far enough from the
    /// last accepted location.
    pub fn accept(&self, coords: Coordinates) -> bool {
        let mut last = self.last.lock();
        match *last {
            Some(prev) if prev.distance_to(&coords) < MIN_MOVE_METERS => false,
            _ => {
                *last = Some(coords);
                true
            }
        }
    }

    pub fn last(&self) -> Option<Coordinates> {
        *self.last.lock()
    }
}

/// Hands out increasing tickets; only the newest ticket is current.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}
