//! Core library for WearWeather.
//!
//! This crate defines:
//! - The weather/outfit data model and the outfit decision engine
//! - Deterministic weather scenarios for development and offline fallback
//! - A TTL cache, a scenario override store and the widget snapshot
//! - Best-effort storage shared between the app and its companion display
//! - The refresh session driving all of the above
//!
//! It is used by `wearweather-cli`, but can also be embedded by other front ends.

pub mod cache;
pub mod companion;
pub mod config;
pub mod geocode;
pub mod location;
pub mod model;
pub mod overrides;
pub mod provider;
pub mod scenario;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod stylist;

pub use cache::{CachePayload, WeatherCache};
pub use companion::{Companion, SnapshotSource, WidgetEntry};
pub use config::{Config, LocationConfig, ProcessRole, ProviderConfig, SharingConfig};
pub use geocode::{FixedPlaceName, PlaceNameResolver};
pub use location::Coordinates;
pub use model::{
    ClothingOutfit, Condition, DailyForecastItem, HourlyForecastItem, WeatherPackage,
    WeatherReading,
};
pub use overrides::OverrideStore;
pub use provider::{ProviderId, WeatherProvider};
pub use scenario::Scenario;
pub use session::{RefreshError, RefreshOutcome, SessionEvent, SessionState, WeatherSession};
pub use snapshot::{WidgetSnapshot, project};
pub use storage::{GroupStore, StorageKind, StoreLocations};
pub use stylist::Stylist;
