//! Primary-process refresh flow.
//!
//! [`WeatherSession`] is the single owner of the displayed state. Triggers
//! (cold start, manual refresh, location updates) go through it; renderers
//! read [`WeatherSession::state`] or subscribe to [`SessionEvent`]s.

use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};

use crate::{
    cache::{CachePayload, WeatherCache},
    config::LocationConfig,
    geocode::PlaceNameResolver,
    location::{Coordinates, LocationFilter, Sequencer},
    model::{ClothingOutfit, DailyForecastItem, HourlyForecastItem, WeatherPackage, WeatherReading},
    provider::WeatherProvider,
    scenario::hourly_forecast,
    snapshot::{SNAPSHOT_KEY, WidgetSnapshot, project_at},
    storage::GroupStore,
    stylist::Stylist,
};

const EVENT_CAPACITY: usize = 16;

/// Everything a renderer of the primary surface needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub location_name: String,
    pub weather: Option<WeatherReading>,
    pub outfit: ClothingOutfit,
    pub daily: Vec<DailyForecastItem>,
    pub hourly: Vec<HourlyForecastItem>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl SessionState {
    fn empty(placeholder_name: &str) -> Self {
        Self {
            location_name: placeholder_name.to_string(),
            weather: None,
            outfit: ClothingOutfit::default(),
            daily: Vec::new(),
            hourly: Vec::new(),
            is_loading: false,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(SessionState),
    SnapshotPublished(WidgetSnapshot),
}

/// How a refresh was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New data from the provider.
    Fresh,
    /// The cache was still valid; no fetch happened.
    Cached,
    /// The provider failed and the last valid cache entry was shown instead.
    CacheFallback,
    /// A newer refresh started while this one was waiting; result dropped.
    Superseded,
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("Failed to fetch weather: {0:#}")]
    Provider(anyhow::Error),
}

#[derive(Debug)]
pub struct WeatherSession {
    provider: Box<dyn WeatherProvider>,
    resolver: Box<dyn PlaceNameResolver>,
    stylist: Stylist,
    cache: WeatherCache,
    shared: GroupStore,
    default_location: Coordinates,
    placeholder_name: String,
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    refreshes: Sequencer,
    lookups: Sequencer,
    filter: LocationFilter,
}

impl WeatherSession {
    /// Build a session, showing a still-valid cache entry right away.
    ///
    /// `cache` should sit on process-local storage; `shared` is where the
    /// widget snapshot is published.
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        resolver: Box<dyn PlaceNameResolver>,
        cache: WeatherCache,
        shared: GroupStore,
        location: &LocationConfig,
    ) -> Self {
        let now = Local::now();
        let mut state = SessionState::empty(&location.placeholder_name);
        if let Some(payload) = cache.read(now.with_timezone(&Utc)) {
            tracing::info!("Restored cached weather from {}", payload.saved_at);
            fill_from_cache(&mut state, payload, &now);
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            provider,
            resolver,
            stylist: Stylist::new(),
            cache,
            shared,
            default_location: location.coordinates(),
            placeholder_name: location.placeholder_name.clone(),
            state: RwLock::new(state),
            events,
            refreshes: Sequencer::new(),
            lookups: Sequencer::new(),
            filter: LocationFilter::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Refresh at the last accepted location, ignoring the cache.
    pub async fn manual_refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        self.refresh(self.filter.last(), true).await
    }

    /// Fetch (unless `force` is false and the cache is still valid),
    /// recommend, cache and publish.
    pub async fn refresh(
        &self,
        location: Option<Coordinates>,
        force: bool,
    ) -> Result<RefreshOutcome, RefreshError> {
        let now = Local::now();
        let now_utc = now.with_timezone(&Utc);
        let coords = location.unwrap_or(self.default_location);

        if !force && self.cache.read_near(now_utc, &coords).is_some() {
            self.repaint_hourly(&now);
            return Ok(RefreshOutcome::Cached);
        }

        let ticket = self.refreshes.next();
        let stale = self.cache.read_even_if_stale();
        self.update(|state| {
            state.is_loading = true;
            state.error_message = None;
            // Give the hourly strip something to show while we wait.
            if let (None, Some(payload)) = (&state.weather, &stale) {
                state.hourly = hourly_forecast(&payload.weather, &now);
            }
        });

        let result = self
            .provider
            .fetch_weather_package(coords.latitude, coords.longitude)
            .await;

        if !self.refreshes.is_current(ticket) {
            tracing::debug!("Dropping result of superseded refresh #{}", ticket);
            return Ok(RefreshOutcome::Superseded);
        }

        match result {
            Ok(package) => {
                self.apply_package(package, coords, &Local::now());
                Ok(RefreshOutcome::Fresh)
            }
            Err(e) => {
                tracing::warn!("Weather provider failed: {:#}", e);
                let now = Local::now();
                match self.cache.read(now.with_timezone(&Utc)) {
                    Some(payload) => {
                        self.update(|state| {
                            fill_from_cache(state, payload, &now);
                            state.is_loading = false;
                        });
                        Ok(RefreshOutcome::CacheFallback)
                    }
                    None => {
                        let err = RefreshError::Provider(e);
                        let message = err.to_string();
                        self.update(|state| {
                            state.is_loading = false;
                            state.error_message = Some(message);
                        });
                        Err(err)
                    }
                }
            }
        }
    }

    /// React to a location update. Returns `None` if the move was too small
    /// to matter.
    pub async fn handle_location(
        &self,
        coords: Coordinates,
    ) -> Option<Result<RefreshOutcome, RefreshError>> {
        if !self.filter.accept(coords) {
            tracing::debug!("Ignoring location update within threshold");
            return None;
        }

        let ((), outcome) = tokio::join!(
            self.update_location_name(coords),
            self.refresh(Some(coords), false),
        );
        Some(outcome)
    }

    /// Consume location updates until the sender goes away.
    pub async fn follow(&self, mut updates: mpsc::Receiver<Coordinates>) {
        while let Some(coords) = updates.recv().await {
            if let Some(Err(e)) = self.handle_location(coords).await {
                tracing::warn!("{}", e);
            }
        }
    }

    /// Resolve a display name for `coords`. Failures keep the current name.
    pub async fn update_location_name(&self, coords: Coordinates) {
        let ticket = self.lookups.next();
        let result = self.resolver.resolve(coords).await;

        if !self.lookups.is_current(ticket) {
            return;
        }

        match result {
            Ok(name) => {
                let state = self.update(|state| state.location_name = name);
                self.rename_persisted(&state, &coords);
            }
            Err(e) => {
                tracing::debug!("Reverse geocoding failed: {:#}", e);
                let placeholder = self.placeholder_name.clone();
                self.update(|state| {
                    if state.location_name.is_empty() {
                        state.location_name = placeholder;
                    }
                });
            }
        }
    }

    fn apply_package(&self, package: WeatherPackage, coords: Coordinates, now: &DateTime<Local>) {
        let WeatherPackage { current, daily } = package;
        let outfit = self.stylist.recommend_for(&current);
        let hourly = hourly_forecast(&current, now);

        let state = self.update(|state| {
            state.weather = Some(current);
            state.outfit = outfit;
            state.daily = daily;
            state.hourly = hourly;
            state.is_loading = false;
            state.error_message = None;
        });

        if let Some(weather) = &state.weather {
            self.cache.write(&CachePayload {
                saved_at: now.with_timezone(&Utc),
                location_name: state.location_name.clone(),
                coordinates: coords,
                weather: weather.clone(),
                outfit: state.outfit.clone(),
                daily: state.daily.clone(),
                is_bad_air: weather.is_bad_air(),
            });
            self.publish_snapshot(&state.location_name, weather, &state.outfit);
            tracing::info!(
                "Refreshed: {} {} in {}",
                weather.temperature_text(),
                weather.condition,
                state.location_name
            );
        }
    }

    /// Keep the cached entry and the published snapshot in step with a new
    /// place name, without extending the cache lifetime. A reading taken
    /// somewhere else keeps its label; the refresh for `coords` replaces it.
    fn rename_persisted(&self, state: &SessionState, coords: &Coordinates) {
        let Some(mut payload) = self.cache.read_even_if_stale() else {
            return;
        };
        if !payload.covers(coords) {
            tracing::debug!("Cached reading is for another place; not relabelling");
            return;
        }

        payload.location_name = state.location_name.clone();
        self.cache.write(&payload);
        self.publish_snapshot(&payload.location_name, &payload.weather, &payload.outfit);
    }

    fn publish_snapshot(
        &self,
        location_name: &str,
        weather: &WeatherReading,
        outfit: &ClothingOutfit,
    ) {
        let snapshot = project_at(location_name, weather, outfit, Utc::now());
        self.shared.save(&snapshot, SNAPSHOT_KEY);
        let _ = self.events.send(SessionEvent::SnapshotPublished(snapshot));
    }

    fn repaint_hourly(&self, now: &DateTime<Local>) {
        let fallback = self.cache.read_even_if_stale().map(|p| p.weather);
        self.update(|state| {
            if let Some(weather) = state.weather.as_ref().or(fallback.as_ref()) {
                state.hourly = hourly_forecast(weather, now);
            }
        });
    }

    /// Mutate state, notify subscribers, and return the new state.
    fn update(&self, f: impl FnOnce(&mut SessionState)) -> SessionState {
        let snapshot = {
            let mut state = self.state.write();
            f(&mut state);
            state.clone()
        };
        let _ = self.events.send(SessionEvent::StateChanged(snapshot.clone()));
        snapshot
    }
}

fn fill_from_cache(state: &mut SessionState, payload: CachePayload, now: &DateTime<Local>) {
    state.hourly = hourly_forecast(&payload.weather, now);
    state.location_name = payload.location_name;
    state.weather = Some(payload.weather);
    state.outfit = payload.outfit;
    state.daily = payload.daily;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Duration;
    use tokio::sync::Notify;

    use crate::{
        geocode::FixedPlaceName,
        model::{Condition, items},
        overrides::OverrideStore,
        provider::mock::MockWeatherProvider,
        scenario::{Scenario, weather_package},
    };

    /// Serves a fixed scenario, or fails, and counts calls.
    #[derive(Debug, Clone)]
    struct ScriptedProvider {
        scenario: Option<Scenario>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedProvider {
        fn serving(scenario: Scenario) -> Self {
            Self { scenario: Some(scenario), calls: Arc::default() }
        }

        fn failing() -> Self {
            Self { scenario: None, calls: Arc::default() }
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn fetch_weather_package(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> anyhow::Result<WeatherPackage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.scenario {
                Some(s) => Ok(weather_package(s, &Local::now())),
                None => Err(anyhow!("connection refused")),
            }
        }
    }

    /// First call parks until released; later calls answer immediately.
    #[derive(Debug, Clone, Default)]
    struct GatedProvider {
        calls: Arc<AtomicUsize>,
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl WeatherProvider for GatedProvider {
        async fn fetch_weather_package(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> anyhow::Result<WeatherPackage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                self.started.notify_one();
                self.release.notified().await;
                Ok(weather_package(Scenario::Snowy, &Local::now()))
            } else {
                Ok(weather_package(Scenario::WarmClear, &Local::now()))
            }
        }
    }

    #[derive(Debug)]
    struct FailingResolver;

    #[async_trait]
    impl PlaceNameResolver for FailingResolver {
        async fn resolve(&self, _coords: Coordinates) -> anyhow::Result<String> {
            Err(anyhow!("geocoder offline"))
        }
    }

    fn session_with(
        provider: impl WeatherProvider + 'static,
        cache: WeatherCache,
        shared: GroupStore,
    ) -> WeatherSession {
        WeatherSession::new(
            Box::new(provider),
            Box::new(FixedPlaceName::new("Mapo-gu")),
            cache,
            shared,
            &LocationConfig::default(),
        )
    }

    fn cached_payload(age: Duration, scenario: Scenario) -> CachePayload {
        let weather = scenario.template();
        CachePayload {
            saved_at: Utc::now() - age,
            location_name: "Cached town".to_string(),
            coordinates: LocationConfig::default().coordinates(),
            outfit: Stylist::new().recommend_for(&weather),
            is_bad_air: weather.is_bad_air(),
            daily: weather_package(scenario, &Local::now()).daily,
            weather,
        }
    }

    #[tokio::test]
    async fn cold_start_shows_valid_cache() {
        let cache = WeatherCache::new(GroupStore::in_memory());
        cache.write(&cached_payload(Duration::minutes(5), Scenario::Rainy));

        let session = session_with(ScriptedProvider::failing(), cache, GroupStore::in_memory());
        let state = session.state();

        assert_eq!(state.location_name, "Cached town");
        assert_eq!(state.weather, Some(Scenario::Rainy.template()));
        assert_eq!(state.hourly.len(), 8);
        assert_eq!(state.daily.len(), 7);
    }

    #[tokio::test]
    async fn cold_start_ignores_expired_cache() {
        let cache = WeatherCache::new(GroupStore::in_memory());
        cache.write(&cached_payload(Duration::minutes(20), Scenario::Rainy));

        let session = session_with(ScriptedProvider::failing(), cache, GroupStore::in_memory());
        let state = session.state();

        assert_eq!(state.weather, None);
        assert_eq!(state.outfit, ClothingOutfit::default());
        assert_eq!(state.location_name, "My location");
    }

    #[tokio::test]
    async fn fresh_refresh_caches_and_publishes_snapshot() {
        let local = GroupStore::in_memory();
        let shared = GroupStore::in_memory();
        let session = session_with(
            ScriptedProvider::serving(Scenario::Snowy),
            WeatherCache::new(local.clone()),
            shared.clone(),
        );

        let outcome = session.refresh(None, false).await.expect("refresh");
        assert_eq!(outcome, RefreshOutcome::Fresh);

        let state = session.state();
        assert!(!state.is_loading);
        assert_eq!(state.error_message, None);
        assert_eq!(state.outfit.shoes, items::WINTER_BOOTS);
        // The snowy template has an AQI of 118.
        assert!(state.outfit.has_mask);

        let cached = WeatherCache::new(local).read(Utc::now()).expect("cache written");
        assert!(cached.is_bad_air);
        assert_eq!(cached.outfit, state.outfit);

        let snapshot: WidgetSnapshot = shared.load(SNAPSHOT_KEY).expect("snapshot published");
        assert_eq!(snapshot.temperature, -1);
        assert_eq!(snapshot.condition, Condition::Snow);
        assert_eq!(snapshot.air_quality_status_text.as_deref(), Some("unhealthy"));
        assert_eq!(snapshot.outfit, state.outfit);
    }

    #[tokio::test]
    async fn valid_cache_skips_the_provider() {
        let cache = WeatherCache::new(GroupStore::in_memory());
        cache.write(&cached_payload(Duration::minutes(1), Scenario::Rainy));

        let provider = ScriptedProvider::serving(Scenario::Stormy);
        let calls = provider.calls.clone();
        let session = session_with(provider, cache, GroupStore::in_memory());

        let outcome = session.refresh(None, false).await.expect("refresh");
        assert_eq!(outcome, RefreshOutcome::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.state().hourly.len(), 8);

        let outcome = session.manual_refresh().await.expect("refresh");
        assert_eq!(outcome, RefreshOutcome::Fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.state().weather, Some(Scenario::Stormy.template()));
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_valid_cache() {
        let cache = WeatherCache::new(GroupStore::in_memory());
        cache.write(&cached_payload(Duration::minutes(2), Scenario::WarmClear));
        let session = session_with(ScriptedProvider::failing(), cache, GroupStore::in_memory());

        let outcome = session.manual_refresh().await.expect("fallback is not an error");
        assert_eq!(outcome, RefreshOutcome::CacheFallback);

        let state = session.state();
        assert_eq!(state.weather, Some(Scenario::WarmClear.template()));
        assert_eq!(state.error_message, None);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn provider_failure_without_cache_surfaces_message() {
        let cache = WeatherCache::new(GroupStore::in_memory());
        cache.write(&cached_payload(Duration::hours(2), Scenario::Rainy));
        let session = session_with(ScriptedProvider::failing(), cache, GroupStore::in_memory());

        let err = session.refresh(None, false).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));

        let state = session.state();
        assert!(!state.is_loading);
        let message = state.error_message.expect("error shown");
        assert!(message.starts_with("Failed to fetch weather"));
        // Hourly strip was painted from the stale entry.
        assert_eq!(state.hourly.len(), 8);
        assert_eq!(state.weather, None);
    }

    #[tokio::test]
    async fn superseded_result_is_dropped() {
        let provider = GatedProvider::default();
        let (started, release) = (provider.started.clone(), provider.release.clone());
        let session = Arc::new(session_with(
            provider,
            WeatherCache::new(GroupStore::in_memory()),
            GroupStore::in_memory(),
        ));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.refresh(None, true).await }
        });
        started.notified().await;

        let second = session.refresh(None, true).await.expect("second refresh");
        assert_eq!(second, RefreshOutcome::Fresh);

        release.notify_one();
        let first = first.await.expect("task").expect("first refresh");
        assert_eq!(first, RefreshOutcome::Superseded);

        assert_eq!(session.state().weather, Some(Scenario::WarmClear.template()));
    }

    #[tokio::test]
    async fn nearby_location_updates_are_throttled() {
        let provider = ScriptedProvider::serving(Scenario::Rainy);
        let calls = provider.calls.clone();
        let session = session_with(
            provider,
            WeatherCache::new(GroupStore::in_memory()),
            GroupStore::in_memory(),
        );

        let here = Coordinates::new(37.5665, 126.9780);
        let outcome = session.handle_location(here).await.expect("accepted");
        assert_eq!(outcome.expect("refresh"), RefreshOutcome::Fresh);
        assert_eq!(session.state().location_name, "Mapo-gu");

        assert!(session.handle_location(Coordinates::new(37.5666, 126.9780)).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn geocode_failure_keeps_previous_name() {
        let session = WeatherSession::new(
            Box::new(ScriptedProvider::serving(Scenario::Rainy)),
            Box::new(FailingResolver),
            WeatherCache::new(GroupStore::in_memory()),
            GroupStore::in_memory(),
            &LocationConfig::default(),
        );

        session.update_location_name(Coordinates::new(1.0, 1.0)).await;
        assert_eq!(session.state().location_name, "My location");
    }

    #[tokio::test]
    async fn rename_updates_snapshot_without_extending_cache() {
        let local = GroupStore::in_memory();
        let shared = GroupStore::in_memory();
        let session = session_with(
            ScriptedProvider::serving(Scenario::Rainy),
            WeatherCache::new(local.clone()),
            shared.clone(),
        );

        session.refresh(None, true).await.expect("refresh");
        let saved_at =
            WeatherCache::new(local.clone()).read_even_if_stale().expect("cached").saved_at;

        session.update_location_name(LocationConfig::default().coordinates()).await;

        let cached = WeatherCache::new(local).read_even_if_stale().expect("cached");
        assert_eq!(cached.location_name, "Mapo-gu");
        assert_eq!(cached.saved_at, saved_at);

        let snapshot: WidgetSnapshot = shared.load(SNAPSHOT_KEY).expect("snapshot");
        assert_eq!(snapshot.location_name, "Mapo-gu");
    }

    #[tokio::test]
    async fn rename_leaves_a_reading_from_elsewhere_alone() {
        let local = GroupStore::in_memory();
        let shared = GroupStore::in_memory();
        let session = session_with(
            ScriptedProvider::serving(Scenario::Rainy),
            WeatherCache::new(local.clone()),
            shared.clone(),
        );

        session.refresh(None, true).await.expect("refresh");
        session.update_location_name(Coordinates::new(35.1796, 129.0756)).await;

        assert_eq!(session.state().location_name, "Mapo-gu");
        let cached = WeatherCache::new(local).read_even_if_stale().expect("cached");
        assert_eq!(cached.location_name, "My location");
        let snapshot: WidgetSnapshot = shared.load(SNAPSHOT_KEY).expect("snapshot");
        assert_eq!(snapshot.location_name, "My location");
    }

    #[tokio::test]
    async fn moving_far_refetches_despite_valid_cache() {
        let local = GroupStore::in_memory();
        let shared = GroupStore::in_memory();
        let overrides = OverrideStore::new(shared.clone());
        overrides.set(Scenario::Snowy);

        let session = WeatherSession::new(
            Box::new(MockWeatherProvider::new(shared.clone())),
            Box::new(FixedPlaceName::new("Busan")),
            WeatherCache::new(local.clone()),
            shared.clone(),
            &LocationConfig::default(),
        );
        session.manual_refresh().await.expect("refresh at default location");

        overrides.set(Scenario::WarmClear);
        let busan = Coordinates::new(35.1796, 129.0756);
        let outcome = session.handle_location(busan).await.expect("accepted");
        assert_eq!(outcome.expect("refresh"), RefreshOutcome::Fresh);

        let state = session.state();
        assert_eq!(state.location_name, "Busan");
        assert_eq!(state.weather.map(|w| w.condition), Some(Condition::Clear));

        let cached = WeatherCache::new(local).read(Utc::now()).expect("cached");
        assert_eq!(cached.location_name, "Busan");
        assert_eq!(cached.weather.condition, Condition::Clear);
        assert!(cached.covers(&busan));

        let snapshot: WidgetSnapshot = shared.load(SNAPSHOT_KEY).expect("snapshot");
        assert_eq!(snapshot.location_name, "Busan");
        assert_eq!(snapshot.condition, Condition::Clear);
        assert_eq!(snapshot.temperature, 27);
    }

    #[tokio::test]
    async fn follow_consumes_location_stream() {
        let session = session_with(
            ScriptedProvider::serving(Scenario::Stormy),
            WeatherCache::new(GroupStore::in_memory()),
            GroupStore::in_memory(),
        );

        let (tx, rx) = mpsc::channel(4);
        tx.send(Coordinates::new(37.5665, 126.9780)).await.expect("send");
        drop(tx);

        session.follow(rx).await;
        assert_eq!(session.state().weather, Some(Scenario::Stormy.template()));
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_result() {
        let session = session_with(
            ScriptedProvider::serving(Scenario::Rainy),
            WeatherCache::new(GroupStore::in_memory()),
            GroupStore::in_memory(),
        );
        let mut events = session.subscribe();

        session.refresh(None, true).await.expect("refresh");

        let mut saw_loading = false;
        let mut saw_snapshot = false;
        let mut last_state = None;
        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::StateChanged(state) => {
                    saw_loading |= state.is_loading;
                    last_state = Some(state);
                }
                SessionEvent::SnapshotPublished(_) => saw_snapshot = true,
            }
        }

        assert!(saw_loading);
        assert!(saw_snapshot);
        assert_eq!(last_state.map(|s| s.is_loading), Some(false));
    }

    #[tokio::test]
    async fn mock_provider_follows_override() {
        let shared = GroupStore::in_memory();
        OverrideStore::new(shared.clone()).set(Scenario::Stormy);

        let session = session_with(
            MockWeatherProvider::new(shared.clone()),
            WeatherCache::new(GroupStore::in_memory()),
            shared,
        );
        session.refresh(None, true).await.expect("refresh");

        let state = session.state();
        assert_eq!(state.weather.map(|w| w.condition), Some(Condition::Storm));
        assert_eq!(state.outfit.accessory.as_deref(), Some(items::UMBRELLA));
    }
}
