//! Companion display: reads whatever the app last published.
//!
//! The companion never talks to a weather provider. If nothing has been
//! published (or sharing is unavailable) it derives a scenario snapshot on
//! its own.

use chrono::{DateTime, Duration, Local, Utc};

use crate::{
    overrides::OverrideStore,
    scenario::{scenario_for_time, weather_package},
    snapshot::{SNAPSHOT_KEY, WidgetSnapshot, project_at},
    storage::GroupStore,
    stylist::Stylist,
};

/// How often the companion re-renders.
pub const REFRESH_INTERVAL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Published by the app.
    Published,
    /// Derived locally from the scenario generator.
    Scenario,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetEntry {
    pub date: DateTime<Utc>,
    pub snapshot: WidgetSnapshot,
    pub source: SnapshotSource,
    pub next_refresh: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Companion {
    shared: GroupStore,
    overrides: OverrideStore,
    stylist: Stylist,
    mock_place_name: String,
}

impl Companion {
    pub fn new(shared: GroupStore, mock_place_name: impl Into<String>) -> Self {
        Self {
            overrides: OverrideStore::new(shared.clone()),
            shared,
            stylist: Stylist::new(),
            mock_place_name: mock_place_name.into(),
        }
    }

    /// The entry to render at `now`, and when to ask again.
    pub fn entry(&self, now: DateTime<Local>) -> WidgetEntry {
        let now_utc = now.with_timezone(&Utc);
        let (snapshot, source) = match self.shared.load::<WidgetSnapshot>(SNAPSHOT_KEY) {
            Some(snapshot) => (snapshot, SnapshotSource::Published),
            None => (self.scenario_snapshot(&now), SnapshotSource::Scenario),
        };

        tracing::debug!("Widget entry from {:?} snapshot updated {}", source, snapshot.updated_at);

        WidgetEntry {
            date: now_utc,
            snapshot,
            source,
            next_refresh: now_utc + Duration::minutes(REFRESH_INTERVAL_MINUTES),
        }
    }

    /// Snapshot built from the scenario generator, honouring any override.
    pub fn scenario_snapshot(&self, now: &DateTime<Local>) -> WidgetSnapshot {
        let scenario = scenario_for_time(now, self.overrides.get());
        let current = weather_package(scenario, now).current;
        let outfit = self.stylist.recommend_for(&current);
        project_at(&self.mock_place_name, &current, &outfit, now.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::Condition,
        scenario::Scenario,
        snapshot::project,
    };

    #[test]
    fn prefers_published_snapshot() {
        let shared = GroupStore::in_memory();
        let weather = Scenario::WarmClear.template();
        let published = project("Jongno-gu", &weather, &Stylist::new().recommend_for(&weather));
        shared.save(&published, SNAPSHOT_KEY);

        let entry = Companion::new(shared, "Seoul").entry(Local::now());
        assert_eq!(entry.source, SnapshotSource::Published);
        assert_eq!(entry.snapshot, published);
    }

    #[test]
    fn derives_scenario_snapshot_when_nothing_published() {
        let shared = GroupStore::in_memory();
        OverrideStore::new(shared.clone()).set(Scenario::Rainy);

        let entry = Companion::new(shared, "Seoul").entry(Local::now());
        assert_eq!(entry.source, SnapshotSource::Scenario);
        assert_eq!(entry.snapshot.location_name, "Seoul");
        assert_eq!(entry.snapshot.condition, Condition::Rain);
        assert_eq!(entry.snapshot.temperature, 16);
        assert_eq!(entry.snapshot.air_quality_status_text.as_deref(), Some("moderate"));
    }

    #[test]
    fn scenario_snapshot_is_reproducible() {
        let companion = Companion::new(GroupStore::in_memory(), "Seoul");
        let now = Local::now();
        assert_eq!(companion.scenario_snapshot(&now), companion.scenario_snapshot(&now));
    }

    #[test]
    fn next_refresh_is_thirty_minutes_out() {
        let entry = Companion::new(GroupStore::in_memory(), "Seoul").entry(Local::now());
        assert_eq!(entry.next_refresh - entry.date, Duration::minutes(30));
    }
}
