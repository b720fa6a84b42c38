//! Manual scenario pin, shared with the companion display.

use crate::{scenario::Scenario, storage::GroupStore};

pub const OVERRIDE_KEY: &str = "wearweather.scenario-override.v1";

/// Persisted scenario override. Absent means "pick by time of day".
#[derive(Debug, Clone)]
pub struct OverrideStore {
    store: GroupStore,
}

impl OverrideStore {
    pub fn new(store: GroupStore) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Option<Scenario> {
        self.store.load(OVERRIDE_KEY)
    }

    pub fn set(&self, scenario: Scenario) {
        tracing::info!("Pinning scenario override: {}", scenario);
        self.store.save(&scenario, OVERRIDE_KEY);
    }

    pub fn clear(&self) {
        tracing::info!("Clearing scenario override");
        self.store.remove(OVERRIDE_KEY);
    }
}
