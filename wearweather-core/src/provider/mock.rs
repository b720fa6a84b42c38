use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;

use crate::{
    model::WeatherPackage,
    overrides::OverrideStore,
    scenario::{scenario_for_time, weather_package},
    storage::GroupStore,
};

use super::WeatherProvider;

/// Serves scenario-generated weather; coordinates are ignored.
#[derive(Debug, Clone)]
pub struct MockWeatherProvider {
    overrides: OverrideStore,
}

impl MockWeatherProvider {
    pub fn new(shared: GroupStore) -> Self {
        Self {
            overrides: OverrideStore::new(shared),
        }
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn fetch_weather_package(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<WeatherPackage> {
        let now = Local::now();
        let scenario = scenario_for_time(&now, self.overrides.get());
        tracing::debug!("Mock provider serving scenario {}", scenario);
        Ok(weather_package(scenario, &now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[tokio::test]
    async fn serves_the_pinned_scenario() {
        let shared = GroupStore::in_memory();
        OverrideStore::new(shared.clone()).set(Scenario::Snowy);

        let provider = MockWeatherProvider::new(shared);
        let pkg = provider.fetch_weather_package(0.0, 0.0).await.expect("mock never fails");

        assert_eq!(pkg.current, Scenario::Snowy.template());
        assert_eq!(pkg.daily.len(), 7);
    }
}
