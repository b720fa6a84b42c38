use crate::{
    Config, WeatherPackage,
    provider::{mock::MockWeatherProvider, openweather::OpenWeatherProvider},
    storage::GroupStore,
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod mock;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Mock,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Mock => "mock",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Mock, ProviderId::OpenWeather]
    }

    pub fn needs_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "mock" => Ok(ProviderId::Mock),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: mock, openweather."
            )),
        }
    }
}

/// A source of weather packages. Fallible and possibly slow.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_weather_package(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> anyhow::Result<WeatherPackage>;
}

/// Construct a provider from config and explicit ProviderId.
///
/// `shared` is where the mock provider looks for a scenario override.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
    shared: &GroupStore,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::Mock => Box::new(MockWeatherProvider::new(shared.clone())),
        ProviderId::OpenWeather => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for provider '{id}'.\n\
                         Hint: run `wearweather configure {id}` and enter your API key."
                )
            })?;
            Box::new(OpenWeatherProvider::new(api_key.to_owned()))
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(
    config: &Config,
    shared: &GroupStore,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config, shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg, &GroupStore::in_memory())
            .unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn default_provider_from_config_falls_back_to_mock() {
        let cfg = Config::default();
        let provider = default_provider_from_config(&cfg, &GroupStore::in_memory());
        assert!(provider.is_ok());
    }

    #[test]
    fn default_provider_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".to_string());

        let provider = default_provider_from_config(&cfg, &GroupStore::in_memory());
        assert!(provider.is_ok());
    }
}
