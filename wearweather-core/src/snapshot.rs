//! Display-ready projection handed to the companion display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ClothingOutfit, Condition, WeatherReading};

pub const SNAPSHOT_KEY: &str = "wearweather.widget-snapshot.v1";

/// Air quality band shown next to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQualityStatus {
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
}

impl AirQualityStatus {
    pub fn from_index(aqi: u16) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::Unhealthy,
            _ => Self::VeryUnhealthy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Unhealthy => "unhealthy",
            Self::VeryUnhealthy => "very-unhealthy",
        }
    }
}

/// Everything the companion needs to render, already computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSnapshot {
    pub updated_at: DateTime<Utc>,
    pub location_name: String,
    pub temperature: i32,
    pub condition: Condition,
    pub daily_high: i32,
    pub daily_low: i32,
    pub outfit: ClothingOutfit,
    #[serde(default)]
    pub air_quality_index: Option<u16>,
    #[serde(default)]
    pub air_quality_status_text: Option<String>,
}

/// Project the current state into a snapshot stamped with the current time.
pub fn project(
    location_name: &str,
    weather: &WeatherReading,
    outfit: &ClothingOutfit,
) -> WidgetSnapshot {
    project_at(location_name, weather, outfit, Utc::now())
}

pub fn project_at(
    location_name: &str,
    weather: &WeatherReading,
    outfit: &ClothingOutfit,
    now: DateTime<Utc>,
) -> WidgetSnapshot {
    WidgetSnapshot {
        updated_at: now,
        location_name: location_name.to_string(),
        temperature: round_half_away(weather.temperature),
        condition: weather.condition,
        daily_high: round_half_away(weather.daily_high),
        daily_low: round_half_away(weather.daily_low),
        outfit: outfit.clone(),
        air_quality_index: weather.air_quality_index,
        air_quality_status_text: weather
            .air_quality_index
            .map(|aqi| AirQualityStatus::from_index(aqi).as_str().to_string()),
    }
}

// f64::round already rounds half away from zero.
fn round_half_away(value: f64) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{scenario::Scenario, stylist::Stylist};

    #[test]
    fn rounds_half_away_from_zero() {
        let weather = WeatherReading::new(2.5, Condition::Clear, -2.5, -0.4);
        let snap = project("x", &weather, &ClothingOutfit::default());
        assert_eq!(snap.temperature, 3);
        assert_eq!(snap.daily_high, -3);
        assert_eq!(snap.daily_low, 0);
    }

    #[test]
    fn air_quality_bands() {
        assert_eq!(AirQualityStatus::from_index(0), AirQualityStatus::Good);
        assert_eq!(AirQualityStatus::from_index(50), AirQualityStatus::Good);
        assert_eq!(AirQualityStatus::from_index(51), AirQualityStatus::Moderate);
        assert_eq!(AirQualityStatus::from_index(100), AirQualityStatus::Moderate);
        assert_eq!(AirQualityStatus::from_index(101), AirQualityStatus::Unhealthy);
        assert_eq!(AirQualityStatus::from_index(150), AirQualityStatus::Unhealthy);
        assert_eq!(AirQualityStatus::from_index(151), AirQualityStatus::VeryUnhealthy);
        assert_eq!(AirQualityStatus::from_index(480), AirQualityStatus::VeryUnhealthy);
    }

    #[test]
    fn status_text_only_when_index_known() {
        let mut weather = WeatherReading::new(20.0, Condition::Cloudy, 22.0, 15.0);
        let snap = project("x", &weather, &ClothingOutfit::default());
        assert_eq!(snap.air_quality_index, None);
        assert_eq!(snap.air_quality_status_text, None);

        weather.air_quality_index = Some(165);
        let snap = project("x", &weather, &ClothingOutfit::default());
        assert_eq!(snap.air_quality_index, Some(165));
        assert_eq!(snap.air_quality_status_text.as_deref(), Some("very-unhealthy"));
    }

    #[test]
    fn copies_condition_and_outfit_verbatim() {
        let weather = Scenario::Stormy.template();
        let outfit = Stylist::new().recommend_for(&weather);
        let now = Utc::now();

        let snap = project_at("Seoul", &weather, &outfit, now);
        assert_eq!(snap.updated_at, now);
        assert_eq!(snap.location_name, "Seoul");
        assert_eq!(snap.condition, Condition::Storm);
        assert_eq!(snap.outfit, outfit);
    }

    #[test]
    fn json_roundtrip_preserves_snapshot() {
        let weather = Scenario::Snowy.template();
        let outfit = Stylist::new().recommend_for(&weather);
        let snap = project("Seoul", &weather, &outfit);

        let json = serde_json::to_string(&snap).expect("encode");
        let decoded: WidgetSnapshot = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded, snap);
    }

    #[test]
    fn decodes_older_snapshot_without_air_quality() {
        let json = r#"{
            "updated_at": "2024-01-01T00:00:00Z",
            "location_name": "Seoul",
            "temperature": 7,
            "condition": "cloudy",
            "daily_high": 10,
            "daily_low": 2,
            "outfit": {"top": "heattech", "bottom": "thick-pants", "shoes": "sneakers"},
            "theme": "ignored"
        }"#;
        let snap: WidgetSnapshot = serde_json::from_str(json).expect("decode");
        assert_eq!(snap.air_quality_index, None);
        assert_eq!(snap.outfit.outer, None);
        assert!(!snap.outfit.has_mask);
    }
}
