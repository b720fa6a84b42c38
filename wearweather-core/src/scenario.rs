//! Deterministic weather scenarios.
//!
//! Used when no live provider is configured, and by the companion display
//! when nothing has been published yet. Output depends only on the clock
//! time passed in and the optional override.

use chrono::{DateTime, Duration, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::model::{
    Condition, DAILY_FORECAST_LEN, DailyForecastItem, HOURLY_FORECAST_LEN, HourlyForecastItem,
    WeatherPackage, WeatherReading,
};

const DAILY_WIGGLE: [i64; DAILY_FORECAST_LEN] = [0, 1, -1, 2, -2, 1, 0];
const HOURLY_OFFSET: [i32; HOURLY_FORECAST_LEN] = [-2, -1, 0, 1, 2, 1, 0, -1];

/// Named weather preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    ColdCloudy,
    Rainy,
    WarmClear,
    Snowy,
    Stormy,
}

impl Scenario {
    /// Rotation order for time-derived selection.
    pub const ALL: [Scenario; 5] = [
        Scenario::ColdCloudy,
        Scenario::Rainy,
        Scenario::WarmClear,
        Scenario::Snowy,
        Scenario::Stormy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::ColdCloudy => "cold-cloudy",
            Scenario::Rainy => "rainy",
            Scenario::WarmClear => "warm-clear",
            Scenario::Snowy => "snowy",
            Scenario::Stormy => "stormy",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Scenario::ColdCloudy => "Cloudy / cold",
            Scenario::Rainy => "Rain",
            Scenario::WarmClear => "Clear / warm",
            Scenario::Snowy => "Snow",
            Scenario::Stormy => "Storm",
        }
    }

    /// The fixed reading this scenario stands for.
    pub fn template(&self) -> WeatherReading {
        use Condition::{Clear, Cloudy, Rain, Snow, Storm};

        let (t, condition, high, low, feels, humidity, wind, dir, precip, aqi, pm25) = match self {
            Scenario::ColdCloudy => (7.0, Cloudy, 10.0, 2.0, 5.0, 0.62, 3.2, 40.0, 0.10, 72, 22.0),
            Scenario::Rainy => (16.0, Rain, 17.0, 12.0, 15.0, 0.86, 4.9, 190.0, 0.75, 96, 30.0),
            Scenario::WarmClear => (27.0, Clear, 29.0, 21.0, 29.0, 0.48, 2.1, 120.0, 0.05, 38, 8.0),
            Scenario::Snowy => (-1.0, Snow, 0.0, -6.0, -4.0, 0.70, 5.2, 320.0, 0.55, 118, 42.0),
            Scenario::Stormy => (12.0, Storm, 13.0, 8.0, 10.0, 0.90, 9.8, 250.0, 0.90, 165, 68.0),
        };

        WeatherReading {
            temperature: t,
            condition,
            daily_high: high,
            daily_low: low,
            feels_like: Some(feels),
            humidity: Some(humidity),
            wind_speed: Some(wind),
            wind_direction: Some(dir),
            precipitation_chance: Some(precip),
            air_quality_index: Some(aqi),
            pm25: Some(pm25),
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Scenario {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();
        Scenario::ALL
            .into_iter()
            .find(|s| s.as_str() == lower)
            .ok_or_else(|| {
                let names: Vec<_> = Scenario::ALL.iter().map(Scenario::as_str).collect();
                anyhow::anyhow!(
                    "Unknown scenario '{value}'. Supported scenarios: {}.",
                    names.join(", "),
                )
            })
    }
}

/// Pick the scenario for `time`: the override if present, else rotate by hour.
pub fn scenario_for_time<Tz: TimeZone>(
    time: &DateTime<Tz>,
    override_: Option<Scenario>,
) -> Scenario {
    override_.unwrap_or_else(|| Scenario::ALL[time.hour() as usize % Scenario::ALL.len()])
}

/// How a condition softens over the following days or hours.
fn degrade(condition: Condition, i: usize) -> Condition {
    match condition {
        Condition::Storm if i % 3 == 0 => Condition::Storm,
        Condition::Storm => Condition::Rain,
        Condition::Snow if i % 4 == 0 => Condition::Snow,
        Condition::Snow => Condition::Cloudy,
        Condition::Rain if i % 4 == 0 => Condition::Rain,
        Condition::Rain => Condition::Cloudy,
        Condition::Cloudy if i % 5 == 0 => Condition::Cloudy,
        Condition::Cloudy => Condition::Clear,
        Condition::Clear => Condition::Clear,
    }
}

/// Build the full package for `scenario`, with days starting at `time`'s date.
pub fn weather_package<Tz: TimeZone>(scenario: Scenario, time: &DateTime<Tz>) -> WeatherPackage {
    let current = scenario.template();
    let daily = daily_forecast(&current, time);
    WeatherPackage { current, daily }
}

fn daily_forecast<Tz: TimeZone>(
    base: &WeatherReading,
    time: &DateTime<Tz>,
) -> Vec<DailyForecastItem> {
    let today = time.date_naive();
    let base_high = base.daily_high.round() as i64;
    let base_low = base.daily_low.round() as i64;

    (0..DAILY_FORECAST_LEN)
        .map(|i| {
            let wiggle = DAILY_WIGGLE[i % DAILY_WIGGLE.len()];
            DailyForecastItem {
                date: today + Duration::days(i as i64),
                high: (base_high + wiggle) as f64,
                low: (base_low + wiggle.min(0)) as f64,
                condition: degrade(base.condition, i),
            }
        })
        .collect()
}

/// The next eight hours around `current`, labelled by clock hour.
pub fn hourly_forecast<Tz: TimeZone>(
    current: &WeatherReading,
    time: &DateTime<Tz>,
) -> Vec<HourlyForecastItem> {
    let base = current.temperature.round() as i32;
    let now_hour = time.hour() as usize;

    (0..HOURLY_FORECAST_LEN)
        .map(|i| {
            let hour = (now_hour + i + 1) % 24;
            HourlyForecastItem {
                hour_label: format!("{hour:02}:00"),
                temperature: base + HOURLY_OFFSET[i % HOURLY_OFFSET.len()],
                condition: degrade(current.condition, i),
            }
        })
        .collect()
}
