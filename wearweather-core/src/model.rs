use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Rendered in place of any optional value the source did not report.
pub const UNKNOWN_DISPLAY: &str = "--";

/// Air quality index at or above which the air is considered bad.
pub const BAD_AIR_AQI: u16 = 101;

/// Coarse weather condition shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storm,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Clear => "clear",
            Condition::Cloudy => "cloudy",
            Condition::Rain => "rain",
            Condition::Snow => "snow",
            Condition::Storm => "storm",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Clear => "Clear",
            Condition::Cloudy => "Cloudy",
            Condition::Rain => "Rain",
            Condition::Snow => "Snow",
            Condition::Storm => "Storm",
        }
    }

    /// Ordering used when several conditions compete for one slot (e.g. a day
    /// aggregated from several forecast entries). Higher is worse.
    pub fn severity(&self) -> u8 {
        match self {
            Condition::Clear => 0,
            Condition::Cloudy => 1,
            Condition::Rain => 2,
            Condition::Snow => 3,
            Condition::Storm => 4,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single weather observation. Optional fields are "unknown" when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature: f64,
    pub condition: Condition,
    pub daily_high: f64,
    pub daily_low: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    /// Relative humidity in `0.0..=1.0`.
    #[serde(default)]
    pub humidity: Option<f64>,
    /// Metres per second.
    #[serde(default)]
    pub wind_speed: Option<f64>,
    /// Degrees, `0..360`.
    #[serde(default)]
    pub wind_direction: Option<f64>,
    /// Probability in `0.0..=1.0`.
    #[serde(default)]
    pub precipitation_chance: Option<f64>,
    #[serde(default)]
    pub air_quality_index: Option<u16>,
    /// µg/m³.
    #[serde(default)]
    pub pm25: Option<f64>,
}

impl WeatherReading {
    /// Reading with only the required fields set.
    pub fn new(temperature: f64, condition: Condition, daily_high: f64, daily_low: f64) -> Self {
        Self {
            temperature,
            condition,
            daily_high,
            daily_low,
            feels_like: None,
            humidity: None,
            wind_speed: None,
            wind_direction: None,
            precipitation_chance: None,
            air_quality_index: None,
            pm25: None,
        }
    }

    pub fn is_bad_air(&self) -> bool {
        self.air_quality_index.is_some_and(|aqi| aqi >= BAD_AIR_AQI)
    }

    pub fn temperature_text(&self) -> String {
        format!("{:.0}°", self.temperature)
    }

    pub fn feels_like_text(&self) -> String {
        display_or_unknown(self.feels_like, |v| format!("{v:.0}°"))
    }

    pub fn humidity_text(&self) -> String {
        display_or_unknown(self.humidity, |v| format!("{:.0}%", v * 100.0))
    }

    pub fn wind_text(&self) -> String {
        match (self.wind_speed, self.wind_direction) {
            (Some(speed), Some(dir)) => format!("{speed:.1} m/s {}", compass_point(dir)),
            (Some(speed), None) => format!("{speed:.1} m/s"),
            _ => UNKNOWN_DISPLAY.to_string(),
        }
    }

    pub fn precipitation_text(&self) -> String {
        display_or_unknown(self.precipitation_chance, |v| format!("{:.0}%", v * 100.0))
    }

    pub fn air_quality_text(&self) -> String {
        display_or_unknown(self.air_quality_index, |v| v.to_string())
    }

    pub fn pm25_text(&self) -> String {
        display_or_unknown(self.pm25, |v| format!("{v:.0} µg/m³"))
    }
}

fn display_or_unknown<T>(value: Option<T>, render: impl FnOnce(T) -> String) -> String {
    value.map(render).unwrap_or_else(|| UNKNOWN_DISPLAY.to_string())
}

fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let idx = ((degrees.rem_euclid(360.0) + 22.5) / 45.0) as usize % POINTS.len();
    POINTS[idx]
}

/// Clothing item identifiers understood by the renderer.
pub mod items {
    pub const BASIC_TSHIRT: &str = "basic-tshirt";
    pub const BASIC_SHORTS: &str = "basic-shorts";
    pub const BASIC_SHOES: &str = "basic-shoes";

    pub const UMBRELLA: &str = "umbrella";
    pub const GLOVES: &str = "gloves";
    pub const MUFFLER: &str = "muffler";
    pub const CAP: &str = "cap";

    pub const LIGHT_JACKET: &str = "light-jacket";
    pub const PADDING: &str = "padding";
    pub const WOOL_COAT: &str = "wool-coat";
    pub const TRENCH_COAT: &str = "trench-coat";

    pub const RAIN_BOOTS: &str = "rain-boots";
    pub const WINTER_BOOTS: &str = "winter-boots";
    pub const SNEAKERS: &str = "sneakers";
    pub const SANDALS: &str = "sandals";
}

/// The outfit picked for a reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingOutfit {
    pub top: String,
    pub bottom: String,
    pub shoes: String,
    #[serde(default)]
    pub outer: Option<String>,
    #[serde(default)]
    pub accessory: Option<String>,
    #[serde(default)]
    pub has_mask: bool,
}

impl Default for ClothingOutfit {
    /// Shown before any reading is available.
    fn default() -> Self {
        Self {
            top: items::BASIC_TSHIRT.to_string(),
            bottom: items::BASIC_SHORTS.to_string(),
            shoes: items::BASIC_SHOES.to_string(),
            outer: None,
            accessory: None,
            has_mask: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastItem {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: Condition,
}

impl DailyForecastItem {
    /// `Today`, `Tomorrow`, or the weekday abbreviation, relative to `today`.
    pub fn day_label(&self, today: NaiveDate) -> String {
        match (self.date - today).num_days() {
            0 => "Today".to_string(),
            1 => "Tomorrow".to_string(),
            _ => weekday_short(self.date.weekday()).to_string(),
        }
    }
}

fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyForecastItem {
    pub hour_label: String,
    pub temperature: i32,
    pub condition: Condition,
}

/// What every weather source returns: the current reading plus the week ahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPackage {
    pub current: WeatherReading,
    pub daily: Vec<DailyForecastItem>,
}

/// Number of entries in a daily forecast; index 0 is today.
pub const DAILY_FORECAST_LEN: usize = 7;

/// Number of entries in an hourly forecast, starting with the next hour.
pub const HOURLY_FORECAST_LEN: usize = 8;
