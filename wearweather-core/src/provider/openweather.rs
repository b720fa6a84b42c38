use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{
    Condition, DAILY_FORECAST_LEN, DailyForecastItem, WeatherPackage, WeatherReading,
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        what: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {what} JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u16,
}

#[derive(Debug, Deserialize, Default)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    #[serde(default)]
    timezone: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

/// Map an OpenWeather condition id onto our coarse condition.
fn condition_from_code(code: u16) -> Condition {
    match code {
        200..=299 => Condition::Storm,
        300..=399 | 500..=599 => Condition::Rain,
        600..=699 => Condition::Snow,
        800 => Condition::Clear,
        700..=799 | 801..=899 => Condition::Cloudy,
        _ => Condition::Clear,
    }
}

fn first_condition(weather: &[OwWeather]) -> Condition {
    weather.first().map(|w| condition_from_code(w.id)).unwrap_or_default()
}

fn local_date(ts: i64, offset_secs: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(ts + offset_secs, 0).map(|dt| dt.date_naive())
}

#[derive(Debug, Clone, Copy)]
struct DayAccumulator {
    high: f64,
    low: f64,
    condition: Condition,
}

impl DayAccumulator {
    fn observe(&mut self, high: f64, low: f64, condition: Condition) {
        self.high = self.high.max(high);
        self.low = self.low.min(low);
        if condition.severity() > self.condition.severity() {
            self.condition = condition;
        }
    }
}

/// Fold 3-hourly entries (plus the current observation) into exactly
/// [`DAILY_FORECAST_LEN`] days starting at `today`. Days past the end of the
/// forecast repeat the last known day.
fn aggregate_daily(
    today: NaiveDate,
    current: &OwCurrentResponse,
    forecast: &OwForecastResponse,
) -> Vec<DailyForecastItem> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    let mut observe = |date: NaiveDate, main: &OwMain, condition: Condition| {
        let high = main.temp_max.unwrap_or(main.temp);
        let low = main.temp_min.unwrap_or(main.temp);
        days.entry(date)
            .and_modify(|acc| acc.observe(high, low, condition))
            .or_insert(DayAccumulator { high, low, condition });
    };

    observe(today, &current.main, first_condition(&current.weather));
    for entry in &forecast.list {
        if let Some(date) = local_date(entry.dt, forecast.city.timezone).filter(|d| *d >= today) {
            observe(date, &entry.main, first_condition(&entry.weather));
        }
    }

    let mut last = days.get(&today).copied();
    (0..DAILY_FORECAST_LEN as i64)
        .filter_map(|i| {
            let date = today + Duration::days(i);
            if let Some(acc) = days.get(&date) {
                last = Some(*acc);
            }
            last.map(|acc| DailyForecastItem {
                date,
                high: acc.high,
                low: acc.low,
                condition: acc.condition,
            })
        })
        .collect()
}

fn to_package(current: OwCurrentResponse, forecast: OwForecastResponse) -> Result<WeatherPackage> {
    let today = local_date(current.dt, current.timezone)
        .ok_or_else(|| anyhow!("OpenWeather current response has an invalid timestamp"))?;

    let daily = aggregate_daily(today, &current, &forecast);
    let (daily_high, daily_low) = daily
        .first()
        .map(|d| (d.high, d.low))
        .ok_or_else(|| anyhow!("OpenWeather forecast response contained no data"))?;

    let reading = WeatherReading {
        temperature: current.main.temp,
        condition: first_condition(&current.weather),
        daily_high,
        daily_low,
        feels_like: current.main.feels_like,
        humidity: current.main.humidity.map(|h| f64::from(h) / 100.0),
        wind_speed: current.wind.speed,
        wind_direction: current.wind.deg,
        precipitation_chance: forecast.list.first().and_then(|e| e.pop),
        // Not offered by these endpoints.
        air_quality_index: None,
        pm25: None,
    };

    Ok(WeatherPackage { current: reading, daily })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_weather_package(&self, latitude: f64, longitude: f64) -> Result<WeatherPackage> {
        let (current, forecast) = tokio::try_join!(
            self.get_json::<OwCurrentResponse>("/data/2.5/weather", "current", latitude, longitude),
            self.get_json::<OwForecastResponse>(
                "/data/2.5/forecast",
                "forecast",
                latitude,
                longitude,
            ),
        )?;

        to_package(current, forecast)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
