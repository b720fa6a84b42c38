//! Plain-text rendering for the terminal.

use std::fmt::Write;

use chrono::{Local, NaiveDate};
use wearweather_core::{
    ClothingOutfit, SessionState, SnapshotSource, WidgetEntry, model::UNKNOWN_DISPLAY,
};

pub fn outfit(outfit: &ClothingOutfit) -> String {
    let mut parts = vec![outfit.top.as_str(), outfit.bottom.as_str()];
    parts.extend(outfit.outer.as_deref());
    parts.push(outfit.shoes.as_str());
    parts.extend(outfit.accessory.as_deref());
    if outfit.has_mask {
        parts.push("mask");
    }
    parts.join(" + ")
}

pub fn session(state: &SessionState, today: NaiveDate) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", state.location_name);
    if let Some(message) = &state.error_message {
        let _ = writeln!(out, "  ! {message}");
    }

    let Some(weather) = &state.weather else {
        let _ = writeln!(out, "  No weather yet. Wear: {}", outfit(&state.outfit));
        return out;
    };

    let _ = writeln!(
        out,
        "  {} {}  (H {:.0}° / L {:.0}°)",
        weather.temperature_text(),
        weather.condition.label(),
        weather.daily_high,
        weather.daily_low,
    );
    let _ = writeln!(
        out,
        "  feels {}  humidity {}  wind {}  rain {}  AQI {}  PM2.5 {}",
        weather.feels_like_text(),
        weather.humidity_text(),
        weather.wind_text(),
        weather.precipitation_text(),
        weather.air_quality_text(),
        weather.pm25_text(),
    );
    let _ = writeln!(out, "  Wear: {}", outfit(&state.outfit));

    if !state.hourly.is_empty() {
        let hours: Vec<String> = state
            .hourly
            .iter()
            .map(|h| format!("{} {}° {}", h.hour_label, h.temperature, h.condition))
            .collect();
        let _ = writeln!(out, "  Next hours: {}", hours.join(" | "));
    }

    for day in &state.daily {
        let _ = writeln!(
            out,
            "  {:<9} {:>4.0}° {:>4.0}°  {}",
            day.day_label(today),
            day.high,
            day.low,
            day.condition.label(),
        );
    }

    out
}

pub fn widget(entry: &WidgetEntry) -> String {
    let snap = &entry.snapshot;
    let mut out = String::new();

    let source = match entry.source {
        SnapshotSource::Published => "shared",
        SnapshotSource::Scenario => "scenario",
    };

    let _ = writeln!(
        out,
        "[{}] {} {}°  H{}° L{}°",
        snap.location_name,
        snap.condition.label(),
        snap.temperature,
        snap.daily_high,
        snap.daily_low,
    );
    let aqi = match (snap.air_quality_index, &snap.air_quality_status_text) {
        (Some(aqi), Some(text)) => format!("{aqi} ({text})"),
        (Some(aqi), None) => aqi.to_string(),
        _ => UNKNOWN_DISPLAY.to_string(),
    };
    let _ = writeln!(out, "  AQI {aqi}");
    let _ = writeln!(out, "  Wear: {}", outfit(&snap.outfit));
    let _ = writeln!(
        out,
        "  updated {} ({source}), next render {}",
        snap.updated_at.with_timezone(&Local).format("%H:%M"),
        entry.next_refresh.with_timezone(&Local).format("%H:%M"),
    );

    out
}
