//! Display-side lookups and view data.
//!
//! Nothing here draws: widgets consume the names, labels and chart points
//! produced from provider records.

use chrono::{DateTime, FixedOffset, Timelike};
use std::{cell::OnceCell, sync::Arc};

use crate::{
    Day, TemperatureUnit, WeatherEffectiveness, WeatherError, WeatherProvider, WeatherRecord,
};

impl Day {
    /// Human-readable name, e.g. "Lightly rainy".
    pub fn display_name(&self) -> &'static str {
        match self {
            Day::Clear => "Clear",
            Day::Cloudy => "Cloudy",
            Day::LightlyRainy => "Lightly rainy",
            Day::Rainy => "Rainy",
            Day::HeavilyRainy => "Heavily rainy",
            Day::SnowyRainy => "Snowy rainy",
            Day::LightlySnowy => "Lightly snowy",
            Day::Snowy => "Snowy",
            Day::HeavilySnowy => "Heavily snowy",
            Day::Hazy => "Hazy",
            Day::Foggy => "Foggy",
            Day::Dusty => "Dusty",
            Day::Sandy => "Sandy",
            Day::Windy => "Windy",
            Day::Unknown => "Unknown",
        }
    }

    /// Resource key of the icon for this condition.
    pub fn icon_name(&self) -> &'static str {
        match self {
            Day::Clear => "weather-sunny",
            Day::Cloudy => "weather-cloudy",
            Day::LightlyRainy | Day::Rainy => "weather-rainy",
            Day::HeavilyRainy => "weather-pouring",
            Day::LightlySnowy | Day::Snowy => "weather-snowy",
            Day::HeavilySnowy => "weather-snowy-heavy",
            Day::SnowyRainy => "weather-snowy-rainy",
            Day::Windy => "weather-windy",
            Day::Hazy => "weather-hazy",
            Day::Foggy => "weather-fog",
            Day::Dusty => "weather-dust",
            Day::Sandy | Day::Unknown => "weather-alert",
        }
    }
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }
}

/// Records passing `filter`, in provider order.
pub fn filtered(
    records: &[WeatherRecord],
    filter: WeatherEffectiveness,
) -> impl Iterator<Item = &WeatherRecord> {
    records
        .iter()
        .filter(move |record| filter.matches(record.effect()))
}

/// The most immediate record passing `filter`.
pub fn select(records: &[WeatherRecord], filter: WeatherEffectiveness) -> Option<&WeatherRecord> {
    filtered(records, filter).next()
}

/// Four-line summary: temperature, humidity, pressure and UV index.
pub fn detailed_label(record: &WeatherRecord, unit: TemperatureUnit) -> String {
    let uv = if record.has_uv_index() {
        record.uv_index().to_string()
    } else {
        "-".to_string()
    };

    format!(
        "{} {}\n{} %\n{} hPa\n{} UV",
        record.temperature(),
        unit.symbol(),
        (record.humidity() * 100.0).round() as i64,
        record.pressure().trunc() as i64,
        uv,
    )
}

/// Two-line summary: condition name and temperature.
pub fn mini_label(record: &WeatherRecord, unit: TemperatureUnit) -> String {
    format!(
        "{}\n{} {}",
        record.day().display_name(),
        record.temperature(),
        unit.symbol()
    )
}

pub fn time_label(time: DateTime<FixedOffset>) -> String {
    time.format("%H:%M").to_string()
}

/// Whole hours between the hour `now` falls in and the hour `time` falls in,
/// counted on `now`'s clock. Negative for the past.
pub fn hour_offset(time: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> i64 {
    let time = time.with_timezone(now.offset());
    let days = (time.date_naive() - now.date_naive()).num_days();

    days * 24 + i64::from(time.hour()) - i64::from(now.hour())
}

/// Chart data for one metric of a provider's records.
///
/// Records are loaded by [`TrendSeries::refresh`]. The sample record shown
/// on the x axis is derived lazily and dropped whenever the records, the
/// filter or the provider change.
#[derive(Debug)]
pub struct TrendSeries {
    provider: Arc<dyn WeatherProvider>,
    filter: WeatherEffectiveness,
    value: fn(&WeatherRecord) -> f64,
    records: Vec<WeatherRecord>,
    sample: OnceCell<Option<WeatherRecord>>,
}

impl TrendSeries {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        filter: WeatherEffectiveness,
        value: fn(&WeatherRecord) -> f64,
    ) -> Self {
        Self {
            provider,
            filter,
            value,
            records: Vec::new(),
            sample: OnceCell::new(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn WeatherProvider> {
        &self.provider
    }

    pub fn filter(&self) -> WeatherEffectiveness {
        self.filter
    }

    pub async fn refresh(&mut self) -> Result<(), WeatherError> {
        self.records = self.provider.get_weather().await?;
        self.sample.take();
        Ok(())
    }

    pub fn set_filter(&mut self, filter: WeatherEffectiveness) {
        if self.filter != filter {
            self.filter = filter;
            self.sample.take();
        }
    }

    /// Swap the provider. Records of the old one are discarded; call
    /// [`TrendSeries::refresh`] to load the new one.
    pub fn set_provider(&mut self, provider: Arc<dyn WeatherProvider>) {
        self.provider = provider;
        self.records.clear();
        self.sample.take();
    }

    pub fn records(&self) -> impl Iterator<Item = &WeatherRecord> {
        filtered(&self.records, self.filter)
    }

    /// `(hour offset from now, value)` per record.
    pub fn points(&self, now: DateTime<FixedOffset>) -> Vec<(i64, f64)> {
        self.records()
            .map(|record| (hour_offset(record.time(), now), (self.value)(record)))
            .collect()
    }

    /// First record of the series, used to size the axis labels.
    pub fn axis_sample(&self) -> Option<&WeatherRecord> {
        self.sample
            .get_or_init(|| select(&self.records, self.filter).cloned())
            .as_ref()
    }

    /// `count` records spread evenly from the first to the last.
    pub fn axis_samples(&self, count: usize) -> Vec<&WeatherRecord> {
        let data: Vec<_> = self.records().collect();
        if data.is_empty() || count == 0 {
            return Vec::new();
        }
        if count == 1 {
            return vec![data[0]];
        }

        (0..count)
            .map(|i| data[i * (data.len() - 1) / (count - 1)])
            .collect()
    }
}
