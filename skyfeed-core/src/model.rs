use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// UV index value used by buckets that don't report ultraviolet at all.
pub const UV_UNAVAILABLE: i32 = -1;

/// Highest UV index a record may carry.
pub const UV_MAX: i32 = 10;

/// A geographic query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub friendly_name: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            friendly_name: None,
        }
    }

    pub fn named(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            friendly_name: Some(name.into()),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.friendly_name {
            Some(name) => f.write_str(name),
            None => write!(f, "{}, {}", self.latitude, self.longitude),
        }
    }
}

/// Sky condition of a weather record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Day {
    Clear,
    Cloudy,
    LightlyRainy,
    Rainy,
    HeavilyRainy,
    SnowyRainy,
    LightlySnowy,
    Snowy,
    HeavilySnowy,
    Hazy,
    Foggy,
    Dusty,
    Sandy,
    Windy,
    Unknown,
}

impl Day {
    pub const fn all() -> &'static [Day] {
        &[
            Day::Clear,
            Day::Cloudy,
            Day::LightlyRainy,
            Day::Rainy,
            Day::HeavilyRainy,
            Day::SnowyRainy,
            Day::LightlySnowy,
            Day::Snowy,
            Day::HeavilySnowy,
            Day::Hazy,
            Day::Foggy,
            Day::Dusty,
            Day::Sandy,
            Day::Windy,
            Day::Unknown,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

/// Temporal bucket a record describes.
///
/// `Any` is only meaningful as a filter; records always carry one of the
/// concrete buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherEffectiveness {
    Current,
    Hourly,
    Daily,
    Any,
}

impl WeatherEffectiveness {
    /// Whether a record tagged `effect` passes this filter.
    pub fn matches(self, effect: WeatherEffectiveness) -> bool {
        self == WeatherEffectiveness::Any || self == effect
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherEffectiveness::Current => "current",
            WeatherEffectiveness::Hourly => "hourly",
            WeatherEffectiveness::Daily => "daily",
            WeatherEffectiveness::Any => "any",
        }
    }
}

impl std::fmt::Display for WeatherEffectiveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One point-in-time or periodic weather observation.
///
/// Temperature is expressed in the unit of the provider that produced the
/// record. Humidity is a fraction in `[0, 1]`, pressure is in hPa.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecord {
    time: DateTime<FixedOffset>,
    effect: WeatherEffectiveness,
    day: Day,
    temperature: f64,
    humidity: f64,
    pressure: f64,
    uv_index: i32,
}

impl WeatherRecord {
    pub fn new(
        time: DateTime<FixedOffset>,
        effect: WeatherEffectiveness,
        day: Day,
        temperature: f64,
        humidity: f64,
        pressure: f64,
        uv_index: i32,
    ) -> Result<Self, WeatherError> {
        if effect == WeatherEffectiveness::Any {
            return Err(WeatherError::InvalidRecord(
                "records must belong to a concrete bucket, not `any`".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&humidity) {
            return Err(WeatherError::InvalidRecord(format!(
                "humidity {humidity} is outside [0, 1]"
            )));
        }
        if !(UV_UNAVAILABLE..=UV_MAX).contains(&uv_index) {
            return Err(WeatherError::InvalidRecord(format!(
                "uv index {uv_index} is outside [{UV_UNAVAILABLE}, {UV_MAX}]"
            )));
        }

        Ok(Self {
            time,
            effect,
            day,
            temperature,
            humidity,
            pressure,
            uv_index,
        })
    }

    pub fn time(&self) -> DateTime<FixedOffset> {
        self.time
    }

    pub fn effect(&self) -> WeatherEffectiveness {
        self.effect
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// UV index, or [`UV_UNAVAILABLE`] when the bucket doesn't report it.
    pub fn uv_index(&self) -> i32 {
        self.uv_index
    }

    pub fn has_uv_index(&self) -> bool {
        self.uv_index != UV_UNAVAILABLE
    }
}
