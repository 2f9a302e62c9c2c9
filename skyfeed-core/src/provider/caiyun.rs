//! CaiYun weather (<https://docs.caiyunapp.com>), a Chinese provider with a
//! free tier for personal use.
//!
//! One request returns a realtime snapshot plus hourly and daily series. Each
//! series is a set of parallel arrays that share an index per time bucket.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    Day, Location, TemperatureUnit, WeatherEffectiveness, WeatherError, WeatherRecord,
    model::{UV_MAX, UV_UNAVAILABLE},
};

use super::{CachedProvider, RefreshSource};

pub const DEFAULT_BASE_URL: &str = "https://api.caiyunapp.com";
const API_VERSION: &str = "v2.6";
const REQUEST_TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = concat!("skyfeed/", env!("CARGO_PKG_VERSION"));

/// CaiYun reports pressure in Pa; records carry hPa.
const PASCALS_PER_HPA: f64 = 100.0;

const DAILY_STEPS: &str = "3";
const HOURLY_STEPS: &str = "24";

/// CaiYun behind the time-to-live cache; what callers normally want.
pub type CaiYunProvider = CachedProvider<CaiYunSource>;

/// Build a cached CaiYun provider for `location`.
pub fn provider(
    location: Location,
    api_key: String,
    ttl: Duration,
) -> Result<CaiYunProvider, WeatherError> {
    Ok(CachedProvider::new(CaiYunSource::new(location, api_key)?, ttl))
}

/// Uncached access to the CaiYun weather endpoint.
#[derive(Debug, Clone)]
pub struct CaiYunSource {
    location: Location,
    api_key: String,
    base_url: String,
    http: Client,
}

impl CaiYunSource {
    pub fn new(location: Location, api_key: String) -> Result<Self, WeatherError> {
        Self::with_base_url(location, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        location: Location,
        api_key: String,
        base_url: &str,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            location,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/{}/{},{}/weather",
            self.base_url,
            API_VERSION,
            self.api_key,
            self.location.longitude,
            self.location.latitude
        )
    }
}

#[async_trait]
impl RefreshSource for CaiYunSource {
    fn location(&self) -> &Location {
        &self.location
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    async fn refresh(&self) -> Result<Vec<WeatherRecord>, WeatherError> {
        tracing::debug!(location = %self.location, "Requesting CaiYun weather");

        let res = self
            .http
            .get(self.endpoint())
            .query(&[
                ("dailysteps", DAILY_STEPS),
                ("hourlysteps", HOURLY_STEPS),
                ("minutely", "false"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::UpstreamUnavailable {
                status: status.to_string(),
                body: truncate_body(&body),
            });
        }

        parse_weather(&body, Local::now().fixed_offset())
    }
}

/// Map a CaiYun skycon code (<https://docs.caiyunapp.com/docs/tables/skycon/>)
/// to a [`Day`]. Codes that aren't recognized become [`Day::Unknown`].
pub fn classify_skycon(raw: &str) -> Day {
    let raw = raw.to_lowercase();

    // Day/night and intensity variants of these share a stem.
    if raw.contains("clear") {
        return Day::Clear;
    }
    if raw.contains("cloudy") {
        return Day::Cloudy;
    }
    if raw.contains("haze") {
        return Day::Hazy;
    }

    match raw.as_str() {
        "light_rain" => Day::LightlyRainy,
        "moderate_rain" => Day::Rainy,
        "heavy_rain" | "storm_rain" => Day::HeavilyRainy,
        "fog" => Day::Foggy,
        "light_snow" => Day::LightlySnowy,
        "moderate_snow" => Day::Snowy,
        "heavy_snow" | "storm_snow" => Day::HeavilySnowy,
        "dust" => Day::Dusty,
        "sand" => Day::Sandy,
        "wind" => Day::Windy,
        _ => {
            tracing::warn!("Unrecognized CaiYun skycon '{raw}'");
            Day::Unknown
        }
    }
}

/// Parse a CaiYun weather response body.
///
/// `now` becomes the time of the realtime record; the payload doesn't carry
/// one. Records come back as realtime, then hourly, then daily.
pub fn parse_weather(
    body: &str,
    now: DateTime<FixedOffset>,
) -> Result<Vec<WeatherRecord>, WeatherError> {
    let parsed: CyResponse = serde_json::from_str(body)?;

    if let Some(status) = parsed.status.as_deref().filter(|status| *status != "ok") {
        return Err(WeatherError::UpstreamUnavailable {
            status: status.to_string(),
            body: parsed.error.unwrap_or_default(),
        });
    }

    let result = parsed
        .result
        .ok_or_else(|| WeatherError::MalformedPayload("response has no 'result'".to_string()))?;

    let mut records = Vec::with_capacity(1 + result.hourly.len() + result.daily.len());
    records.push(result.realtime.into_record(now)?);
    result.hourly.collect_into(WeatherEffectiveness::Hourly, &mut records)?;
    result.daily.collect_into(WeatherEffectiveness::Daily, &mut records)?;

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct CyResponse {
    status: Option<String>,
    error: Option<String>,
    result: Option<CyResult>,
}

#[derive(Debug, Deserialize)]
struct CyResult {
    realtime: CyRealtime,
    hourly: CySeries,
    daily: CySeries,
}

#[derive(Debug, Deserialize)]
struct CyRealtime {
    temperature: f64,
    humidity: f64,
    /// Pascal.
    pressure: f64,
    skycon: String,
    life_index: CyLifeIndex,
}

#[derive(Debug, Deserialize)]
struct CyLifeIndex {
    ultraviolet: CyIndex,
}

#[derive(Debug, Deserialize)]
struct CyIndex {
    index: f64,
}

impl CyRealtime {
    fn into_record(self, now: DateTime<FixedOffset>) -> Result<WeatherRecord, WeatherError> {
        let uv_index = (self.life_index.ultraviolet.index.round() as i32).clamp(0, UV_MAX);

        WeatherRecord::new(
            now,
            WeatherEffectiveness::Current,
            classify_skycon(&self.skycon),
            self.temperature,
            self.humidity,
            self.pressure / PASCALS_PER_HPA,
            uv_index,
        )
    }
}

#[derive(Debug, Deserialize)]
struct CySeries {
    precipitation: Vec<CyStamp>,
    temperature: Vec<CyMetric<f64>>,
    humidity: Vec<CyMetric<f64>>,
    skycon: Vec<CyMetric<String>>,
    pressure: Vec<CyMetric<f64>>,
}

/// Only the time of a precipitation entry is used. Hourly entries carry a
/// `datetime`, daily ones a `date`.
#[derive(Debug, Deserialize)]
struct CyStamp {
    datetime: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CyMetric<T> {
    value: Option<T>,
    avg: Option<T>,
}

impl<T: Clone> CyMetric<T> {
    fn pick(
        &self,
        series: &'static str,
        field: &'static str,
        index: usize,
    ) -> Result<T, WeatherError> {
        self.value
            .as_ref()
            .or(self.avg.as_ref())
            .cloned()
            .ok_or(WeatherError::MalformedMetric {
                series,
                field,
                index,
            })
    }
}

impl CySeries {
    fn len(&self) -> usize {
        self.precipitation.len()
    }

    fn check_aligned(&self, series: &'static str) -> Result<(), WeatherError> {
        let expected = self.precipitation.len();
        let lengths = [
            ("temperature", self.temperature.len()),
            ("humidity", self.humidity.len()),
            ("skycon", self.skycon.len()),
            ("pressure", self.pressure.len()),
        ];

        for (field, found) in lengths {
            if found != expected {
                return Err(WeatherError::MalformedPayload(format!(
                    "{series} series has {expected} precipitation entries \
                     but {found} {field} entries"
                )));
            }
        }
        Ok(())
    }

    fn collect_into(
        self,
        effect: WeatherEffectiveness,
        records: &mut Vec<WeatherRecord>,
    ) -> Result<(), WeatherError> {
        let series = effect.as_str();
        self.check_aligned(series)?;

        let rows = self
            .precipitation
            .iter()
            .zip(&self.temperature)
            .zip(&self.humidity)
            .zip(&self.skycon)
            .zip(&self.pressure);

        for (index, ((((stamp, temperature), humidity), skycon), pressure)) in rows.enumerate() {
            let time = stamp.resolve(series, index)?;
            let skycon = skycon.pick(series, "skycon", index)?;
            let pressure = pressure.pick(series, "pressure", index)?;

            records.push(WeatherRecord::new(
                time,
                effect,
                classify_skycon(&skycon),
                temperature.pick(series, "temperature", index)?,
                humidity.pick(series, "humidity", index)?,
                pressure / PASCALS_PER_HPA,
                UV_UNAVAILABLE,
            )?);
        }

        Ok(())
    }
}

impl CyStamp {
    fn resolve(
        &self,
        series: &'static str,
        index: usize,
    ) -> Result<DateTime<FixedOffset>, WeatherError> {
        let raw = self
            .datetime
            .as_deref()
            .or(self.date.as_deref())
            .ok_or_else(|| {
                WeatherError::MalformedPayload(format!(
                    "{series} entry #{index} has neither 'datetime' nor 'date'"
                ))
            })?;

        parse_time(raw).ok_or_else(|| {
            WeatherError::MalformedPayload(format!(
                "{series} entry #{index} has unreadable time '{raw}'"
            ))
        })
    }
}

/// Accepts RFC 3339, CaiYun's minute-precision `2024-05-01T13:00+08:00`, and
/// offset-less date-times or dates, which are taken as local time.
fn parse_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time);
    }
    if let Ok(time) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Some(time);
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|time| time.fixed_offset())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
