use thiserror::Error;

/// Failures surfaced by [`crate::WeatherProvider::get_weather`].
///
/// An unrecognized sky condition is deliberately absent: it classifies as
/// [`crate::Day::Unknown`] instead of failing the whole fetch.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Upstream weather service unavailable ({status}): {body}")]
    UpstreamUnavailable {
        status: String,
        body: String,
    },

    #[error("Failed to reach upstream weather service")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed weather payload: {0}")]
    MalformedPayload(String),

    #[error("Metric '{field}' #{index} in {series} series has neither 'value' nor 'avg'")]
    MalformedMetric {
        series: &'static str,
        field: &'static str,
        index: usize,
    },

    #[error("Invalid weather record: {0}")]
    InvalidRecord(String),
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::MalformedPayload(err.to_string())
    }
}
