use async_trait::async_trait;

use crate::{Location, TemperatureUnit, WeatherError, WeatherRecord};

use super::WeatherProvider;

/// Serves one already-resolved record, e.g. to hand a single forecast
/// bucket to a component that expects a provider.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    record: WeatherRecord,
    location: Location,
    unit: TemperatureUnit,
}

impl StaticProvider {
    pub fn new(record: WeatherRecord) -> Self {
        let location = Location::named(0.0, 0.0, "Test Land");
        Self::with_location(record, location, TemperatureUnit::Celsius)
    }

    pub fn with_location(record: WeatherRecord, location: Location, unit: TemperatureUnit) -> Self {
        Self {
            record,
            location,
            unit,
        }
    }

    pub fn record(&self) -> &WeatherRecord {
        &self.record
    }
}

#[async_trait]
impl WeatherProvider for StaticProvider {
    fn location(&self) -> &Location {
        &self.location
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        self.unit
    }

    async fn get_weather(&self) -> Result<Vec<WeatherRecord>, WeatherError> {
        Ok(vec![self.record.clone()])
    }
}
