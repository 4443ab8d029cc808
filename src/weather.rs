//! Live weather enrichment via the Open-Meteo forecast API.
//!
//! Best-effort by contract: the lookup is bounded by a short timeout and any
//! failure degrades by omission; a request never fails because weather data
//! could not be fetched.

use serde::Deserialize;

use crate::pipeline::types::WeatherReading;
use crate::pipeline::AssistantError;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// The only timeout enforced in this layer. Enrichment is bounded and short;
/// everything else runs to the backend's own limits.
const LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Best-effort external data lookup keyed by coordinates.
///
/// `lookup` is a blocking call; callers dispatch it via `spawn_blocking` and
/// absorb `EnrichmentUnavailable` into "no enrichment section".
pub trait EnrichmentProvider: Send + Sync {
    fn lookup(&self, latitude: f64, longitude: f64) -> Result<WeatherReading, AssistantError>;
}

/// Open-Meteo backed provider for current temperature and relative humidity.
pub struct OpenMeteoProvider {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

#[derive(Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self::with_base_url(OPEN_METEO_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.to_string(),
            client,
        }
    }
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrichmentProvider for OpenMeteoProvider {
    fn lookup(&self, latitude: f64, longitude: f64) -> Result<WeatherReading, AssistantError> {
        let url = format!(
            "{}?latitude={latitude}&longitude={longitude}&current=temperature_2m,relative_humidity_2m",
            self.base_url
        );

        let response = self.client.get(&url).send().map_err(|e| {
            tracing::debug!(error = %e, "Weather lookup failed");
            AssistantError::EnrichmentUnavailable
        })?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Weather lookup rejected");
            return Err(AssistantError::EnrichmentUnavailable);
        }

        let parsed: ForecastResponse = response
            .json()
            .map_err(|_| AssistantError::EnrichmentUnavailable)?;

        match parsed.current {
            Some(CurrentConditions {
                temperature_2m: Some(temperature_c),
                relative_humidity_2m: Some(humidity_pct),
            }) => Ok(WeatherReading {
                temperature_c,
                humidity_pct,
            }),
            _ => Err(AssistantError::EnrichmentUnavailable),
        }
    }
}

/// Fixed-value provider for testing.
pub struct FixedWeather(pub Option<WeatherReading>);

impl EnrichmentProvider for FixedWeather {
    fn lookup(&self, _latitude: f64, _longitude: f64) -> Result<WeatherReading, AssistantError> {
        self.0.ok_or(AssistantError::EnrichmentUnavailable)
    }
}
