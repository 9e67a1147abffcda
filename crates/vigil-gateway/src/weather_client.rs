//! OpenWeather implementation of the weather lookup port.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use vigil_core::ports::WeatherProvider;
use vigil_core::weather::WeatherSnapshot;
use vigil_core::{Result, VigilError};

use crate::config::WeatherConfig;
use crate::http::error_from_response;

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current-weather client for the monitored site.
#[derive(Debug)]
pub struct OpenWeatherClient {
    client: Client,
    latitude: f64,
    longitude: f64,
    api_key: String,
}

#[derive(Deserialize)]
struct WeatherDto {
    name: String,
    weather: Vec<ConditionDto>,
    main: MainDto,
    wind: WindDto,
}

#[derive(Deserialize)]
struct ConditionDto {
    id: u32,
    description: String,
}

#[derive(Deserialize)]
struct MainDto {
    temp: f64,
}

#[derive(Deserialize)]
struct WindDto {
    speed: f64,
}

impl OpenWeatherClient {
    /// Creates a client from the weather configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no API key is set.
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            VigilError::config(
                "weather API key not set; add weather.api_key to config.toml \
                 or set OPENWEATHER_API_KEY",
            )
        })?;
        Ok(Self {
            client: Client::new(),
            latitude: config.latitude,
            longitude: config.longitude,
            api_key,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self) -> Result<WeatherSnapshot> {
        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("lat", self.latitude.to_string()),
                ("lon", self.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|err| VigilError::transport(format!("weather request failed: {err}")))?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let dto: WeatherDto = response
            .json()
            .await
            .map_err(|err| VigilError::malformed(format!("weather response: {err}")))?;
        into_snapshot(dto)
    }
}

fn into_snapshot(dto: WeatherDto) -> Result<WeatherSnapshot> {
    let condition = dto
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| VigilError::malformed("weather response carries no condition entry"))?;
    Ok(WeatherSnapshot {
        location_name: dto.name,
        condition_id: condition.id,
        condition_text: condition.description,
        temperature_c: dto.main.temp,
        wind_speed: dto.wind.speed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::weather::WeatherKind;

    #[test]
    fn maps_provider_response_to_snapshot() {
        let dto: WeatherDto = serde_json::from_str(
            r#"{
                "name": "Ballinger",
                "weather": [{"id": 804, "description": "overcast clouds", "main": "Clouds"}],
                "main": {"temp": 31.4, "humidity": 40},
                "wind": {"speed": 6.7, "deg": 180}
            }"#,
        )
        .unwrap();

        let snapshot = into_snapshot(dto).unwrap();
        assert_eq!(snapshot.location_name, "Ballinger");
        assert_eq!(snapshot.condition_id, 804);
        assert_eq!(snapshot.condition_text, "overcast clouds");
        assert_eq!(snapshot.temperature_c, 31.4);
        assert_eq!(snapshot.wind_speed, 6.7);
        assert_eq!(snapshot.kind(), WeatherKind::Clouds);
    }

    #[test]
    fn missing_condition_entry_is_malformed() {
        let dto: WeatherDto = serde_json::from_str(
            r#"{"name": "Ballinger", "weather": [], "main": {"temp": 20.0}, "wind": {"speed": 1.0}}"#,
        )
        .unwrap();
        assert!(into_snapshot(dto).unwrap_err().is_malformed());
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = OpenWeatherClient::new(&WeatherConfig::default()).unwrap_err();
        assert!(matches!(err, VigilError::Config(_)));
    }
}
