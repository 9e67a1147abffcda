//! Application layer for the Vigil operator console.
//!
//! `ConsoleUseCase` is the single entry point a front end talks to; `wire`
//! assembles it from configuration with the real gateway clients.

mod console_usecase;

pub use console_usecase::{ConsoleUseCase, InvestigationView};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use vigil_core::investigation::{InvestigationController, InvestigationUpdate};
use vigil_core::ports::WeatherProvider;
use vigil_core::weather::WeatherSnapshot;
use vigil_core::{Result, VigilError};
use vigil_gateway::{BackendClient, ConsoleConfig, OpenWeatherClient, SseInvestigationStream};

/// Placeholder weather provider used when no API key is configured.
///
/// Keeps the console fully usable; only the weather command reports the
/// configuration error.
struct UnconfiguredWeather(VigilError);

#[async_trait]
impl WeatherProvider for UnconfiguredWeather {
    async fn current(&self) -> Result<WeatherSnapshot> {
        Err(self.0.clone())
    }
}

/// Builds the console use case and its update stream from configuration.
pub fn wire(
    config: &ConsoleConfig,
) -> (ConsoleUseCase, mpsc::UnboundedReceiver<InvestigationUpdate>) {
    let backend = Arc::new(BackendClient::new(&config.backend_url));
    let stream = Arc::new(SseInvestigationStream::new(&config.backend_url));
    let weather: Arc<dyn WeatherProvider> = match OpenWeatherClient::new(&config.weather) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            tracing::warn!(error = %err, "weather lookup unavailable");
            Arc::new(UnconfiguredWeather(err))
        }
    };

    let (controller, updates) = InvestigationController::new(stream);
    (
        ConsoleUseCase::new(backend, weather, Arc::new(controller)),
        updates,
    )
}
