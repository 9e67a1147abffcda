//! Boundary clients for the Vigil operator console.
//!
//! Implements the ports declared in `vigil-core` against real collaborators:
//! the operations backend (event feed, log store, investigation stream) and
//! the third-party weather provider. Configuration for all of them lives in
//! [`config::ConsoleConfig`].

pub mod backend_client;
pub mod config;
mod http;
pub mod sse;
pub mod stream_transport;
pub mod weather_client;

pub use backend_client::BackendClient;
pub use config::{ConsoleConfig, WeatherConfig};
pub use stream_transport::SseInvestigationStream;
pub use weather_client::OpenWeatherClient;
