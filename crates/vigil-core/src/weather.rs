//! Site weather snapshot model.
//!
//! The console shows current conditions at the monitored site next to the
//! event feed. The snapshot is fetched from a third-party provider; only the
//! fields the console renders are modeled here.

use serde::{Deserialize, Serialize};

/// Current conditions at the monitored site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Human-readable location name reported by the provider
    pub location_name: String,
    /// Provider condition code (OpenWeather id ranges)
    pub condition_id: u32,
    /// Free-text condition description (e.g. "scattered clouds")
    pub condition_text: String,
    /// Temperature in degrees Celsius
    pub temperature_c: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
}

/// Coarse condition bucket derived from the provider's condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherKind {
    Thunderstorm,
    Rain,
    Snow,
    Fog,
    Clear,
    Clouds,
}

impl WeatherKind {
    /// Buckets an OpenWeather condition id.
    ///
    /// Id ranges: 2xx thunderstorm, 3xx/5xx rain and drizzle, 6xx snow,
    /// 7xx atmospheric obscuration, 800 clear, above 800 clouds. Codes
    /// below 200 do not occur; they bucket as clear.
    pub fn from_condition_id(id: u32) -> Self {
        match id {
            200..=299 => Self::Thunderstorm,
            300..=599 => Self::Rain,
            600..=699 => Self::Snow,
            700..=799 => Self::Fog,
            801.. => Self::Clouds,
            _ => Self::Clear,
        }
    }
}

impl WeatherSnapshot {
    /// Coarse condition bucket for display.
    pub fn kind(&self) -> WeatherKind {
        WeatherKind::from_condition_id(self.condition_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_condition_id_ranges() {
        assert_eq!(WeatherKind::from_condition_id(200), WeatherKind::Thunderstorm);
        assert_eq!(WeatherKind::from_condition_id(299), WeatherKind::Thunderstorm);
        assert_eq!(WeatherKind::from_condition_id(300), WeatherKind::Rain);
        assert_eq!(WeatherKind::from_condition_id(599), WeatherKind::Rain);
        assert_eq!(WeatherKind::from_condition_id(600), WeatherKind::Snow);
        assert_eq!(WeatherKind::from_condition_id(699), WeatherKind::Snow);
        assert_eq!(WeatherKind::from_condition_id(700), WeatherKind::Fog);
        assert_eq!(WeatherKind::from_condition_id(799), WeatherKind::Fog);
        assert_eq!(WeatherKind::from_condition_id(800), WeatherKind::Clear);
        assert_eq!(WeatherKind::from_condition_id(801), WeatherKind::Clouds);
        assert_eq!(WeatherKind::from_condition_id(804), WeatherKind::Clouds);
    }
}
