//! Location lookup as a single fallible async call.

use crate::error::GeolocationError;
use crate::filters::Coordinates;
use async_trait::async_trait;

/// Source of the user's current position.
///
/// Failures are reported straight to the user; they are not retried.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Provider returning a preconfigured point, or a fixed failure.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    result: Result<Coordinates, GeolocationError>,
}

impl FixedLocation {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            result: Ok(coordinates),
        }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self { result: Err(error) }
    }

    /// Point built from optional CLI/config values. Missing axes make the
    /// provider report the location as unavailable.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>, radius_km: f64) -> Self {
        match Coordinates::from_parts(latitude, longitude, radius_km) {
            Some(coordinates) => Self::new(coordinates),
            None => Self::failing(GeolocationError::Unavailable(
                "latitude and longitude are both required".to_string(),
            )),
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        self.result.clone()
    }
}
