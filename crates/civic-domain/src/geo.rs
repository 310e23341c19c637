//! Geographic coordinates and great-circle distance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 point. Construct through [`Coordinates::new`] or `FromStr` to get range checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLocation {
    #[error("location must be \"latitude, longitude\"")]
    Malformed,
    #[error("latitude must be within -90..=90")]
    LatitudeOutOfRange,
    #[error("longitude must be within -180..=180")]
    LongitudeOutOfRange,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidLocation> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidLocation::LatitudeOutOfRange);
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidLocation::LongitudeOutOfRange);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Haversine great-circle distance in kilometres.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Encoded as `"lat, lon"`, the format the map widget submits.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = InvalidLocation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s.split_once(',').ok_or(InvalidLocation::Malformed)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| InvalidLocation::Malformed)?;
        let longitude: f64 = lon.trim().parse().map_err(|_| InvalidLocation::Malformed)?;
        Self::new(latitude, longitude)
    }
}
