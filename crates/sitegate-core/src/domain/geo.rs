//! Geographic value types: validated coordinates, observed positions, geofences.
//!
//! Coordinates are validated on construction and never clamped. A latitude of
//! 91 is a client bug, not GPS noise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Malformed coordinate input.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("latitude and longitude are required")]
    Missing,
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Validate and build a point. NaN and infinities fail the range check.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(CoordinateError::InvalidLatitude(latitude));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(CoordinateError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Re-check a point that arrived from storage rather than through `new`.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        Self::new(self.latitude, self.longitude).map(|_| ())
    }
}

/// Coarse quality bucket of a fix, derived from its reported accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GpsQuality {
    /// Device did not report an accuracy.
    Unknown,
    Good,
    Poor,
    VeryPoor,
}

impl GpsQuality {
    pub fn is_degraded(self) -> bool {
        matches!(self, GpsQuality::Poor | GpsQuality::VeryPoor)
    }
}

/// An observed GPS fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(flatten)]
    pub point: GeoPoint,

    /// Reported accuracy radius in meters, if the device supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// Device-side fix time, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        Ok(Self {
            point: GeoPoint::new(latitude, longitude)?,
            accuracy: None,
            timestamp: None,
        })
    }

    /// Attach an accuracy radius. Negative or non-finite values carry no
    /// information and are recorded as unknown.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy).filter(|a| a.is_finite() && *a >= 0.0);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn latitude(&self) -> f64 {
        self.point.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.point.longitude
    }
}

/// Circular boundary a project defines around its site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub center: GeoPoint,

    /// Radius in meters.
    pub radius: f64,

    #[serde(default = "default_strict_mode")]
    pub strict_mode: bool,

    /// Extra tolerance in meters. Ignored in strict mode.
    #[serde(default)]
    pub allowed_variance: f64,
}

fn default_strict_mode() -> bool {
    true
}

impl Geofence {
    pub fn strict(center: GeoPoint, radius: f64) -> Self {
        Self {
            center,
            radius,
            strict_mode: true,
            allowed_variance: 0.0,
        }
    }

    pub fn lenient(center: GeoPoint, radius: f64, allowed_variance: f64) -> Self {
        Self {
            center,
            radius,
            strict_mode: false,
            allowed_variance,
        }
    }

    /// Distance up to which a fix is admissible before any accuracy leniency.
    pub fn effective_radius(&self) -> f64 {
        if self.strict_mode {
            self.radius
        } else {
            self.radius + self.allowed_variance.max(0.0)
        }
    }
}
