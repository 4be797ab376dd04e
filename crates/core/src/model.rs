//! Mission and GPS sample records shared by the stores, the daemon and the ticker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Lifecycle status of a mission.
///
/// Transitions are owned by whoever dispatches missions. The simulator only
/// reads the status and refuses to move anything that is not `in-progress`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MissionStatus {
    /// Created, not yet dispatched.
    Planned,
    /// Vehicle is on the road; the only status the simulator advances.
    InProgress,
    /// Finished by the dispatcher.
    Completed,
    /// Abandoned before completion.
    Cancelled,
}

impl MissionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [MissionStatus; 4] = [
        MissionStatus::Planned,
        MissionStatus::InProgress,
        MissionStatus::Completed,
        MissionStatus::Cancelled,
    ];

    /// Wire spelling, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Planned => "planned",
            MissionStatus::InProgress => "in-progress",
            MissionStatus::Completed => "completed",
            MissionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MissionStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    /// Latitude, degrees.
    pub lat: f64,
    /// Longitude, degrees.
    pub lng: f64,
}

impl LatLng {
    /// Point at `(lat, lng)`.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Euclidean distance in degree space. Not a geodesic distance.
    pub fn planar_distance(&self, other: &LatLng) -> f64 {
        let d_lat = other.lat - self.lat;
        let d_lng = other.lng - self.lng;
        (d_lat * d_lat + d_lng * d_lng).sqrt()
    }
}

/// Mission record as stored by the mission store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mission {
    /// Mission identifier (UUID v4 when issued by the daemon).
    pub id: String,
    /// Current lifecycle status.
    pub status: MissionStatus,

    /// Human label of the departure place, e.g. "Paris".
    #[serde(default)]
    pub origin: Option<String>,
    /// Departure latitude.
    pub origin_lat: f64,
    /// Departure longitude.
    pub origin_lng: f64,

    /// Human label of the arrival place.
    #[serde(default)]
    pub destination: Option<String>,
    /// Arrival latitude.
    pub destination_lat: f64,
    /// Arrival longitude.
    pub destination_lng: f64,

    /// Vehicle carrying out the mission; copied onto every sample.
    pub vehicle_id: String,
    /// Assigned driver, if any.
    #[serde(default)]
    pub driver_id: Option<String>,

    /// Creation time, unix epoch milliseconds.
    pub created_at_ms: i64,
}

impl Mission {
    /// Departure coordinates.
    pub fn origin_point(&self) -> LatLng {
        LatLng::new(self.origin_lat, self.origin_lng)
    }

    /// Arrival coordinates.
    pub fn destination_point(&self) -> LatLng {
        LatLng::new(self.destination_lat, self.destination_lng)
    }

    /// Explicit label/value pairs for display, in a stable order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let label = |name: &Option<String>, lat: f64, lng: f64| match name {
            Some(n) => format!("{n} ({lat:.5}, {lng:.5})"),
            None => format!("({lat:.5}, {lng:.5})"),
        };
        vec![
            ("Mission", self.id.clone()),
            ("Status", self.status.to_string()),
            ("Origin", label(&self.origin, self.origin_lat, self.origin_lng)),
            (
                "Destination",
                label(&self.destination, self.destination_lat, self.destination_lng),
            ),
            ("Vehicle", self.vehicle_id.clone()),
            (
                "Driver",
                self.driver_id.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ]
    }
}

/// Request body for creating a mission. Status defaults to `planned`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMission {
    /// Initial status; `planned` when omitted.
    #[serde(default)]
    pub status: Option<MissionStatus>,
    /// See [`Mission::origin`].
    #[serde(default)]
    pub origin: Option<String>,
    /// See [`Mission::origin_lat`].
    pub origin_lat: f64,
    /// See [`Mission::origin_lng`].
    pub origin_lng: f64,
    /// See [`Mission::destination`].
    #[serde(default)]
    pub destination: Option<String>,
    /// See [`Mission::destination_lat`].
    pub destination_lat: f64,
    /// See [`Mission::destination_lng`].
    pub destination_lng: f64,
    /// See [`Mission::vehicle_id`].
    pub vehicle_id: String,
    /// See [`Mission::driver_id`].
    #[serde(default)]
    pub driver_id: Option<String>,
}

impl NewMission {
    /// Build the stored record once the id and creation time are known.
    pub fn into_mission(self, id: String, created_at_ms: i64) -> Mission {
        Mission {
            id,
            status: self.status.unwrap_or(MissionStatus::Planned),
            origin: self.origin,
            origin_lat: self.origin_lat,
            origin_lng: self.origin_lng,
            destination: self.destination,
            destination_lat: self.destination_lat,
            destination_lng: self.destination_lng,
            vehicle_id: self.vehicle_id,
            driver_id: self.driver_id,
            created_at_ms,
        }
    }
}

/// One simulated GPS sample. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpsPosition {
    /// ULID assigned by the store at insert.
    pub id: String,
    /// Mission this sample belongs to.
    pub mission_id: String,
    /// Vehicle of that mission.
    pub vehicle_id: String,
    /// Latitude, degrees.
    pub latitude: f64,
    /// Longitude, degrees.
    pub longitude: f64,
    /// km/h
    pub speed: u32,
    /// Compass bearing in whole degrees, `0..360`.
    pub heading: u32,
    /// Unix epoch milliseconds; never decreases within a mission.
    pub timestamp_ms: i64,
    /// 1-based position of this sample within its mission.
    pub seq: u64,
}

impl GpsPosition {
    /// Sample coordinates.
    pub fn point(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Position row before the store has assigned an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewGpsPosition {
    /// See [`GpsPosition::mission_id`].
    pub mission_id: String,
    /// See [`GpsPosition::vehicle_id`].
    pub vehicle_id: String,
    /// See [`GpsPosition::latitude`].
    pub latitude: f64,
    /// See [`GpsPosition::longitude`].
    pub longitude: f64,
    /// See [`GpsPosition::speed`].
    pub speed: u32,
    /// See [`GpsPosition::heading`].
    pub heading: u32,
    /// See [`GpsPosition::timestamp_ms`].
    pub timestamp_ms: i64,
    /// See [`GpsPosition::seq`].
    pub seq: u64,
}

impl NewGpsPosition {
    /// Attach the store-assigned id.
    pub fn into_position(self, id: String) -> GpsPosition {
        GpsPosition {
            id,
            mission_id: self.mission_id,
            vehicle_id: self.vehicle_id,
            latitude: self.latitude,
            longitude: self.longitude,
            speed: self.speed,
            heading: self.heading,
            timestamp_ms: self.timestamp_ms,
            seq: self.seq,
        }
    }
}
