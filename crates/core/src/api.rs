//! Request and response bodies of the daemon's HTTP API.

use serde::{Deserialize, Serialize};

use crate::advance::Advance;
use crate::model::{GpsPosition, Mission, MissionStatus};

/// Body of `POST /v1/simulate-gps`.
///
/// `mission_id` is optional on the wire so a missing id can be reported as a
/// domain error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvanceRequest {
    /// Mission to advance.
    #[serde(default)]
    pub mission_id: Option<String>,
}

/// Response of `POST /v1/simulate-gps`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AdvanceResponse {
    /// A sample was recorded.
    Moved(MovedResponse),
    /// The vehicle is at its destination; nothing was recorded.
    Arrived(ArrivedResponse),
}

/// `{ "success": true, "position": .., "distance_remaining": .. }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovedResponse {
    /// Always `true`.
    pub success: bool,
    /// The sample just appended.
    pub position: GpsPosition,
    /// Planar distance (degrees) to the destination before this step.
    pub distance_remaining: f64,
}

/// `{ "message": "Arrived at destination", "arrived": true }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArrivedResponse {
    /// Always [`ARRIVED_MESSAGE`].
    pub message: String,
    /// Always `true`.
    pub arrived: bool,
}

/// Message sent back when a vehicle has arrived.
pub const ARRIVED_MESSAGE: &str = "Arrived at destination";

impl From<Advance> for AdvanceResponse {
    fn from(value: Advance) -> Self {
        match value {
            Advance::Arrived { .. } => AdvanceResponse::Arrived(ArrivedResponse {
                message: ARRIVED_MESSAGE.to_string(),
                arrived: true,
            }),
            Advance::Moved {
                position,
                distance_remaining,
            } => AdvanceResponse::Moved(MovedResponse {
                success: true,
                position,
                distance_remaining,
            }),
        }
    }
}

/// Error body returned with every non-success status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
}

/// Query for `GET /v1/missions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionQuery {
    /// Only return missions with this status.
    #[serde(default)]
    pub status: Option<MissionStatus>,
}

/// Body of `POST /v1/missions/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    /// New status.
    pub status: MissionStatus,
}

/// One row of `GET /v1/fleet`: an in-progress mission and where its vehicle is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetEntry {
    /// The mission.
    pub mission: Mission,
    /// `None` until the first sample has been recorded.
    pub position: Option<GpsPosition>,
}
