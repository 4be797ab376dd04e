//! The position advancer: one simulated GPS sample per call.

use crate::model::{GpsPosition, LatLng, MissionStatus, NewGpsPosition};
use crate::now_ms;
use crate::sim::{self, Step, StepParams};
use crate::store::{MissionStore, PositionStore};

/// Why a call to [`Advancer::advance`] did not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum AdvanceError {
    /// Empty or absent mission id. No store was touched.
    #[error("mission_id is required")]
    MissingInput,
    /// No mission with this id.
    #[error("mission '{0}' not found")]
    NotFound(String),
    /// The mission exists but is not `in-progress`.
    #[error("mission '{mission_id}' is not in progress (status: {status})")]
    InvalidState {
        /// Mission that was asked for.
        mission_id: String,
        /// Its current status.
        status: MissionStatus,
    },
    /// Reading the mission or its latest sample failed.
    #[error("store read failed: {0:#}")]
    StoreRead(anyhow::Error),
    /// Appending the new sample failed.
    #[error("failed to record position: {0:#}")]
    StoreWrite(anyhow::Error),
}

/// Result of one successful advance call.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Within the arrival threshold. Nothing was written.
    Arrived {
        /// Planar distance (degrees) to the destination.
        distance: f64,
    },
    /// A new sample was appended.
    Moved {
        /// The stored sample.
        position: GpsPosition,
        /// Planar distance (degrees) measured before the step.
        distance_remaining: f64,
    },
}

impl Advance {
    /// Whether the vehicle is at its destination.
    pub fn arrived(&self) -> bool {
        matches!(self, Advance::Arrived { .. })
    }
}

/// Moves simulated vehicles one step at a time.
///
/// Calls for the same mission must not overlap: two concurrent calls can read
/// the same last sample and both append. Different missions are independent.
///
/// Arrival never changes the mission status; completing a mission is left to
/// whoever owns mission lifecycle.
pub struct Advancer<S> {
    store: S,
    params: StepParams,
}

impl<S> Advancer<S>
where
    S: MissionStore + PositionStore,
{
    /// Advancer over `store` using `params` for every step.
    pub fn new(store: S, params: StepParams) -> Self {
        Self { store, params }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Compute and persist the next GPS sample for `mission_id`.
    pub async fn advance(&self, mission_id: &str) -> Result<Advance, AdvanceError> {
        if mission_id.is_empty() {
            return Err(AdvanceError::MissingInput);
        }

        let mission = self
            .store
            .mission(mission_id)
            .await
            .map_err(AdvanceError::StoreRead)?
            .ok_or_else(|| AdvanceError::NotFound(mission_id.to_string()))?;

        if mission.status != MissionStatus::InProgress {
            return Err(AdvanceError::InvalidState {
                mission_id: mission.id,
                status: mission.status,
            });
        }

        let last = self
            .store
            .latest_position(mission_id)
            .await
            .map_err(AdvanceError::StoreRead)?;

        let current = last
            .as_ref()
            .map(GpsPosition::point)
            .unwrap_or_else(|| mission.origin_point());

        match self.plan(current, mission.destination_point()) {
            Step::Arrived { distance } => {
                tracing::info!(mission_id = %mission.id, distance, "vehicle arrived at destination");
                Ok(Advance::Arrived { distance })
            }
            Step::Move {
                next,
                speed,
                heading,
                distance,
            } => {
                let now = now_ms();
                let (timestamp_ms, seq) = match &last {
                    Some(prev) => (now.max(prev.timestamp_ms), prev.seq + 1),
                    None => (now, 1),
                };

                let position = self
                    .store
                    .insert_position(NewGpsPosition {
                        mission_id: mission.id.clone(),
                        vehicle_id: mission.vehicle_id.clone(),
                        latitude: next.lat,
                        longitude: next.lng,
                        speed,
                        heading,
                        timestamp_ms,
                        seq,
                    })
                    .await
                    .map_err(AdvanceError::StoreWrite)?;

                tracing::debug!(
                    mission_id = %mission.id,
                    seq,
                    lat = position.latitude,
                    lng = position.longitude,
                    speed,
                    heading,
                    distance_remaining = distance,
                    "recorded gps position"
                );

                Ok(Advance::Moved {
                    position,
                    distance_remaining: distance,
                })
            }
        }
    }

    fn plan(&self, current: LatLng, destination: LatLng) -> Step {
        sim::plan_step(current, destination, &self.params, &mut rand::thread_rng())
    }
}
