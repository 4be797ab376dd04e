//! Storage seams the advancer reads from and writes to.

use std::future::Future;

use crate::model::{GpsPosition, Mission, NewGpsPosition};

/// Read access to mission records.
pub trait MissionStore: Send + Sync {
    /// Mission by id, `None` when it does not exist.
    fn mission(&self, id: &str) -> impl Future<Output = anyhow::Result<Option<Mission>>> + Send;
}

/// Append-only log of GPS samples, keyed by mission.
pub trait PositionStore: Send + Sync {
    /// Most recent sample for a mission, ordered by `(timestamp_ms, seq)`.
    fn latest_position(
        &self,
        mission_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<GpsPosition>>> + Send;

    /// Append a sample and return it with its store-assigned id.
    fn insert_position(
        &self,
        position: NewGpsPosition,
    ) -> impl Future<Output = anyhow::Result<GpsPosition>> + Send;
}
