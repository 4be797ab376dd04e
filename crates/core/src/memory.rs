//! In-memory implementation of the store traits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::bail;

use crate::model::{GpsPosition, Mission, MissionStatus, NewGpsPosition};
use crate::new_ulid;
use crate::store::{MissionStore, PositionStore};

/// In-memory mission + position store. Not durable; meant for tests and demos.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    missions: HashMap<String, Mission>,
    positions: HashMap<String, Vec<GpsPosition>>,
    reject_writes: bool,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or replace a mission.
    pub fn put_mission(&self, mission: Mission) {
        self.lock().missions.insert(mission.id.clone(), mission);
    }

    /// Change a mission's status; unknown ids are ignored.
    pub fn set_status(&self, mission_id: &str, status: MissionStatus) {
        if let Some(m) = self.lock().missions.get_mut(mission_id) {
            m.status = status;
        }
    }

    /// Seed a sample directly, bypassing the simulator.
    pub fn put_position(&self, position: GpsPosition) {
        self.lock()
            .positions
            .entry(position.mission_id.clone())
            .or_default()
            .push(position);
    }

    /// All samples of a mission in insertion order.
    pub fn positions(&self, mission_id: &str) -> Vec<GpsPosition> {
        self.lock()
            .positions
            .get(mission_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of samples recorded for a mission.
    pub fn position_count(&self, mission_id: &str) -> usize {
        self.lock().positions.get(mission_id).map_or(0, Vec::len)
    }

    /// Make subsequent inserts fail, to exercise the write-failure path.
    pub fn reject_writes(&self, reject: bool) {
        self.lock().reject_writes = reject;
    }
}

impl MissionStore for MemoryStore {
    async fn mission(&self, id: &str) -> anyhow::Result<Option<Mission>> {
        Ok(self.lock().missions.get(id).cloned())
    }
}

impl PositionStore for MemoryStore {
    async fn latest_position(&self, mission_id: &str) -> anyhow::Result<Option<GpsPosition>> {
        Ok(self.lock().positions.get(mission_id).and_then(|rows| {
            rows.iter()
                .max_by_key(|p| (p.timestamp_ms, p.seq))
                .cloned()
        }))
    }

    async fn insert_position(&self, position: NewGpsPosition) -> anyhow::Result<GpsPosition> {
        let mut inner = self.lock();
        if inner.reject_writes {
            bail!("insert into positions rejected");
        }
        let row = position.into_position(new_ulid().to_string());
        inner
            .positions
            .entry(row.mission_id.clone())
            .or_default()
            .push(row.clone());
        Ok(row)
    }
}
