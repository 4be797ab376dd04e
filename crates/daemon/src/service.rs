use fleetsim_core::{
    api::FleetEntry,
    model::{GpsPosition, Mission, MissionStatus, NewMission},
    new_mission_id, now_ms,
    sim::StepParams,
    validation::validate_new_mission,
    Advance, AdvanceError, Advancer,
};

use crate::db::Db;

/// Mission/position bookkeeping plus the GPS simulator.
pub struct FleetService {
    db: Db,
    advancer: Advancer<Db>,
}

impl FleetService {
    pub fn new(db: Db, step: StepParams) -> Self {
        Self {
            advancer: Advancer::new(db.clone(), step),
            db,
        }
    }

    /// One simulation tick for one mission.
    pub async fn simulate_gps(&self, mission_id: Option<String>) -> Result<Advance, AdvanceError> {
        let mission_id = mission_id.unwrap_or_default();
        tracing::info!(mission_id = %mission_id, "simulating gps");
        self.advancer.advance(&mission_id).await
    }

    pub async fn create_mission(&self, req: NewMission) -> anyhow::Result<Mission> {
        validate_new_mission(&req)?;
        let mission = req.into_mission(new_mission_id(), now_ms());
        let mission = self.db.create_mission(mission).await?;
        tracing::info!(mission_id = %mission.id, status = %mission.status, "mission created");
        Ok(mission)
    }

    pub async fn mission(&self, mission_id: &str) -> anyhow::Result<Option<Mission>> {
        self.db.get_mission(mission_id).await
    }

    pub async fn list_missions(&self, status: Option<MissionStatus>) -> anyhow::Result<Vec<Mission>> {
        self.db.list_missions(status).await
    }

    /// Status changes come from whoever owns the mission lifecycle; the
    /// simulator itself never calls this.
    pub async fn set_status(
        &self,
        mission_id: &str,
        status: MissionStatus,
    ) -> anyhow::Result<Option<Mission>> {
        let updated = self.db.set_mission_status(mission_id, status).await?;
        if updated.is_some() {
            tracing::info!(mission_id = %mission_id, status = %status, "mission status changed");
        }
        Ok(updated)
    }

    pub async fn current_position(&self, mission_id: &str) -> anyhow::Result<Option<GpsPosition>> {
        self.db.latest_position_for(mission_id).await
    }

    pub async fn fleet(&self) -> anyhow::Result<Vec<FleetEntry>> {
        let rows = self.db.fleet_status().await?;
        Ok(rows
            .into_iter()
            .map(|(mission, position)| FleetEntry { mission, position })
            .collect())
    }

    /// Demo helper: an in-progress Paris -> Lyon run for a fresh vehicle.
    pub async fn demo_mission(&self) -> anyhow::Result<Mission> {
        self.create_mission(demo_mission_request()).await
    }
}

fn demo_mission_request() -> NewMission {
    let suffix = new_mission_id();
    let short = &suffix[..8];
    NewMission {
        status: Some(MissionStatus::InProgress),
        origin: Some("Paris".into()),
        origin_lat: 48.8566,
        origin_lng: 2.3522,
        destination: Some("Lyon".into()),
        destination_lat: 45.764,
        destination_lng: 4.8357,
        vehicle_id: format!("demo-vehicle-{short}"),
        driver_id: Some(format!("demo-driver-{short}")),
    }
}
