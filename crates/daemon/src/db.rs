use anyhow::Context;
use fleetsim_core::model::{GpsPosition, Mission, MissionStatus, NewGpsPosition};
use fleetsim_core::new_ulid;
use fleetsim_core::store::{MissionStore, PositionStore};
use serde::{Deserialize, Serialize};
use surrealdb::{engine::any, Surreal};

/// Database wrapper for embedded SurrealDB.
#[derive(Clone)]
pub struct Db {
    inner: Surreal<any::Any>,
}

// Rows carry their own key fields; the SurrealDB record id is never read back.

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MissionRow {
    mission_id: String,
    status: MissionStatus,
    #[serde(default)]
    origin: Option<String>,
    origin_lat: f64,
    origin_lng: f64,
    #[serde(default)]
    destination: Option<String>,
    destination_lat: f64,
    destination_lng: f64,
    vehicle_id: String,
    #[serde(default)]
    driver_id: Option<String>,
    created_at_ms: i64,
}

impl From<Mission> for MissionRow {
    fn from(m: Mission) -> Self {
        Self {
            mission_id: m.id,
            status: m.status,
            origin: m.origin,
            origin_lat: m.origin_lat,
            origin_lng: m.origin_lng,
            destination: m.destination,
            destination_lat: m.destination_lat,
            destination_lng: m.destination_lng,
            vehicle_id: m.vehicle_id,
            driver_id: m.driver_id,
            created_at_ms: m.created_at_ms,
        }
    }
}

impl From<MissionRow> for Mission {
    fn from(r: MissionRow) -> Self {
        Self {
            id: r.mission_id,
            status: r.status,
            origin: r.origin,
            origin_lat: r.origin_lat,
            origin_lng: r.origin_lng,
            destination: r.destination,
            destination_lat: r.destination_lat,
            destination_lng: r.destination_lng,
            vehicle_id: r.vehicle_id,
            driver_id: r.driver_id,
            created_at_ms: r.created_at_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PositionRow {
    position_id: String,
    mission_id: String,
    vehicle_id: String,
    latitude: f64,
    longitude: f64,
    speed: u32,
    heading: u32,
    timestamp_ms: i64,
    seq: u64,
}

impl From<PositionRow> for GpsPosition {
    fn from(r: PositionRow) -> Self {
        Self {
            id: r.position_id,
            mission_id: r.mission_id,
            vehicle_id: r.vehicle_id,
            latitude: r.latitude,
            longitude: r.longitude,
            speed: r.speed,
            heading: r.heading,
            timestamp_ms: r.timestamp_ms,
            seq: r.seq,
        }
    }
}

impl Db {
    /// Connect to SurrealDB at `endpoint`.
    ///
    /// `surrealkv://<dir>` opens (and creates) an on-disk store, `mem://` a
    /// throwaway in-memory one.
    pub async fn connect(endpoint: &str) -> anyhow::Result<Self> {
        if let Some(dir) = endpoint.strip_prefix("surrealkv://") {
            std::fs::create_dir_all(dir).with_context(|| format!("creating db dir {dir}"))?;
        }

        let db = any::connect(endpoint.to_string())
            .await
            .with_context(|| format!("connecting to {endpoint}"))?;
        db.use_ns("fleetsim")
            .use_db("fleetsim")
            .await
            .context("selecting surreal namespace/db")?;
        Ok(Self { inner: db })
    }

    /// Apply schema at startup.
    pub async fn apply_schema(&self) -> anyhow::Result<()> {
        let schema = include_str!("../schema.surql");
        self.inner
            .query(schema)
            .await
            .context("applying schema")?
            .check()
            .context("applying schema")?;
        Ok(())
    }

    pub async fn create_mission(&self, mission: Mission) -> anyhow::Result<Mission> {
        self.inner
            .query("CREATE mission CONTENT $row RETURN NONE;")
            .bind(("row", MissionRow::from(mission.clone())))
            .await
            .context("creating mission")?
            .check()
            .with_context(|| format!("creating mission {}", mission.id))?;
        Ok(mission)
    }

    pub async fn get_mission(&self, mission_id: &str) -> anyhow::Result<Option<Mission>> {
        let mut res = self
            .inner
            .query("SELECT * FROM mission WHERE mission_id = $id LIMIT 1;")
            .bind(("id", mission_id.to_string()))
            .await?;
        let row: Option<MissionRow> = res.take(0)?;
        Ok(row.map(Mission::from))
    }

    /// Missions ordered by creation time, optionally restricted to one status.
    pub async fn list_missions(
        &self,
        status: Option<MissionStatus>,
    ) -> anyhow::Result<Vec<Mission>> {
        let mut res = match status {
            Some(status) => {
                self.inner
                    .query(
                        "SELECT * FROM mission WHERE status = $status ORDER BY created_at_ms ASC;",
                    )
                    .bind(("status", status))
                    .await?
            }
            None => {
                self.inner
                    .query("SELECT * FROM mission ORDER BY created_at_ms ASC;")
                    .await?
            }
        };
        let rows: Vec<MissionRow> = res.take(0)?;
        Ok(rows.into_iter().map(Mission::from).collect())
    }

    /// Returns the updated mission, or `None` if it does not exist.
    pub async fn set_mission_status(
        &self,
        mission_id: &str,
        status: MissionStatus,
    ) -> anyhow::Result<Option<Mission>> {
        let mut res = self
            .inner
            .query("UPDATE mission SET status = $status WHERE mission_id = $id RETURN AFTER;")
            .bind(("id", mission_id.to_string()))
            .bind(("status", status))
            .await?;
        let rows: Vec<MissionRow> = res.take(0)?;
        Ok(rows.into_iter().next().map(Mission::from))
    }

    pub async fn latest_position_for(
        &self,
        mission_id: &str,
    ) -> anyhow::Result<Option<GpsPosition>> {
        let mut res = self
            .inner
            .query(
                "SELECT * FROM gps_position WHERE mission_id = $mission_id \
                 ORDER BY timestamp_ms DESC, seq DESC LIMIT 1;",
            )
            .bind(("mission_id", mission_id.to_string()))
            .await?;
        let row: Option<PositionRow> = res.take(0)?;
        Ok(row.map(GpsPosition::from))
    }

    pub async fn append_position(&self, position: NewGpsPosition) -> anyhow::Result<GpsPosition> {
        let row = PositionRow {
            position_id: new_ulid().to_string(),
            mission_id: position.mission_id,
            vehicle_id: position.vehicle_id,
            latitude: position.latitude,
            longitude: position.longitude,
            speed: position.speed,
            heading: position.heading,
            timestamp_ms: position.timestamp_ms,
            seq: position.seq,
        };
        self.inner
            .query("CREATE gps_position CONTENT $row RETURN NONE;")
            .bind(("row", row.clone()))
            .await
            .context("inserting gps position")?
            .check()
            .context("inserting gps position")?;
        Ok(row.into())
    }

    /// Every in-progress mission with its current position.
    pub async fn fleet_status(&self) -> anyhow::Result<Vec<(Mission, Option<GpsPosition>)>> {
        let missions = self.list_missions(Some(MissionStatus::InProgress)).await?;
        let mut out = Vec::with_capacity(missions.len());
        for mission in missions {
            let position = self.latest_position_for(&mission.id).await?;
            out.push((mission, position));
        }
        Ok(out)
    }
}

impl MissionStore for Db {
    async fn mission(&self, id: &str) -> anyhow::Result<Option<Mission>> {
        self.get_mission(id).await
    }
}

impl PositionStore for Db {
    async fn latest_position(&self, mission_id: &str) -> anyhow::Result<Option<GpsPosition>> {
        self.latest_position_for(mission_id).await
    }

    async fn insert_position(&self, position: NewGpsPosition) -> anyhow::Result<GpsPosition> {
        self.append_position(position).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsim_core::sim::StepParams;
    use fleetsim_core::{Advance, AdvanceError, Advancer};

    async fn mem_db() -> Db {
        let db = Db::connect("mem://").await.unwrap();
        db.apply_schema().await.unwrap();
        db
    }

    fn mission(id: &str, status: MissionStatus, created_at_ms: i64) -> Mission {
        Mission {
            id: id.into(),
            status,
            origin: Some("Paris".into()),
            origin_lat: 48.8566,
            origin_lng: 2.3522,
            destination: Some("Lyon".into()),
            destination_lat: 45.764,
            destination_lng: 4.8357,
            vehicle_id: "veh-1".into(),
            driver_id: None,
            created_at_ms,
        }
    }

    fn sample(mission_id: &str, lat: f64, timestamp_ms: i64, seq: u64) -> NewGpsPosition {
        NewGpsPosition {
            mission_id: mission_id.into(),
            vehicle_id: "veh-1".into(),
            latitude: lat,
            longitude: 2.5,
            speed: 70,
            heading: 180,
            timestamp_ms,
            seq,
        }
    }

    #[tokio::test]
    async fn mission_round_trip() {
        let db = mem_db().await;
        let m = mission("m-1", MissionStatus::InProgress, 10);
        db.create_mission(m.clone()).await.unwrap();

        assert_eq!(db.get_mission("m-1").await.unwrap(), Some(m));
        assert_eq!(db.get_mission("m-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let db = mem_db().await;
        db.create_mission(mission("a", MissionStatus::InProgress, 1)).await.unwrap();
        db.create_mission(mission("b", MissionStatus::Planned, 2)).await.unwrap();
        db.create_mission(mission("c", MissionStatus::InProgress, 3)).await.unwrap();

        let all = db.list_missions(None).await.unwrap();
        assert_eq!(all.len(), 3);

        let active: Vec<_> = db
            .list_missions(Some(MissionStatus::InProgress))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(active, ["a", "c"]);
    }

    #[tokio::test]
    async fn set_status_updates_and_reports_missing() {
        let db = mem_db().await;
        db.create_mission(mission("m-1", MissionStatus::InProgress, 1)).await.unwrap();

        let updated = db
            .set_mission_status("m-1", MissionStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, MissionStatus::Completed);
        assert_eq!(
            db.get_mission("m-1").await.unwrap().unwrap().status,
            MissionStatus::Completed
        );
        assert!(db
            .set_mission_status("nope", MissionStatus::Completed)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn latest_position_orders_by_time_then_seq() {
        let db = mem_db().await;
        assert!(db.latest_position_for("m-1").await.unwrap().is_none());

        db.append_position(sample("m-1", 48.0, 1_000, 1)).await.unwrap();
        db.append_position(sample("m-1", 47.0, 2_000, 3)).await.unwrap();
        db.append_position(sample("m-1", 47.5, 2_000, 2)).await.unwrap();
        db.append_position(sample("other", 10.0, 9_000, 1)).await.unwrap();

        let latest = db.latest_position_for("m-1").await.unwrap().unwrap();
        assert_eq!(latest.seq, 3);
        assert_eq!(latest.latitude, 47.0);
        assert_eq!(latest.mission_id, "m-1");
    }

    #[tokio::test]
    async fn fleet_status_pairs_missions_with_positions() {
        let db = mem_db().await;
        db.create_mission(mission("a", MissionStatus::InProgress, 1)).await.unwrap();
        db.create_mission(mission("b", MissionStatus::InProgress, 2)).await.unwrap();
        db.create_mission(mission("c", MissionStatus::Completed, 3)).await.unwrap();
        db.append_position(sample("a", 48.0, 1_000, 1)).await.unwrap();

        let fleet = db.fleet_status().await.unwrap();
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet[0].0.id, "a");
        assert_eq!(fleet[0].1.as_ref().map(|p| p.seq), Some(1));
        assert_eq!(fleet[1].0.id, "b");
        assert!(fleet[1].1.is_none());
    }

    #[tokio::test]
    async fn advancer_runs_over_surreal() {
        let db = mem_db().await;
        db.create_mission(mission("m-1", MissionStatus::InProgress, 1)).await.unwrap();
        db.create_mission(mission("m-2", MissionStatus::Planned, 2)).await.unwrap();
        let adv = Advancer::new(db.clone(), StepParams::default());

        for seq in 1..=3u64 {
            let Advance::Moved { position, .. } = adv.advance("m-1").await.unwrap() else {
                panic!("expected a move");
            };
            assert_eq!(position.seq, seq);
        }
        let latest = db.latest_position_for("m-1").await.unwrap().unwrap();
        assert_eq!(latest.seq, 3);

        assert!(matches!(
            adv.advance("m-2").await,
            Err(AdvanceError::InvalidState { .. })
        ));
        assert!(db.latest_position_for("m-2").await.unwrap().is_none());
        assert!(matches!(
            adv.advance("missing").await,
            Err(AdvanceError::NotFound(_))
        ));
    }
}
