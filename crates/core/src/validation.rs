//! Input checks run before anything reaches a store.

use crate::model::NewMission;
use crate::sim::StepParams;

/// Input rejected before it reaches a store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Mission creation request broke one or more rules.
    #[error("invalid mission: {}", .0.join("; "))]
    Mission(Vec<String>),
    /// Simulator tunables out of range.
    #[error("invalid step parameters: {}", .0.join("; "))]
    StepParams(Vec<String>),
    /// Status spelling not recognised.
    #[error("unknown mission status '{0}' (expected planned, in-progress, completed or cancelled)")]
    UnknownStatus(String),
}

/// Validate a mission creation request.
///
/// Rules:
/// - Coordinates must be finite, latitudes within [-90, 90], longitudes within [-180, 180].
/// - `vehicle_id` must not be blank.
pub fn validate_new_mission(req: &NewMission) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    check_lat(&mut violations, "origin_lat", req.origin_lat);
    check_lng(&mut violations, "origin_lng", req.origin_lng);
    check_lat(&mut violations, "destination_lat", req.destination_lat);
    check_lng(&mut violations, "destination_lng", req.destination_lng);

    if req.vehicle_id.trim().is_empty() {
        violations.push("vehicle_id must not be empty".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Mission(violations))
    }
}

/// Validate simulator tunables (e.g. from the command line).
pub fn validate_step_params(params: &StepParams) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if !(params.step_fraction > 0.0 && params.step_fraction <= 1.0) {
        violations.push(format!(
            "step_fraction {} must be in (0, 1]",
            params.step_fraction
        ));
    }
    if !params.jitter.is_finite() || params.jitter < 0.0 {
        violations.push(format!("jitter {} must be finite and >= 0", params.jitter));
    }
    if !params.arrival_threshold.is_finite() || params.arrival_threshold <= 0.0 {
        violations.push(format!(
            "arrival_threshold {} must be finite and > 0",
            params.arrival_threshold
        ));
    }
    if params.speed_kmh.is_empty() {
        violations.push(format!(
            "speed range {}..{} is empty",
            params.speed_kmh.start, params.speed_kmh.end
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::StepParams(violations))
    }
}

fn check_lat(out: &mut Vec<String>, field: &str, value: f64) {
    check_range(out, field, value, -90.0, 90.0);
}

fn check_lng(out: &mut Vec<String>, field: &str, value: f64) {
    check_range(out, field, value, -180.0, 180.0);
}

fn check_range(out: &mut Vec<String>, field: &str, value: f64, min: f64, max: f64) {
    if !value.is_finite() {
        out.push(format!("{field} must be a finite number"));
    } else if value < min || value > max {
        out.push(format!("{field} = {value} is outside [{min}, {max}]"));
    }
}
