//! Numeric core of the GPS simulator.
//!
//! Everything here works in raw degree space: distances are the planar norm of
//! the latitude/longitude delta, not great-circle distances. The arrival
//! threshold of 0.01 is therefore "about a kilometre" only at mid latitudes.

use std::ops::Range;

use rand::Rng;

use crate::model::LatLng;

/// Tunables for one simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepParams {
    /// Fraction of the remaining vector covered per step.
    pub step_fraction: f64,
    /// Full width of the uniform per-axis noise, centred on zero.
    pub jitter: f64,
    /// Remaining planar distance (degrees) under which the vehicle has arrived.
    pub arrival_threshold: f64,
    /// Speed range in km/h, half-open.
    pub speed_kmh: Range<u32>,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            step_fraction: 0.02,
            jitter: 0.001,
            arrival_threshold: 0.01,
            speed_kmh: 60..100,
        }
    }
}

/// Outcome of planning one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Within the arrival threshold.
    Arrived {
        /// Planar distance to the destination.
        distance: f64,
    },
    /// Move to `next`.
    Move {
        /// Next position, jitter included.
        next: LatLng,
        /// km/h
        speed: u32,
        /// Bearing toward the destination, see [`heading_deg`].
        heading: u32,
        /// Planar distance before the step.
        distance: f64,
    },
}

/// Plan the next sample from `current` toward `destination`.
pub fn plan_step<R: Rng + ?Sized>(
    current: LatLng,
    destination: LatLng,
    params: &StepParams,
    rng: &mut R,
) -> Step {
    let d_lat = destination.lat - current.lat;
    let d_lng = destination.lng - current.lng;
    let distance = current.planar_distance(&destination);

    if distance < params.arrival_threshold {
        return Step::Arrived { distance };
    }

    let next = LatLng {
        lat: current.lat + d_lat * params.step_fraction + jitter(rng, params.jitter),
        lng: current.lng + d_lng * params.step_fraction + jitter(rng, params.jitter),
    };
    let speed = rng.gen_range(params.speed_kmh.clone());

    Step::Move {
        next,
        speed,
        heading: heading_deg(d_lat, d_lng),
        distance,
    }
}

/// Bearing of the delta vector in whole degrees, `0..360`.
///
/// Argument order is `atan2(d_lng, d_lat)`, so a pure latitude increase is 0
/// (north) and a pure longitude increase is 90 (east).
pub fn heading_deg(d_lat: f64, d_lng: f64) -> u32 {
    let raw = d_lng.atan2(d_lat).to_degrees();
    let normalized = (raw + 360.0) % 360.0;
    // 359.5.. rounds up to 360, which is north again.
    (normalized.round() as u32) % 360
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, amplitude: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * amplitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn still() -> StepParams {
        StepParams {
            jitter: 0.0,
            ..StepParams::default()
        }
    }

    #[test]
    fn heading_cardinal_directions() {
        assert_eq!(heading_deg(1.0, 0.0), 0);
        assert_eq!(heading_deg(0.0, 1.0), 90);
        assert_eq!(heading_deg(-1.0, 0.0), 180);
        assert_eq!(heading_deg(0.0, -1.0), 270);
        assert_eq!(heading_deg(1.0, 1.0), 45);
        assert_eq!(heading_deg(-1.0, -1.0), 225);
    }

    #[test]
    fn heading_handles_signed_zero_and_wraparound() {
        assert_eq!(heading_deg(1.0, -0.0), 0);
        assert_eq!(heading_deg(-1.0, -0.0), 180);
        // Just west of north: 359.9.. rounds to 360 and must wrap to 0.
        assert_eq!(heading_deg(1.0, -0.001), 0);
    }

    #[test]
    fn heading_always_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let d_lat = rng.gen_range(-10.0..10.0);
            let d_lng = rng.gen_range(-10.0..10.0);
            assert!(heading_deg(d_lat, d_lng) < 360);
        }
    }

    #[test]
    fn arrives_under_threshold() {
        let mut rng = StdRng::seed_from_u64(1);
        let dest = LatLng::new(45.0, 5.0);
        let cur = LatLng::new(45.005, 5.005);
        match plan_step(cur, dest, &StepParams::default(), &mut rng) {
            Step::Arrived { distance } => assert!(distance < 0.01),
            other => panic!("expected arrival, got {other:?}"),
        }
    }

    #[test]
    fn threshold_is_strict() {
        let mut rng = StdRng::seed_from_u64(1);
        let dest = LatLng::new(0.0, 0.0);
        let cur = LatLng::new(0.0, 0.01);
        assert!(matches!(
            plan_step(cur, dest, &still(), &mut rng),
            Step::Move { .. }
        ));
    }

    #[test]
    fn step_without_jitter_is_two_percent() {
        let mut rng = StdRng::seed_from_u64(3);
        let cur = LatLng::new(48.0, 2.0);
        let dest = LatLng::new(46.0, 4.0);
        let Step::Move {
            next,
            speed,
            heading,
            distance,
        } = plan_step(cur, dest, &still(), &mut rng)
        else {
            panic!("expected a move");
        };
        assert!((next.lat - 47.96).abs() < 1e-9);
        assert!((next.lng - 2.04).abs() < 1e-9);
        assert!((60..100).contains(&speed));
        assert_eq!(heading, 135);
        assert!((distance - 8f64.sqrt()).abs() < 1e-12);
        assert!(next.planar_distance(&dest) < distance);
    }

    #[test]
    fn jitter_stays_within_half_width() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = StepParams::default();
        let cur = LatLng::new(10.0, 10.0);
        let dest = LatLng::new(20.0, 10.0);
        for _ in 0..2_000 {
            let Step::Move { next, speed, .. } = plan_step(cur, dest, &params, &mut rng) else {
                panic!("expected a move");
            };
            assert!((next.lat - 10.2).abs() <= 0.0005);
            assert!((next.lng - 10.0).abs() <= 0.0005);
            assert!((60..100).contains(&speed));
        }
    }
}
