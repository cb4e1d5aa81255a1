//! # Obstacle avoidance
//!
//! Two independent rules may override the setpoint the position controller sees:
//!
//! - [`ObstacleMonitor`] watches the forward range finder fan. When an obstacle lies
//!   in the direction of the target it side-steps to a detour point and holds it until
//!   the detour is reached. Its states are:
//!   - `Normal` - No override, the mission target is flown.
//!   - `Stopping` - An obstacle was just detected and the detour point computed.
//!   - `Avoiding` - The detour point is held until the vehicle reaches it.
//! - [`ClimbManeuver`] watches the downward range finder and raises the altitude
//!   target when the ground is too close.
//!
//! The forward rule owns latitude and longitude while the climb owns altitude, see
//! [`compose_setpoint`].

mod climb;
mod sector;

pub use climb::ClimbManeuver;
pub use sector::{sector_for, Sector};

use crate::{
    geo::{bearing_slope, perpendicular_offset, LocalFrame},
    params::AvoidanceParams,
    state::Setpoint,
};
use log::{info, warn};
use nalgebra::{Vector2, Vector3};

/// Number of forward rays checked for an obstacle.
pub const FORWARD_RAYS: usize = 5;

/// State of the forward avoidance state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AvoidanceState {
    Normal,
    Stopping {
        detour: Vector3<f64>,
    },
    Avoiding {
        detour: Vector3<f64>,
        /// Consecutive ticks spent at the detour point.
        dwell: u32,
    },
}

impl AvoidanceState {
    pub fn detour(&self) -> Option<Vector3<f64>> {
        match self {
            AvoidanceState::Normal => None,
            AvoidanceState::Stopping { detour } | AvoidanceState::Avoiding { detour, .. } => {
                Some(*detour)
            }
        }
    }
}

/// Forward obstacle state machine.
#[derive(Clone, Debug)]
pub struct ObstacleMonitor {
    state: AvoidanceState,
    last_point: Option<Vector3<f64>>,
    frame: LocalFrame,
    params: AvoidanceParams,
}

impl ObstacleMonitor {
    pub fn new(params: &AvoidanceParams, frame: LocalFrame) -> Self {
        Self {
            state: AvoidanceState::Normal,
            last_point: None,
            frame,
            params: params.clone(),
        }
    }

    pub fn state(&self) -> AvoidanceState {
        self.state
    }

    /// Returns `true` while a forward obstacle overrides the setpoint.
    pub fn detected_top(&self) -> bool {
        self.state != AvoidanceState::Normal
    }

    pub fn last_point(&self) -> Option<Vector3<f64>> {
        self.last_point
    }

    /// Record `position` as the last point once it has moved past the spacing on any axis.
    pub fn track_last_point(&mut self, position: &Vector3<f64>) {
        let moved = match &self.last_point {
            Some(last) => !self.params.last_point_spacing.contains(position, last),
            None => true,
        };

        if moved {
            self.last_point = Some(*position);
        }
    }

    /// Advance the state machine one tick.
    ///
    /// Returns the detour point while it overrides `target`. Forward readings are
    /// only looked at in the `Normal` state.
    pub fn update(
        &mut self,
        position: &Vector3<f64>,
        forward_scan: &[f64],
        target: &Vector3<f64>,
    ) -> Option<Vector3<f64>> {
        match self.state {
            AvoidanceState::Normal => {
                if !self.obstacle_ahead(position, forward_scan, target) {
                    return None;
                }

                let detour = self.detour_point(position, target);
                info!(
                    "Obstacle ahead at ({:.7}, {:.7}), detouring to ({:.7}, {:.7})",
                    position.x, position.y, detour.x, detour.y
                );
                self.state = AvoidanceState::Stopping { detour };
                Some(detour)
            }
            AvoidanceState::Stopping { detour } => {
                info!("Avoiding");
                self.state = AvoidanceState::Avoiding { detour, dwell: 0 };
                Some(detour)
            }
            AvoidanceState::Avoiding { detour, dwell } => {
                if !self.params.arrival.contains(position, &detour) {
                    self.state = AvoidanceState::Avoiding { detour, dwell: 0 };
                    return Some(detour);
                }

                if dwell >= self.params.arrival_dwell_ticks {
                    info!("Detour point reached, resuming mission");
                    self.state = AvoidanceState::Normal;
                    None
                } else {
                    self.state = AvoidanceState::Avoiding {
                        detour,
                        dwell: dwell + 1,
                    };
                    Some(detour)
                }
            }
        }
    }

    fn obstacle_ahead(
        &self,
        position: &Vector3<f64>,
        forward_scan: &[f64],
        target: &Vector3<f64>,
    ) -> bool {
        let p = &self.params;
        let in_range = |range: f64| range >= p.min_safe_range_m && range <= p.max_safe_range_m;

        if !forward_scan.iter().take(FORWARD_RAYS).any(|&range| in_range(range)) {
            return false;
        }
        if p.near_mission.contains(position, target) {
            return false;
        }

        let bearing = bearing_slope(
            Vector2::new(position.x, position.y),
            Vector2::new(target.x, target.y),
        );
        let sector = sector_for(bearing.angle(), &p.sector);

        let ray = match sector.ray() {
            Some(ray) => ray,
            None => {
                warn!(
                    "Target bearing {:.3} rad is outside every sector, treating as blocked",
                    bearing.angle().unwrap_or(f64::NAN)
                );
                return true;
            }
        };

        match forward_scan.get(ray) {
            Some(&range) => range >= p.sector_min_range_m && range <= p.max_safe_range_m,
            None => {
                warn!(
                    "Forward scan has {} rays, none for the {:?} sector (ray {}), treating as blocked",
                    forward_scan.len(),
                    sector,
                    ray
                );
                true
            }
        }
    }

    /// The point `detour_offset` planar units to the side of the current track.
    fn detour_point(&self, position: &Vector3<f64>, target: &Vector3<f64>) -> Vector3<f64> {
        let current = self.frame.to_planar(position.x, position.y);

        let reference = self
            .last_point
            .map(|last| self.frame.to_planar(last.x, last.y))
            .filter(|last| *last != current)
            .unwrap_or_else(|| self.frame.to_planar(target.x, target.y));

        let side = perpendicular_offset(reference, current, self.params.detour_offset);
        let geodetic = self.frame.to_geodetic(side.x, side.y);

        Vector3::new(geodetic.x, geodetic.y, position.z)
    }
}

/// Combine the mission target with any active overrides.
///
/// Latitude and longitude come from the forward override, altitude from the climb,
/// each falling back to the mission.
pub fn compose_setpoint(
    mission: &Vector3<f64>,
    forward_override: Option<Vector3<f64>>,
    climb_alt: Option<f64>,
) -> Setpoint {
    let lateral = forward_override.unwrap_or(*mission);
    let alt = climb_alt.unwrap_or(lateral.z);

    Setpoint {
        target: Vector3::new(lateral.x, lateral.y, alt),
        obstacle_override: forward_override.is_some() || climb_alt.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const CLEAR: [f64; 5] = [f64::INFINITY; 5];

    fn monitor() -> ObstacleMonitor {
        ObstacleMonitor::new(&AvoidanceParams::default(), LocalFrame::default())
    }

    #[test]
    fn avoidance_round_trip() {
        let mut monitor = monitor();
        let mission = Vector3::new(19.001, 72., 10.);
        let current = Vector3::new(19.0001, 72., 10.);
        monitor.track_last_point(&Vector3::new(19., 72., 10.));

        let blocked = [3., 20., 20., 20., 20.];
        let detour = monitor.update(&current, &blocked, &mission).unwrap();
        assert!(matches!(monitor.state(), AvoidanceState::Stopping { .. }));

        // Side-step along the longitude axis at the same latitude and altitude
        assert_abs_diff_eq!(detour.x, current.x, epsilon = 1e-12);
        assert_abs_diff_eq!(detour.y, 72. - 4. / 105_292.008_935_376_7, epsilon = 1e-12);
        assert_eq!(detour.z, current.z);

        assert_eq!(monitor.update(&current, &CLEAR, &mission), Some(detour));
        assert!(matches!(monitor.state(), AvoidanceState::Avoiding { .. }));

        // Still blocked but the override is active, so nothing is recomputed
        assert_eq!(monitor.update(&current, &blocked, &mission), Some(detour));

        assert_eq!(monitor.update(&detour, &blocked, &mission), None);
        assert_eq!(monitor.state(), AvoidanceState::Normal);
        assert!(!monitor.detected_top());
    }

    #[test]
    fn ignores_obstacles_near_mission_or_out_of_range() {
        let mut monitor = monitor();
        let current = Vector3::new(19.0001, 72., 10.);
        let near = Vector3::new(19.00011, 72., 10.);
        let far = Vector3::new(19.001, 72., 10.);

        assert_eq!(monitor.update(&current, &[3.; 5], &near), None);
        assert_eq!(monitor.update(&current, &[0.2, 11., 11., 11., 11.], &far), None);
        assert_eq!(monitor.update(&current, &CLEAR, &far), None);

        // Something off to the side while the facing ray is clear
        assert_eq!(monitor.update(&current, &[20., 20., 3., 20., 20.], &far), None);
        assert!(!monitor.detected_top());
    }

    #[test]
    fn undefined_sector_triggers() {
        let mut monitor = monitor();
        let current = Vector3::new(19.0001, 72., 10.);
        // θ = atan(-1) lies between the forward and forward-left cones
        let target = Vector3::new(19.0011, 71.999, 10.);

        assert!(monitor
            .update(&current, &[20., 20., 20., 20., 5.], &target)
            .is_some());
    }

    #[test]
    fn short_scan_without_facing_ray_triggers() {
        let mut monitor = monitor();
        let current = Vector3::new(19.0001, 72., 10.);
        // θ = atan(2) looks through ray 3, past the end of a three-ray scan
        let target = Vector3::new(19.0011, 72.002, 10.);

        assert!(monitor.update(&current, &[20., 20., 5.], &target).is_some());
        assert!(monitor.detected_top());

        // The same scan with the facing ray present and clear
        let mut monitor = self::monitor();
        assert_eq!(monitor.update(&current, &[20., 20., 5., 20.], &target), None);
    }

    #[test]
    fn detour_falls_back_to_target_line() {
        let mut monitor = monitor();
        let current = Vector3::new(19.0001, 72., 10.);
        let mission = Vector3::new(19.001, 72., 10.);
        monitor.track_last_point(&current);

        let detour = monitor.update(&current, &[3.; 5], &mission).unwrap();
        assert_abs_diff_eq!(detour.x, current.x, epsilon = 1e-12);
        assert!(detour.y < current.y);
    }

    #[test]
    fn dwell_delays_arrival() {
        let params = AvoidanceParams {
            arrival_dwell_ticks: 2,
            ..Default::default()
        };
        let mut monitor = ObstacleMonitor::new(&params, LocalFrame::default());
        let current = Vector3::new(19.0001, 72., 10.);
        let mission = Vector3::new(19.001, 72., 10.);

        let detour = monitor.update(&current, &[3.; 5], &mission).unwrap();
        monitor.update(&current, &CLEAR, &mission);

        assert!(monitor.update(&detour, &CLEAR, &mission).is_some());
        assert!(monitor.update(&detour, &CLEAR, &mission).is_some());
        assert!(monitor.update(&detour, &CLEAR, &mission).is_none());
    }

    #[test]
    fn last_point_needs_spacing() {
        let mut monitor = monitor();
        let start = Vector3::new(19., 72., 10.);
        monitor.track_last_point(&start);

        monitor.track_last_point(&Vector3::new(19.000001, 72., 10.05));
        assert_eq!(monitor.last_point(), Some(start));

        let moved = Vector3::new(19.00002, 72., 10.);
        monitor.track_last_point(&moved);
        assert_eq!(monitor.last_point(), Some(moved));
    }

    #[test]
    fn overrides_compose_per_axis() {
        let mission = Vector3::new(19.001, 72.001, 10.);
        let detour = Vector3::new(19.0005, 72.0002, 8.);

        assert_eq!(compose_setpoint(&mission, None, None), Setpoint::mission(mission));

        let setpoint = compose_setpoint(&mission, Some(detour), Some(12.));
        assert_eq!(setpoint.target, Vector3::new(19.0005, 72.0002, 12.));
        assert!(setpoint.obstacle_override);

        let setpoint = compose_setpoint(&mission, None, Some(12.));
        assert_eq!(setpoint.target, Vector3::new(19.001, 72.001, 12.));
        assert!(setpoint.obstacle_override);

        let setpoint = compose_setpoint(&mission, Some(detour), None);
        assert_eq!(setpoint.target, detour);
    }
}
