//! Tunable parameters for navigation, control and avoidance.
//!
//! Every threshold used by the stack lives here with its unit in the field name.
//! [`Params::default`] carries the tuning of the reference vehicle, and any
//! field may be overridden from a TOML file:
//!
//! ```
//! use copter_nav::Params;
//!
//! let params = Params::from_toml_str(
//!     r#"
//!     loop_rate_hz = 50.0
//!
//!     [avoidance]
//!     detour_offset = 6.0
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(params.avoidance.detour_offset, 6.0);
//! assert_eq!(params.climb.trigger_range_m, 2.0);
//! ```

use nalgebra::Vector3;
use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;

/// An error that occurs while loading or validating parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Cannot load the parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    Deserialise(#[from] toml::de::Error),

    #[error("Invalid parameter `{name}`: {reason}")]
    Invalid {
        name: &'static str,
        reason: &'static str,
    },
}

/// Proportional, integral and derivative gains of a single axis.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// Per-axis closeness test between two geodetic positions.
///
/// All bounds are inclusive. Use an infinite altitude bound for a lateral-only test.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Tolerance {
    pub lat_deg: f64,
    pub long_deg: f64,
    pub alt_m: f64,
}

impl Tolerance {
    pub const fn new(lat_deg: f64, long_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            long_deg,
            alt_m,
        }
    }

    pub const fn lateral(lat_deg: f64, long_deg: f64) -> Self {
        Self::new(lat_deg, long_deg, f64::INFINITY)
    }

    /// Returns `true` if `current` lies within this tolerance of `target`.
    pub fn contains(&self, current: &Vector3<f64>, target: &Vector3<f64>) -> bool {
        (current.x - target.x).abs() <= self.lat_deg
            && (current.y - target.y).abs() <= self.long_deg
            && (current.z - target.z).abs() <= self.alt_m
    }
}

/// Linear mapping between degrees and the local planar frame.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FrameParams {
    pub origin_lat_deg: f64,
    pub origin_long_deg: f64,

    /// Planar x units per degree of latitude.
    pub x_per_lat_deg: f64,

    /// Planar y units per degree of longitude. Negative: y grows westwards.
    pub y_per_long_deg: f64,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            origin_lat_deg: 19.0,
            origin_long_deg: 72.0,
            x_per_lat_deg: 110_692.070_293_262_5,
            y_per_long_deg: -105_292.008_935_376_7,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WaypointParams {
    /// Largest latitude step between queued setpoints (about 7.5 m).
    pub lat_step_deg: f64,

    /// Largest longitude step between queued setpoints (about 7.5 m).
    pub long_step_deg: f64,

    /// Distance at which a queue head is retired. Altitude is ignored.
    pub retire: Tolerance,

    /// Furthest mission accepted on either lateral axis (about 1.1 km).
    pub max_leg_deg: f64,
}

impl Default for WaypointParams {
    fn default() -> Self {
        Self {
            lat_step_deg: 0.000_045_170_4 * 1.5,
            long_step_deg: 0.000_047_487 * 1.5,
            retire: Tolerance::lateral(0.000_004_517, 0.000_004_748_7),
            max_leg_deg: 0.01,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PositionParams {
    /// Latitude error (degrees) to roll stick.
    pub roll: PidGains,

    /// Longitude error (degrees) to pitch stick.
    pub pitch: PidGains,

    /// Altitude error (meters) to throttle stick.
    pub throttle: PidGains,

    pub sample_time_s: f64,

    pub lateral_stick_min: f64,
    pub lateral_stick_max: f64,
    pub throttle_stick_min: f64,
    pub throttle_stick_max: f64,
}

impl Default for PositionParams {
    fn default() -> Self {
        let lateral = PidGains::new(17_300_000., 0., 150_000_000.);
        Self {
            roll: lateral,
            pitch: lateral,
            throttle: PidGains::new(1000., -0.138, 2300.),
            sample_time_s: 0.06,
            lateral_stick_min: 1375.,
            lateral_stick_max: 1625.,
            throttle_stick_min: 1000.,
            throttle_stick_max: 2000.,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AttitudeParams {
    /// Gains acting on angle errors in degrees.
    pub roll: PidGains,
    pub pitch: PidGains,
    pub yaw: PidGains,

    pub sample_time_s: f64,

    pub motor_min: f64,
    pub motor_max: f64,
}

impl Default for AttitudeParams {
    fn default() -> Self {
        let tilt = PidGains::new(4.2, 0.2, 4.5);
        Self {
            roll: tilt,
            pitch: tilt,
            yaw: PidGains::new(400., 0., 0.),
            sample_time_s: 0.06,
            motor_min: 0.,
            motor_max: 1024.,
        }
    }
}

/// Bearing angle boundaries (radians) used to pick the forward ray facing the target.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SectorParams {
    /// `|θ| <= forward_max_rad` looks through ray 0.
    pub forward_max_rad: f64,

    /// `-lateral_min_rad < θ < -side_min_rad` looks through ray 1.
    pub side_min_rad: f64,

    /// `|θ| >= lateral_min_rad` (or a vertical bearing) looks through ray 2.
    pub lateral_min_rad: f64,
}

impl Default for SectorParams {
    fn default() -> Self {
        Self {
            forward_max_rad: 0.78,
            side_min_rad: 1.3,
            lateral_min_rad: 2.3,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AvoidanceParams {
    pub min_safe_range_m: f64,
    pub max_safe_range_m: f64,

    /// Lower range bound applied to the ray facing the target.
    pub sector_min_range_m: f64,

    /// Sideways displacement of the detour point in planar units.
    pub detour_offset: f64,

    pub sector: SectorParams,

    /// Closeness at which the detour point is considered reached.
    pub arrival: Tolerance,

    /// Consecutive ticks the vehicle must stay at the detour point.
    pub arrival_dwell_ticks: u32,

    /// Lateral closeness to the mission at which obstacles are ignored.
    pub near_mission: Tolerance,

    /// Movement needed before a new last point is recorded.
    pub last_point_spacing: Tolerance,
}

impl Default for AvoidanceParams {
    fn default() -> Self {
        Self {
            min_safe_range_m: 0.5,
            max_safe_range_m: 10.,
            sector_min_range_m: 0.45,
            detour_offset: 4.,
            sector: SectorParams::default(),
            arrival: Tolerance::new(0.000_004_517 / 3., 0.000_004_748_7 / 3., 0.2),
            arrival_dwell_ticks: 0,
            near_mission: Tolerance::lateral(0.000_004_517 * 5., 0.000_004_748_7 * 5.),
            last_point_spacing: Tolerance::new(0.000_045_17 / 4., 0.000_047_487 / 4., 0.1),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClimbParams {
    /// Downward range at or below which the vehicle climbs.
    pub trigger_range_m: f64,

    pub climb_rate_mps: f64,

    /// Longest climb in loop ticks.
    pub max_ticks: u32,
}

impl Default for ClimbParams {
    fn default() -> Self {
        Self {
            trigger_range_m: 2.,
            climb_rate_mps: 1.,
            max_ticks: 50,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GripperParams {
    pub timeout_ms: u64,
    pub query_hz: f64,
}

impl Default for GripperParams {
    fn default() -> Self {
        Self {
            timeout_ms: 10,
            query_hz: 5.,
        }
    }
}

/// Parameters for the whole stack.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Params {
    pub loop_rate_hz: f64,
    pub frame: FrameParams,
    pub waypoint: WaypointParams,
    pub position: PositionParams,
    pub attitude: AttitudeParams,
    pub avoidance: AvoidanceParams,
    pub climb: ClimbParams,
    pub gripper: GripperParams,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            loop_rate_hz: 50.,
            frame: FrameParams::default(),
            waypoint: WaypointParams::default(),
            position: PositionParams::default(),
            attitude: AttitudeParams::default(),
            avoidance: AvoidanceParams::default(),
            climb: ClimbParams::default(),
            gripper: GripperParams::default(),
        }
    }
}

impl Params {
    /// Load and validate a TOML parameter file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ParamsError> {
        let params_str = fs::read_to_string(path)?;
        Self::from_toml_str(&params_str)
    }

    /// Parse and validate parameters from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ParamsError> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Loop period in seconds.
    pub fn loop_period_s(&self) -> f64 {
        1. / self.loop_rate_hz
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        fn check(ok: bool, name: &'static str, reason: &'static str) -> Result<(), ParamsError> {
            if ok {
                Ok(())
            } else {
                Err(ParamsError::Invalid { name, reason })
            }
        }

        check(self.loop_rate_hz > 0., "loop_rate_hz", "must be positive")?;
        check(self.frame.x_per_lat_deg != 0., "frame.x_per_lat_deg", "must be non-zero")?;
        check(self.frame.y_per_long_deg != 0., "frame.y_per_long_deg", "must be non-zero")?;
        check(self.waypoint.lat_step_deg > 0., "waypoint.lat_step_deg", "must be positive")?;
        check(self.waypoint.long_step_deg > 0., "waypoint.long_step_deg", "must be positive")?;
        check(
            self.waypoint.max_leg_deg.is_finite() && self.waypoint.max_leg_deg > 0.,
            "waypoint.max_leg_deg",
            "must be positive and finite",
        )?;
        check(self.position.sample_time_s > 0., "position.sample_time_s", "must be positive")?;
        check(
            self.position.lateral_stick_min < self.position.lateral_stick_max,
            "position.lateral_stick_min",
            "must be below lateral_stick_max",
        )?;
        check(
            self.position.throttle_stick_min < self.position.throttle_stick_max,
            "position.throttle_stick_min",
            "must be below throttle_stick_max",
        )?;
        check(self.attitude.sample_time_s > 0., "attitude.sample_time_s", "must be positive")?;
        check(
            self.attitude.motor_min < self.attitude.motor_max,
            "attitude.motor_min",
            "must be below motor_max",
        )?;
        check(
            self.avoidance.min_safe_range_m < self.avoidance.max_safe_range_m,
            "avoidance.min_safe_range_m",
            "must be below max_safe_range_m",
        )?;
        check(self.avoidance.detour_offset > 0., "avoidance.detour_offset", "must be positive")?;
        check(
            self.avoidance.sector.forward_max_rad <= self.avoidance.sector.side_min_rad
                && self.avoidance.sector.side_min_rad <= self.avoidance.sector.lateral_min_rad,
            "avoidance.sector",
            "boundaries must be increasing",
        )?;
        check(self.climb.climb_rate_mps >= 0., "climb.climb_rate_mps", "must not be negative")?;
        check(self.gripper.query_hz >= 0., "gripper.query_hz", "must not be negative")?;

        Ok(())
    }
}
