//! Vehicle state and the commands passed between the control stages.

use nalgebra::{UnitQuaternion, Vector3};

/// Stick value at rest for roll, pitch and yaw.
pub const STICK_NEUTRAL: f64 = 1500.;

/// Lowest stick value, also the idle throttle.
pub const STICK_MIN: f64 = 1000.;

/// Highest stick value.
pub const STICK_MAX: f64 = 2000.;

/// Full scale of a motor command.
pub const MOTOR_PWM_MAX: f64 = 1024.;

/// A snapshot of everything the sensors report, taken at the top of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleState {
    /// Latitude (degrees), longitude (degrees) and altitude (meters).
    pub position: Vector3<f64>,

    pub orientation: UnitQuaternion<f64>,

    /// Forward range finder fan (meters), at least five rays.
    pub forward_scan: Vec<f64>,

    /// Downward range finder (meters).
    pub downward_range: Option<f64>,

    /// Externally supplied destination.
    pub mission: Option<Vector3<f64>>,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            forward_scan: Vec::new(),
            downward_range: None,
            mission: None,
        }
    }
}

impl VehicleState {
    /// Returns `true` once the positioning sensor has produced a usable fix.
    ///
    /// An all-zero position is the value before the first fix arrives.
    pub fn has_fix(&self) -> bool {
        self.position != Vector3::zeros() && self.position.iter().all(|v| v.is_finite())
    }

    pub fn attitude(&self) -> Attitude {
        Attitude::from_quaternion(&self.orientation)
    }
}

/// Euler angles of the vehicle in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Attitude {
    /// Derive the vehicle attitude from the IMU quaternion.
    ///
    /// The IMU's x axis is the vehicle's pitch axis and its y axis the roll axis,
    /// so the first two Euler angles are swapped.
    pub fn from_quaternion(orientation: &UnitQuaternion<f64>) -> Self {
        let (about_x, about_y, about_z) = orientation.euler_angles();
        Self {
            roll: about_y,
            pitch: about_x,
            yaw: about_z,
        }
    }

    pub fn to_degrees(self) -> Vector3<f64> {
        Vector3::new(self.roll, self.pitch, self.yaw).map(f64::to_degrees)
    }
}

/// The target the position controller drives towards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Setpoint {
    pub target: Vector3<f64>,

    /// Set while an avoidance manoeuvre replaces the mission target.
    pub obstacle_override: bool,
}

impl Setpoint {
    pub fn mission(target: Vector3<f64>) -> Self {
        Self {
            target,
            obstacle_override: false,
        }
    }

    /// The cleared setpoint published on shutdown.
    pub fn cleared() -> Self {
        Self::mission(Vector3::zeros())
    }
}

/// Normalized stick positions in `[STICK_MIN, STICK_MAX]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickCommand {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub throttle: f64,
}

impl Default for StickCommand {
    fn default() -> Self {
        Self::neutral()
    }
}

impl StickCommand {
    /// Centered sticks with idle throttle.
    pub const fn neutral() -> Self {
        Self {
            roll: STICK_NEUTRAL,
            pitch: STICK_NEUTRAL,
            yaw: STICK_NEUTRAL,
            throttle: STICK_MIN,
        }
    }
}

/// PWM demand for each of the four motors in `[0, MOTOR_PWM_MAX]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotorCommand(pub [f64; 4]);

impl MotorCommand {
    /// All motors stopped.
    pub const fn zero() -> Self {
        Self([0.; 4])
    }

    /// Clamp every motor into `[min, max]`.
    pub fn clamped(self, min: f64, max: f64) -> Self {
        Self(self.0.map(|pwm| constrain(pwm, min, max)))
    }
}

/// Clamp `value` into `[low, high]`, mapping NaN onto `low`.
pub fn constrain(value: f64, low: f64, high: f64) -> f64 {
    if value.is_nan() {
        return low;
    }
    num_traits::clamp(value, low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn roll_and_pitch_are_swapped() {
        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let attitude = Attitude::from_quaternion(&q);

        assert_abs_diff_eq!(attitude.roll, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(attitude.pitch, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(attitude.yaw, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn zero_position_has_no_fix() {
        let mut state = VehicleState::default();
        assert!(!state.has_fix());

        state.position = Vector3::new(19., 72., 0.);
        assert!(state.has_fix());

        state.position.x = f64::NAN;
        assert!(!state.has_fix());
    }

    #[test]
    fn clamp_never_wraps() {
        let cmd = MotorCommand([-50., 2048., 512., f64::MAX]).clamped(0., 1024.);
        assert_eq!(cmd, MotorCommand([0., 1024., 512., 1024.]));

        assert_eq!(constrain(f64::NAN, 1000., 2000.), 1000.);
    }
}
