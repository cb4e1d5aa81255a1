use super::motor::{MixingError, MotorLayout, QuadMixer};
use super::pid::AxisPid;
use crate::params::AttitudeParams;
use crate::state::{Attitude, MotorCommand, StickCommand, STICK_MAX, STICK_MIN, STICK_NEUTRAL};
use nalgebra::Vector3;

/// Largest angle target (degrees) a fully deflected stick asks for.
pub const MAX_ANGLE_DEG: f64 = 10.;

/// Map a value from one range into another.
fn lin_map(source_range: (f64, f64), target_range: (f64, f64), value: f64) -> f64 {
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Angle target in degrees for a roll, pitch or yaw stick.
///
/// `cmd * 0.02 - 30`, so neutral asks for level and the stick limits for ±10°.
pub fn stick_to_angle(cmd: f64) -> f64 {
    lin_map((STICK_MIN, STICK_MAX), (-MAX_ANGLE_DEG, MAX_ANGLE_DEG), cmd)
}

/// Collective thrust for a throttle stick.
///
/// The stick range maps linearly onto `[0, motor_max]`, so the lowest stick gives
/// no thrust and neutral gives half of `motor_max`.
pub fn stick_to_thrust(cmd: f64, motor_max: f64) -> f64 {
    lin_map((STICK_MIN, STICK_MAX), (0., motor_max), cmd)
}

/// Inner attitude loop turning stick commands into motor PWM.
#[derive(Clone, Debug, PartialEq)]
pub struct AttitudeController {
    pub roll: AxisPid,
    pub pitch: AxisPid,
    pub yaw: AxisPid,
    pub mixer: QuadMixer,
}

impl AttitudeController {
    pub fn new(params: &AttitudeParams, sample_time: f64) -> Self {
        Self {
            roll: AxisPid::new(params.roll, sample_time),
            pitch: AxisPid::new(params.pitch, sample_time),
            yaw: AxisPid::new(params.yaw, sample_time),
            mixer: QuadMixer::quad_x(params.motor_min, params.motor_max),
        }
    }

    /// Run one evaluation of all three axes and mix the result.
    pub fn update(&mut self, stick: &StickCommand, attitude: &Attitude) -> MotorCommand {
        let actual = attitude.to_degrees();
        let target = Vector3::new(
            stick_to_angle(stick.roll),
            stick_to_angle(stick.pitch),
            stick_to_angle(stick.yaw),
        );

        let moment = Vector3::new(
            self.roll.control(target.x, actual.x),
            self.pitch.control(target.y, actual.y),
            self.yaw.control(target.z, actual.z),
        );
        let throttle = stick_to_thrust(stick.throttle, self.mixer.max);

        self.mixer.mix(throttle, &moment)
    }

    /// Check the mixing table, then check that a tilt is corrected the right way.
    ///
    /// A copy of this controller is shown a 5° roll and a 5° pitch with centered sticks.
    /// The motors on the raised side must slow down.
    pub fn verify(&self) -> Result<(), MixingError> {
        self.mixer.verify()?;

        let stick = StickCommand {
            throttle: STICK_NEUTRAL,
            ..StickCommand::neutral()
        };
        let tilt = 5f64.to_radians();

        let rolled = Attitude {
            roll: tilt,
            ..Default::default()
        };
        let cmd = self.clone().update(&stick, &rolled);
        if !self.raised_side_slows(&cmd, |layout| layout.left) {
            return Err(MixingError::Uncorrected { axis: "roll" });
        }

        let pitched = Attitude {
            pitch: tilt,
            ..Default::default()
        };
        let cmd = self.clone().update(&stick, &pitched);
        if !self.raised_side_slows(&cmd, |layout| layout.front) {
            return Err(MixingError::Uncorrected { axis: "pitch" });
        }

        Ok(())
    }

    fn raised_side_slows<F>(&self, cmd: &MotorCommand, raised: F) -> bool
    where
        F: Fn(&MotorLayout) -> bool,
    {
        let (mut up, mut down) = (0f64, 0f64);
        for (pwm, layout) in cmd.0.iter().zip(&self.mixer.layout) {
            if raised(layout) {
                up += pwm;
            } else {
                down += pwm;
            }
        }
        up < down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn controller() -> AttitudeController {
        AttitudeController::new(&AttitudeParams::default(), 0.06)
    }

    #[test]
    fn stick_mapping() {
        assert_abs_diff_eq!(stick_to_angle(1500.), 0., epsilon = 1e-9);
        assert_abs_diff_eq!(stick_to_angle(1625.), 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(stick_to_angle(1000.), -10., epsilon = 1e-9);
        assert_abs_diff_eq!(stick_to_angle(1375.), 1375. * 0.02 - 30., epsilon = 1e-9);

        assert_abs_diff_eq!(stick_to_thrust(1000., 1024.), 0., epsilon = 1e-9);
        assert_abs_diff_eq!(stick_to_thrust(1500., 1024.), 512., epsilon = 1e-9);
        assert_abs_diff_eq!(stick_to_thrust(1750., 1024.), 1750. * 1.024 - 1024., epsilon = 1e-9);
        assert_abs_diff_eq!(stick_to_thrust(1500., 2000.), 1000., epsilon = 1e-9);
        assert_abs_diff_eq!(stick_to_thrust(2000., 2000.), 2000., epsilon = 1e-9);
    }

    #[test]
    fn level_hover_mixes_evenly() {
        let mut controller = controller();
        let stick = StickCommand {
            throttle: 1500.,
            ..StickCommand::neutral()
        };

        let cmd = controller.update(&stick, &Attitude::default());
        for pwm in cmd.0 {
            assert_abs_diff_eq!(pwm, 512., epsilon = 1e-9);
        }
    }

    #[test]
    fn outputs_saturate_to_exact_bounds() {
        let mut controller = controller();
        let stick = StickCommand {
            roll: 2000.,
            pitch: 1500.,
            yaw: 1500.,
            throttle: 1500.,
        };
        let rolled_right = Attitude {
            roll: (-30f64).to_radians(),
            ..Default::default()
        };

        let cmd = controller.update(&stick, &rolled_right);
        assert_eq!(cmd.0[0], 0.);
        assert_eq!(cmd.0[1], 0.);
        assert_eq!(cmd.0[2], 1024.);
        assert_eq!(cmd.0[3], 1024.);
    }

    #[test]
    fn tilt_is_corrected() {
        assert_eq!(controller().verify(), Ok(()));

        let mut controller = controller();
        let stick = StickCommand {
            throttle: 1500.,
            ..StickCommand::neutral()
        };
        let rolled = Attitude {
            roll: 5f64.to_radians(),
            ..Default::default()
        };

        // Left side raised: m3 and m4 slow down
        let cmd = controller.update(&stick, &rolled);
        assert!(cmd.0[2] < 512. && cmd.0[3] < 512.);
        assert!(cmd.0[0] > 512. && cmd.0[1] > 512.);
    }

    #[test]
    fn inverted_roll_gain_is_rejected() {
        let mut controller = controller();
        controller.roll.kp = -controller.roll.kp;
        controller.roll.kd = -controller.roll.kd;
        controller.roll.ki = -controller.roll.ki;

        assert_eq!(
            controller.verify(),
            Err(MixingError::Uncorrected { axis: "roll" })
        );
    }
}
