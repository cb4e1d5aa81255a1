use super::{MixingError, Motor, MotorLayout, Spin};
use crate::state::MotorCommand;
use nalgebra::Vector3;

/// Rotor placement of the quad-X frame, seen from above with the front at the top.
///
/// ```text
///            front
///    m4 (CW)       m1 (CCW)
///           \   /
///            \ /
///            / \
///           /   \
///    m3 (CCW)      m2 (CW)
/// ```
pub const QUAD_X_LAYOUT: [MotorLayout; 4] = [
    MotorLayout {
        front: true,
        left: false,
        spin: Spin::CounterClockwise,
    },
    MotorLayout {
        front: false,
        left: false,
        spin: Spin::Clockwise,
    },
    MotorLayout {
        front: false,
        left: true,
        spin: Spin::CounterClockwise,
    },
    MotorLayout {
        front: true,
        left: true,
        spin: Spin::Clockwise,
    },
];

/// Roll, pitch and yaw factors of each rotor of [`QUAD_X_LAYOUT`].
///
/// ```text
/// m1 = t - r + p - y
/// m2 = t - r - p + y
/// m3 = t + r - p - y
/// m4 = t + r + p + y
/// ```
pub const QUAD_X_FACTORS: [[f64; 3]; 4] = [
    [-1., 1., -1.],
    [-1., -1., 1.],
    [1., -1., -1.],
    [1., 1., 1.],
];

/// Mixes throttle and attitude corrections into four bounded motor commands.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadMixer {
    pub motors: [Motor; 4],
    pub layout: [MotorLayout; 4],
    pub min: f64,
    pub max: f64,
}

impl QuadMixer {
    /// Create a quad-X mixer with outputs clamped to `[min, max]`.
    pub fn quad_x(min: f64, max: f64) -> Self {
        Self {
            motors: QUAD_X_FACTORS.map(Motor::from_factors),
            layout: QUAD_X_LAYOUT,
            min,
            max,
        }
    }

    /// Mix without clamping.
    pub fn mix_unbounded(&self, throttle: f64, moment: &Vector3<f64>) -> [f64; 4] {
        self.motors.map(|motor| motor.thrust(moment, throttle))
    }

    pub fn mix(&self, throttle: f64, moment: &Vector3<f64>) -> MotorCommand {
        MotorCommand(self.mix_unbounded(throttle, moment)).clamped(self.min, self.max)
    }

    /// Check the mixing table against the rotor layout.
    ///
    /// A unit moment on each axis is mixed around mid throttle. Every rotor must move
    /// in the direction its position and spin demand, and the total thrust must not change.
    pub fn verify(&self) -> Result<(), MixingError> {
        let throttle = (self.min + self.max) / 2.;
        let axes = [
            ("roll", Vector3::x()),
            ("pitch", Vector3::y()),
            ("yaw", Vector3::z()),
        ];

        for (i, (axis, unit)) in axes.into_iter().enumerate() {
            let outputs = self.mix_unbounded(throttle, &unit);

            for (motor, (output, layout)) in outputs.iter().zip(&self.layout).enumerate() {
                let response = output - throttle;
                if response.signum() != layout.expected_signs()[i] {
                    return Err(MixingError::WrongSign {
                        motor: motor + 1,
                        axis,
                    });
                }
            }

            let total: f64 = outputs.iter().map(|output| output - throttle).sum();
            if total != 0. {
                return Err(MixingError::Unbalanced { axis });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_x_matches_layout() {
        assert_eq!(QuadMixer::quad_x(0., 1024.).verify(), Ok(()));
    }

    #[test]
    fn swapped_rotor_is_caught() {
        let mut mixer = QuadMixer::quad_x(0., 1024.);
        mixer.motors.swap(0, 1);

        assert_eq!(
            mixer.verify(),
            Err(MixingError::WrongSign {
                motor: 1,
                axis: "pitch"
            })
        );
    }

    #[test]
    fn mixing_follows_table() {
        let mixer = QuadMixer::quad_x(0., 1024.);
        let cmd = mixer.mix(500., &Vector3::new(10., 20., 3.));

        assert_eq!(cmd, MotorCommand([507., 473., 487., 533.]));
    }

    #[test]
    fn saturated_outputs_clamp_to_bounds() {
        let mixer = QuadMixer::quad_x(0., 1024.);

        let cmd = mixer.mix(1000., &Vector3::new(5000., 0., 0.));
        assert_eq!(cmd, MotorCommand([0., 0., 1024., 1024.]));

        let cmd = mixer.mix(0., &Vector3::new(0., -1e9, 0.));
        assert_eq!(cmd, MotorCommand([0., 1024., 1024., 0.]));
    }
}
