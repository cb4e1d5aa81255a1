use nalgebra::Vector3;
use thiserror::Error;

mod quad;
pub use quad::{QuadMixer, QUAD_X_FACTORS, QUAD_X_LAYOUT};

/// Rotor spin direction seen from above.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Spin {
    Clockwise,
    CounterClockwise,
}

/// Physical placement of a rotor on the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotorLayout {
    pub front: bool,
    pub left: bool,
    pub spin: Spin,
}

impl MotorLayout {
    /// Expected sign of this rotor's response to positive roll, pitch and yaw.
    ///
    /// Positive roll lifts the left side, positive pitch lifts the front and
    /// positive yaw speeds up the clockwise rotors.
    pub fn expected_signs(&self) -> Vector3<f64> {
        let sign = |b: bool| if b { 1. } else { -1. };
        Vector3::new(
            sign(self.left),
            sign(self.front),
            sign(self.spin == Spin::Clockwise),
        )
    }
}

/// The mixing factors of a single rotor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motor {
    /// Roll, pitch and yaw contribution.
    pub factor: Vector3<f64>,
}

impl Motor {
    pub fn new(factor: Vector3<f64>) -> Self {
        Self { factor }
    }

    pub fn from_factors(factors: [f64; 3]) -> Self {
        Self::new(Vector3::from(factors))
    }

    /// Throttle plus the weighted roll, pitch and yaw terms.
    pub fn thrust(&self, moment: &Vector3<f64>, throttle: f64) -> f64 {
        self.factor
            .zip_fold(moment, throttle, |acc, factor, moment| factor * moment + acc)
    }
}

/// A mixing table that disagrees with the motor layout.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MixingError {
    #[error("motor {motor} responds to {axis} with the wrong sign")]
    WrongSign { motor: usize, axis: &'static str },

    #[error("{axis} changes the total thrust")]
    Unbalanced { axis: &'static str },

    #[error("a {axis} tilt is not corrected by the attitude loop")]
    Uncorrected { axis: &'static str },
}
