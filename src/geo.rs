//! Geodetic to local planar conversion and bearing helpers.
//!
//! The planar frame is a linear approximation around a fixed origin, valid over the
//! small area the vehicle operates in. Latitude maps to `x` and longitude to `y`.

use crate::params::FrameParams;
use nalgebra::Vector2;

/// Linear per-axis mapping between degrees and planar units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalFrame {
    origin: Vector2<f64>,
    scale: Vector2<f64>,
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::from(&FrameParams::default())
    }
}

impl From<&FrameParams> for LocalFrame {
    fn from(params: &FrameParams) -> Self {
        Self {
            origin: Vector2::new(params.origin_lat_deg, params.origin_long_deg),
            scale: Vector2::new(params.x_per_lat_deg, params.y_per_long_deg),
        }
    }
}

impl LocalFrame {
    /// Convert a latitude and longitude (in degrees) to planar `(x, y)`.
    pub fn to_planar(&self, lat: f64, long: f64) -> Vector2<f64> {
        Vector2::new(
            self.scale.x * (lat - self.origin.x),
            self.scale.y * (long - self.origin.y),
        )
    }

    /// Convert planar `(x, y)` back to latitude and longitude (in degrees).
    pub fn to_geodetic(&self, x: f64, y: f64) -> Vector2<f64> {
        Vector2::new(x / self.scale.x + self.origin.x, y / self.scale.y + self.origin.y)
    }
}

/// Slope of the line between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Slope {
    Finite(f64),

    /// Both points share the same `x`.
    Vertical,
}

impl Slope {
    /// The bearing angle `atan(m)` in radians, or `None` for a vertical line.
    pub fn angle(self) -> Option<f64> {
        match self {
            Slope::Finite(m) => Some(m.atan()),
            Slope::Vertical => None,
        }
    }
}

/// Calculate the slope `dy / dx` of the line from `from` to `to`.
pub fn bearing_slope(from: Vector2<f64>, to: Vector2<f64>) -> Slope {
    let dx = to.x - from.x;
    if dx == 0. {
        Slope::Vertical
    } else {
        Slope::Finite((to.y - from.y) / dx)
    }
}

/// Return the point `distance` away from `to`, perpendicular to the line `from -> to`.
///
/// For a line of slope `m` the offset direction is `(-m, 1) / sqrt(1 + m^2)`.
/// A vertical line is offset along `+x`.
pub fn perpendicular_offset(from: Vector2<f64>, to: Vector2<f64>, distance: f64) -> Vector2<f64> {
    match bearing_slope(from, to) {
        Slope::Finite(m) => {
            let norm = (1. / (1. + m * m)).sqrt();
            Vector2::new(to.x - distance * m * norm, to.y + distance * norm)
        }
        Slope::Vertical => Vector2::new(to.x + distance, to.y),
    }
}
