//! The cascaded control loops: position to sticks, sticks to motors.

mod attitude;
pub use attitude::{stick_to_angle, stick_to_thrust, AttitudeController, MAX_ANGLE_DEG};

pub mod motor;
pub use motor::{MixingError, QuadMixer};

mod pid;
pub use pid::AxisPid;

mod position;
pub use position::PositionController;

mod waypoint;
pub use waypoint::{Axis, WaypointQueue};
