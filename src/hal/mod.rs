//! Interfaces between the control stack and the vehicle.

use crate::state::{MotorCommand, Setpoint, StickCommand, VehicleState};
use nalgebra::{UnitQuaternion, Vector3};
use thiserror::Error;

pub mod esc;
pub use esc::{Esc, EscMotors};

mod hub;
pub use hub::{sensor_channel, telemetry_channel, SensorFeeds, SensorHub, TelemetryFeeds, TelemetryHub};

/// Source of the latest sensor readings.
pub trait Sensors {
    /// Latitude (degrees), longitude (degrees) and altitude (meters).
    fn position(&mut self) -> Vector3<f64>;

    fn orientation(&mut self) -> UnitQuaternion<f64>;

    /// Forward range finder fan (meters).
    fn forward_scan(&mut self) -> Vec<f64>;

    fn downward_range(&mut self) -> Option<f64>;

    /// Externally supplied destination.
    fn mission(&mut self) -> Option<Vector3<f64>>;

    /// Read every sensor once.
    fn snapshot(&mut self) -> VehicleState {
        VehicleState {
            position: self.position(),
            orientation: self.orientation(),
            forward_scan: self.forward_scan(),
            downward_range: self.downward_range(),
            mission: self.mission(),
        }
    }
}

/// An error returned by a payload gripper query.
#[derive(Debug, Error)]
pub enum GripperError {
    #[error("gripper query failed: {0}")]
    Failed(String),

    #[error("malformed gripper reply: {0}")]
    Malformed(String),
}

/// Payload gripper status.
#[allow(async_fn_in_trait)]
pub trait Gripper {
    /// Returns `true` if the gripper is holding a payload.
    async fn query(&mut self) -> Result<bool, GripperError>;
}

/// Sink for the intermediate commands of each tick.
pub trait Telemetry {
    fn setpoint(&mut self, setpoint: &Setpoint);

    fn stick(&mut self, stick: &StickCommand);
}

pub trait Actuator<T> {
    fn output(&mut self, output: T);
}

impl<T, U> Actuator<U> for &mut T
where
    T: Actuator<U> + ?Sized,
{
    fn output(&mut self, output: U) {
        (**self).output(output)
    }
}

impl<T> Telemetry for &mut T
where
    T: Telemetry + ?Sized,
{
    fn setpoint(&mut self, setpoint: &Setpoint) {
        (**self).setpoint(setpoint)
    }

    fn stick(&mut self, stick: &StickCommand) {
        (**self).stick(stick)
    }
}

/// Motor commands published on a watch channel.
impl Actuator<MotorCommand> for tokio::sync::watch::Sender<MotorCommand> {
    fn output(&mut self, output: MotorCommand) {
        self.send_replace(output);
    }
}
