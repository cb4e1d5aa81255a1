use super::{Sensors, Telemetry};
use crate::state::{Setpoint, StickCommand};
use nalgebra::{UnitQuaternion, Vector3};
use tokio::sync::watch;

/// Write side of the sensor channels, one sender per field.
///
/// Each field has a single writer and the latest value wins.
#[derive(Debug)]
pub struct SensorFeeds {
    position: watch::Sender<Vector3<f64>>,
    orientation: watch::Sender<UnitQuaternion<f64>>,
    forward_scan: watch::Sender<Vec<f64>>,
    downward_range: watch::Sender<Option<f64>>,
    mission: watch::Sender<Option<Vector3<f64>>>,
}

impl SensorFeeds {
    pub fn position(&self, position: Vector3<f64>) {
        self.position.send_replace(position);
    }

    pub fn orientation(&self, orientation: UnitQuaternion<f64>) {
        self.orientation.send_replace(orientation);
    }

    pub fn forward_scan(&self, ranges: Vec<f64>) {
        self.forward_scan.send_replace(ranges);
    }

    pub fn downward_range(&self, range: f64) {
        self.downward_range.send_replace(Some(range));
    }

    pub fn mission(&self, target: Vector3<f64>) {
        self.mission.send_replace(Some(target));
    }
}

/// Read side of the sensor channels.
#[derive(Clone, Debug)]
pub struct SensorHub {
    position: watch::Receiver<Vector3<f64>>,
    orientation: watch::Receiver<UnitQuaternion<f64>>,
    forward_scan: watch::Receiver<Vec<f64>>,
    downward_range: watch::Receiver<Option<f64>>,
    mission: watch::Receiver<Option<Vector3<f64>>>,
}

/// Create the sensor channels.
///
/// Until a feed is written, the position reads as all zeros (no fix), the orientation
/// as level and the other readings as absent.
pub fn sensor_channel() -> (SensorFeeds, SensorHub) {
    let (position, position_rx) = watch::channel(Vector3::zeros());
    let (orientation, orientation_rx) = watch::channel(UnitQuaternion::identity());
    let (forward_scan, forward_scan_rx) = watch::channel(Vec::new());
    let (downward_range, downward_range_rx) = watch::channel(None);
    let (mission, mission_rx) = watch::channel(None);

    (
        SensorFeeds {
            position,
            orientation,
            forward_scan,
            downward_range,
            mission,
        },
        SensorHub {
            position: position_rx,
            orientation: orientation_rx,
            forward_scan: forward_scan_rx,
            downward_range: downward_range_rx,
            mission: mission_rx,
        },
    )
}

impl Sensors for SensorHub {
    fn position(&mut self) -> Vector3<f64> {
        *self.position.borrow()
    }

    fn orientation(&mut self) -> UnitQuaternion<f64> {
        *self.orientation.borrow()
    }

    fn forward_scan(&mut self) -> Vec<f64> {
        self.forward_scan.borrow().clone()
    }

    fn downward_range(&mut self) -> Option<f64> {
        *self.downward_range.borrow()
    }

    fn mission(&mut self) -> Option<Vector3<f64>> {
        *self.mission.borrow()
    }
}

/// Publishes the setpoint and stick command of every tick.
#[derive(Debug)]
pub struct TelemetryHub {
    setpoint: watch::Sender<Setpoint>,
    stick: watch::Sender<StickCommand>,
}

/// Latest published setpoint and stick command.
#[derive(Clone, Debug)]
pub struct TelemetryFeeds {
    pub setpoint: watch::Receiver<Setpoint>,
    pub stick: watch::Receiver<StickCommand>,
}

pub fn telemetry_channel() -> (TelemetryHub, TelemetryFeeds) {
    let (setpoint, setpoint_rx) = watch::channel(Setpoint::cleared());
    let (stick, stick_rx) = watch::channel(StickCommand::neutral());

    (
        TelemetryHub { setpoint, stick },
        TelemetryFeeds {
            setpoint: setpoint_rx,
            stick: stick_rx,
        },
    )
}

impl Telemetry for TelemetryHub {
    fn setpoint(&mut self, setpoint: &Setpoint) {
        self.setpoint.send_replace(*setpoint);
    }

    fn stick(&mut self, stick: &StickCommand) {
        self.stick.send_replace(*stick);
    }
}
