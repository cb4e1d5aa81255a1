use super::pid::AxisPid;
use super::waypoint::{Axis, WaypointQueue};
use crate::params::{PositionParams, WaypointParams};
use crate::state::{constrain, StickCommand, STICK_NEUTRAL};
use log::info;
use nalgebra::Vector3;

/// Outer position loop producing stick commands.
///
/// Latitude error drives the roll stick, longitude error the pitch stick and
/// altitude error the throttle stick. A positive output deflects the stick above
/// neutral, which the attitude controller turns into a positive angle target.
pub struct PositionController {
    pub roll: AxisPid,
    pub pitch: AxisPid,
    pub throttle: AxisPid,
    queue: WaypointQueue,
    target: Option<Vector3<f64>>,
    regenerate: bool,
    params: PositionParams,
    waypoint: WaypointParams,
}

impl PositionController {
    /// Create a controller whose PIDs are evaluated every `sample_time` seconds.
    pub fn new(params: &PositionParams, waypoint: &WaypointParams, sample_time: f64) -> Self {
        Self {
            roll: AxisPid::new(params.roll, sample_time),
            pitch: AxisPid::new(params.pitch, sample_time),
            throttle: AxisPid::new(params.throttle, sample_time),
            queue: WaypointQueue::default(),
            target: None,
            regenerate: false,
            params: params.clone(),
            waypoint: waypoint.clone(),
        }
    }

    pub fn queue(&self) -> &WaypointQueue {
        &self.queue
    }

    /// The target set by the last change.
    pub fn target(&self) -> Option<Vector3<f64>> {
        self.target
    }

    /// The target each axis is steering to right now.
    pub fn instantaneous_target(&self, target: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            self.queue.head_or(Axis::Lat, target.x),
            self.queue.head_or(Axis::Long, target.y),
            target.z,
        )
    }

    /// Change the target the controller drives towards.
    ///
    /// Returns `true` if the lateral target changed. The waypoint queue is then
    /// cleared and rebuilt from the position passed to the next
    /// [`PositionController::update`]. An altitude change alone keeps the queue.
    pub fn set_target(&mut self, target: Vector3<f64>) -> bool {
        if let Some(current) = &mut self.target {
            if current.xy() == target.xy() {
                current.z = target.z;
                return false;
            }
        }

        info!(
            "Setpoint changed to ({:.7}, {:.7}, {:.2})",
            target.x, target.y, target.z
        );
        self.queue.clear();
        self.target = Some(target);
        self.regenerate = true;
        true
    }

    /// Run one evaluation of all three axes.
    ///
    /// Without a target the current position is held.
    pub fn update(&mut self, position: &Vector3<f64>) -> StickCommand {
        let target = self.target.unwrap_or(*position);

        if self.regenerate {
            self.queue.regenerate(
                position,
                &target,
                self.waypoint.lat_step_deg,
                self.waypoint.long_step_deg,
            );
            self.regenerate = false;
        }

        self.queue.retire(position, &self.waypoint.retire);
        let step_target = self.instantaneous_target(&target);

        let out_roll = self.roll.control(step_target.x, position.x);
        let out_pitch = self.pitch.control(step_target.y, position.y);
        let out_throttle = self.throttle.control(step_target.z, position.z);

        // Clamped after summing, the PIDs see the raw error
        StickCommand {
            roll: constrain(
                STICK_NEUTRAL + out_roll,
                self.params.lateral_stick_min,
                self.params.lateral_stick_max,
            ),
            pitch: constrain(
                STICK_NEUTRAL + out_pitch,
                self.params.lateral_stick_min,
                self.params.lateral_stick_max,
            ),
            yaw: STICK_NEUTRAL,
            throttle: constrain(
                STICK_NEUTRAL + out_throttle,
                self.params.throttle_stick_min,
                self.params.throttle_stick_max,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PidGains;

    fn controller() -> PositionController {
        PositionController::new(&PositionParams::default(), &WaypointParams::default(), 0.06)
    }

    #[test]
    fn holds_neutral_on_target() {
        let mut controller = controller();
        let here = Vector3::new(19.0009, 72.0001, 25.);

        controller.set_target(here);
        let stick = controller.update(&here);
        assert_eq!(stick.roll, STICK_NEUTRAL);
        assert_eq!(stick.pitch, STICK_NEUTRAL);
        assert_eq!(stick.yaw, STICK_NEUTRAL);
        assert_eq!(stick.throttle, STICK_NEUTRAL);
    }

    #[test]
    fn output_is_clamped_to_stick_limits() {
        let mut controller = controller();
        let here = Vector3::new(19.0009, 72.0001, 25.);

        let north_west_up = Vector3::new(19.00091, 72.00011, 40.);
        controller.set_target(north_west_up);
        let stick = controller.update(&here);
        assert_eq!(stick.roll, 1625.);
        assert_eq!(stick.pitch, 1625.);
        assert_eq!(stick.throttle, 2000.);

        let mut controller = self::controller();
        let south_east_down = Vector3::new(19.00089, 72.00009, 10.);
        controller.set_target(south_east_down);
        let stick = controller.update(&here);
        assert_eq!(stick.roll, 1375.);
        assert_eq!(stick.pitch, 1375.);
        assert_eq!(stick.throttle, 1000.);
    }

    #[test]
    fn integral_accumulates_past_the_clamp() {
        let params = PositionParams {
            throttle: PidGains::new(1000., 1., 0.),
            ..Default::default()
        };
        let mut controller = PositionController::new(&params, &WaypointParams::default(), 0.06);
        let here = Vector3::new(19.0009, 72.0001, 25.);
        let above = Vector3::new(19.0009, 72.0001, 35.);

        controller.set_target(above);
        for _ in 0..3 {
            assert_eq!(controller.update(&here).throttle, 2000.);
        }
        assert_eq!(controller.throttle.error_sum, 30.);
    }

    #[test]
    fn queue_regenerates_only_on_target_change() {
        let mut controller = controller();
        let here = Vector3::new(19.0, 72.0, 10.);
        let far = Vector3::new(19.001, 72.0, 10.);

        assert!(controller.set_target(far));
        controller.update(&here);
        let generated = controller.queue().queue(Axis::Lat).len();
        assert!(generated > 1);

        // Moving onto the first head retires it and the queue is not rebuilt
        assert!(!controller.set_target(far));
        let first = controller.queue().head(Axis::Lat).unwrap();
        controller.update(&Vector3::new(first, 72.0, 10.));
        assert_eq!(controller.queue().queue(Axis::Lat).len(), generated - 1);

        let elsewhere = Vector3::new(19.0, 72.001, 10.);
        assert!(controller.set_target(elsewhere));
        controller.update(&here);
        assert!(controller.queue().queue(Axis::Lat).is_empty());
        assert!(!controller.queue().queue(Axis::Long).is_empty());
    }

    #[test]
    fn altitude_change_keeps_the_queue() {
        let mut controller = controller();
        let mut here = Vector3::new(19.0, 72.0, 10.);

        assert!(controller.set_target(Vector3::new(19.001, 72.0, 10.)));
        controller.update(&here);
        let generated = controller.queue().queue(Axis::Lat).len();

        for i in 1..=4 {
            here.x = controller.queue().head(Axis::Lat).unwrap();
            let climbing = Vector3::new(19.001, 72.0, 10. + 0.2 * i as f64);

            assert!(!controller.set_target(climbing));
            assert_eq!(controller.target(), Some(climbing));
            controller.update(&here);
            assert_eq!(controller.queue().queue(Axis::Lat).len(), generated - i);
        }
    }

    #[test]
    fn steers_to_queue_head_before_target() {
        let mut controller = controller();
        let here = Vector3::new(19.0, 72.0, 10.);
        let far = Vector3::new(19.001, 72.0, 10.);

        controller.set_target(far);
        controller.update(&here);
        let step = controller.instantaneous_target(&far);
        assert!(step.x < far.x);
        assert!(step.x > here.x);
    }
}
