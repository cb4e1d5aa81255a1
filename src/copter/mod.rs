//! The multi-copter control loop.
//!
//! Every tick reads one snapshot of the sensors, lets the avoidance rules override
//! the mission, runs the position and attitude controllers when their tasks are due
//! and publishes the setpoint, stick and motor commands.

pub mod avoidance;
pub mod control;

use crate::{
    error::Error,
    geo::LocalFrame,
    hal::{Actuator, Gripper, Sensors, Telemetry},
    params::Params,
    scheduler::{Scheduler, Task, TaskId},
    state::{MotorCommand, Setpoint, StickCommand, VehicleState},
};
use avoidance::{compose_setpoint, ClimbManeuver, ObstacleMonitor};
use control::{AttitudeController, PositionController};
use log::{debug, info, warn};
use nalgebra::Vector3;
use std::future::Future;
use tokio::time::{self, Duration, MissedTickBehavior};

/// A quad-copter flying to a mission target around obstacles.
pub struct Copter<S, G, T, M> {
    pub params: Params,
    sensors: S,
    gripper: G,
    telemetry: T,
    motors: M,
    scheduler: Scheduler,
    position_task: TaskId,
    attitude_task: TaskId,
    gripper_task: TaskId,
    position: PositionController,
    attitude: AttitudeController,
    obstacles: ObstacleMonitor,
    climb: ClimbManeuver,
    hold_point: Option<Vector3<f64>>,
    mission_rejected: bool,
    payload_held: bool,
    setpoint: Setpoint,
    stick: StickCommand,
    motor_cmd: MotorCommand,
}

impl<S, G, T, M> Copter<S, G, T, M>
where
    S: Sensors,
    G: Gripper,
    T: Telemetry,
    M: Actuator<MotorCommand>,
{
    /// Create the control stack, checking the parameters and the motor mixing.
    pub fn new(
        params: Params,
        sensors: S,
        gripper: G,
        telemetry: T,
        motors: M,
    ) -> Result<Self, Error> {
        params.validate()?;

        let mut scheduler = Scheduler::new(params.loop_rate_hz);
        let position_task =
            scheduler.add(Task::new("position").with_hz(1. / params.position.sample_time_s));
        let attitude_task =
            scheduler.add(Task::new("attitude").with_hz(1. / params.attitude.sample_time_s));
        let gripper_task = scheduler.add(Task::new("gripper").with_hz(params.gripper.query_hz));

        let position = PositionController::new(
            &params.position,
            &params.waypoint,
            scheduler.period_s(position_task),
        );
        let attitude = AttitudeController::new(&params.attitude, scheduler.period_s(attitude_task));
        attitude.verify()?;

        let obstacles = ObstacleMonitor::new(&params.avoidance, LocalFrame::from(&params.frame));
        let climb = ClimbManeuver::new(&params.climb, params.loop_period_s());

        info!(
            "Control stack ready: loop {} Hz, position every {:.3} s, attitude every {:.3} s",
            params.loop_rate_hz,
            scheduler.period_s(position_task),
            scheduler.period_s(attitude_task)
        );

        Ok(Self {
            params,
            sensors,
            gripper,
            telemetry,
            motors,
            scheduler,
            position_task,
            attitude_task,
            gripper_task,
            position,
            attitude,
            obstacles,
            climb,
            hold_point: None,
            mission_rejected: false,
            payload_held: false,
            setpoint: Setpoint::cleared(),
            stick: StickCommand::neutral(),
            motor_cmd: MotorCommand::zero(),
        })
    }

    pub fn setpoint(&self) -> &Setpoint {
        &self.setpoint
    }

    pub fn stick(&self) -> &StickCommand {
        &self.stick
    }

    pub fn motor_command(&self) -> &MotorCommand {
        &self.motor_cmd
    }

    pub fn payload_held(&self) -> bool {
        self.payload_held
    }

    pub fn obstacles(&self) -> &ObstacleMonitor {
        &self.obstacles
    }

    pub fn climb(&self) -> &ClimbManeuver {
        &self.climb
    }

    pub fn position_controller(&self) -> &PositionController {
        &self.position
    }

    pub fn attitude_controller(&self) -> &AttitudeController {
        &self.attitude
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run one iteration of the control loop and return the published motor command.
    ///
    /// Without a position fix the controllers are skipped and the previous motor
    /// command is published again.
    pub fn tick(&mut self) -> MotorCommand {
        self.scheduler.tick();
        let state = self.sensors.snapshot();

        if !state.has_fix() {
            debug!("No position fix, skipping control");
            self.motors.output(self.motor_cmd);
            return self.motor_cmd;
        }
        let position = state.position;

        let target = match self.mission_target(&state) {
            Some(target) => {
                self.hold_point = None;
                target
            }
            None => *self.hold_point.get_or_insert(position),
        };

        let forward_override = self.obstacles.update(&position, &state.forward_scan, &target);
        self.obstacles.track_last_point(&position);
        let climb_alt = self
            .climb
            .update(state.downward_range, self.payload_held, &position);
        self.setpoint = compose_setpoint(&target, forward_override, climb_alt);

        if self.scheduler.poll(self.position_task) {
            self.position.set_target(self.setpoint.target);
            self.stick = self.position.update(&position);
        }

        if self.scheduler.poll(self.attitude_task) {
            self.motor_cmd = self.attitude.update(&self.stick, &state.attitude());
        }

        self.telemetry.setpoint(&self.setpoint);
        self.telemetry.stick(&self.stick);
        self.motors.output(self.motor_cmd);

        self.motor_cmd
    }

    /// The mission to fly to, or `None` to hold position.
    ///
    /// A mission with a zero component is not a real target. A non-finite mission or
    /// one further than `waypoint.max_leg_deg` on either lateral axis is rejected.
    fn mission_target(&mut self, state: &VehicleState) -> Option<Vector3<f64>> {
        let mission = state.mission.filter(|target| target.iter().all(|v| *v != 0.))?;
        let max_leg = self.params.waypoint.max_leg_deg;

        let reason = if !mission.iter().all(|v| v.is_finite()) {
            Some("non-finite component")
        } else if (mission.x - state.position.x).abs() > max_leg
            || (mission.y - state.position.y).abs() > max_leg
        {
            Some("further than the maximum leg")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                if !self.mission_rejected {
                    warn!(
                        "Rejected mission ({:.7}, {:.7}, {:.2}): {}, holding position",
                        mission.x, mission.y, mission.z, reason
                    );
                    self.mission_rejected = true;
                }
                None
            }
            None => {
                self.mission_rejected = false;
                Some(mission)
            }
        }
    }

    /// Query the gripper, treating any failure as no payload held.
    ///
    /// The query is bounded by the gripper timeout.
    pub async fn refresh_payload(&mut self) -> bool {
        let timeout_ms = self.params.gripper.timeout_ms;

        self.payload_held =
            match time::timeout(Duration::from_millis(timeout_ms), self.gripper.query()).await {
                Ok(Ok(held)) => held,
                Ok(Err(e)) => {
                    warn!("{}, assuming no payload", e);
                    false
                }
                Err(_) => {
                    warn!("Gripper query timed out after {} ms, assuming no payload", timeout_ms);
                    false
                }
            };

        self.payload_held
    }

    /// Run the control loop at the loop rate until `shutdown` completes.
    ///
    /// The gripper is queried after the control tick, when its task is due.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = time::interval(Duration::from_secs_f64(self.params.loop_period_s()));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("Control loop started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    self.tick();

                    if self.scheduler.poll(self.gripper_task) {
                        self.refresh_payload().await;
                    }
                }
            }
        }

        self.shutdown();
    }

    /// Publish a cleared setpoint, neutral sticks and stopped motors.
    pub fn shutdown(&mut self) {
        info!("Shutting down, publishing neutral outputs");

        self.setpoint = Setpoint::cleared();
        self.stick = StickCommand::neutral();
        self.motor_cmd = MotorCommand::zero();

        self.telemetry.setpoint(&self.setpoint);
        self.telemetry.stick(&self.stick);
        self.motors.output(self.motor_cmd);
    }
}
