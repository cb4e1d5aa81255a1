//! # copter-nav
//! Waypoint navigation, cascaded PID control and obstacle avoidance for multi-copters.
//!
//! # Examples
//!
//! Run a [`Copter`] from watch-backed sensor channels until ctrl-c:
//! ```ignore
//! use copter_nav::hal::{sensor_channel, telemetry_channel};
//! use copter_nav::{Copter, MotorCommand, Params};
//!
//! let params = Params::load("copter.toml")?;
//! let (feeds, sensors) = sensor_channel();
//! let (telemetry, outputs) = telemetry_channel();
//! let (motors, motor_rx) = tokio::sync::watch::channel(MotorCommand::zero());
//!
//! // Sensor drivers write through `feeds` while the loop runs
//! let mut copter = Copter::new(params, sensors, gripper, telemetry, motors)?;
//! copter.run(async { tokio::signal::ctrl_c().await.ok(); }).await;
//! ```
//!
//! Use the lower level [`AttitudeController`](copter::control::AttitudeController) to get the motor output for a stick command:
//! ```
//! use copter_nav::copter::control::AttitudeController;
//! use copter_nav::params::AttitudeParams;
//! use copter_nav::state::{Attitude, StickCommand};
//!
//! let mut controller = AttitudeController::new(&AttitudeParams::default(), 0.06);
//! controller.verify().unwrap();
//!
//! let stick = StickCommand { throttle: 1500., ..StickCommand::neutral() };
//! let output = controller.update(&stick, &Attitude::default());
//! assert_eq!(output.0, [512.; 4]);
//! ```
//!
//! # Components
//! [`geo`] converts between latitude/longitude and the local planar frame.
//!
//! [`control`](copter::control) contains the waypoint queue, the position and attitude
//! controllers and the motor mixer.
//!
//! [`avoidance`](copter::avoidance) contains the obstacle state machine and the ground climb.
//!
//! [`scheduler`] runs tasks at desired frequencies inside the control loop.
//!
//! [`hal`] contains the hardware abstraction layer.

pub mod copter;
pub use copter::Copter;

pub mod error;
pub use error::Error;

pub mod geo;

pub mod hal;
pub use hal::{Actuator, Gripper, Sensors, Telemetry};

pub mod params;
pub use params::Params;

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod state;
pub use state::{MotorCommand, Setpoint, StickCommand, VehicleState};
