//! PWM output to electronic speed controllers.

mod builder;
pub use builder::Builder;

use super::Actuator;
use crate::state::{constrain, MotorCommand, MOTOR_PWM_MAX};
use embedded_hal::PwmPin;
use num_traits::{NumCast, ToPrimitive};

/// An electronic speed controller driven by a PWM pin.
pub struct Esc<P: PwmPin> {
    arm: P::Duty,
    min: P::Duty,
    max: P::Duty,
    pin: P,
}

impl<P> Esc<P>
where
    P: PwmPin,
    P::Duty: NumCast + ToPrimitive + Copy,
{
    pub fn new(arm: P::Duty, min: P::Duty, max: P::Duty, pin: P) -> Self {
        Self { arm, min, max, pin }
    }

    pub fn builder() -> Builder<P::Duty>
    where
        P::Duty: Default,
    {
        Builder::default()
    }

    /// Enable the pin and output the arming duty.
    pub fn arm(&mut self) {
        self.pin.enable();
        self.pin.set_duty(self.arm);
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// The duty for a motor command in `[0, MOTOR_PWM_MAX]`.
    pub fn duty(&self, pwm: f64) -> P::Duty {
        let (min, max) = match (self.min.to_f64(), self.max.to_f64()) {
            (Some(min), Some(max)) => (min, max),
            _ => return self.min,
        };

        let pwm = constrain(pwm, 0., MOTOR_PWM_MAX);
        let duty = min + pwm * (max - min) / MOTOR_PWM_MAX;
        <P::Duty as NumCast>::from(duty.round()).unwrap_or(self.min)
    }
}

impl<P> Actuator<f64> for Esc<P>
where
    P: PwmPin,
    P::Duty: NumCast + ToPrimitive + Copy,
{
    fn output(&mut self, output: f64) {
        let duty = self.duty(output);
        self.pin.set_duty(duty);
    }
}

/// The four ESCs of a quad-copter, in motor order.
pub struct EscMotors<P: PwmPin> {
    pub escs: [Esc<P>; 4],
}

impl<P> EscMotors<P>
where
    P: PwmPin,
    P::Duty: NumCast + ToPrimitive + Copy,
{
    pub fn new(escs: [Esc<P>; 4]) -> Self {
        Self { escs }
    }

    pub fn arm(&mut self) {
        for esc in &mut self.escs {
            esc.arm();
        }
    }
}

impl<P> Actuator<MotorCommand> for EscMotors<P>
where
    P: PwmPin,
    P::Duty: NumCast + ToPrimitive + Copy,
{
    fn output(&mut self, output: MotorCommand) {
        for (esc, pwm) in self.escs.iter_mut().zip(output.0) {
            esc.output(pwm);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockPin {
        duty: u16,
        enabled: bool,
    }

    impl PwmPin for MockPin {
        type Duty = u16;

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn get_duty(&self) -> u16 {
            self.duty
        }

        fn get_max_duty(&self) -> u16 {
            2000
        }

        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }
    }

    fn esc() -> Esc<MockPin> {
        Esc::<MockPin>::builder()
            .arm(1000)
            .min(1000)
            .build(MockPin::default())
    }

    #[test]
    fn builder_defaults_max_to_pin() {
        let mut esc = esc();
        esc.output(MOTOR_PWM_MAX);
        assert_eq!(esc.pin().get_duty(), 2000);

        esc.arm();
        assert!(esc.pin().enabled);
        assert_eq!(esc.pin().get_duty(), 1000);
    }

    #[test]
    fn motor_range_maps_onto_duty_range() {
        let esc = esc();
        assert_eq!(esc.duty(0.), 1000);
        assert_eq!(esc.duty(512.), 1500);
        assert_eq!(esc.duty(-20.), 1000);
        assert_eq!(esc.duty(5000.), 2000);
        assert_eq!(esc.duty(f64::NAN), 1000);
    }

    #[test]
    fn motors_follow_command_order() {
        let mut motors = EscMotors::new([esc(), esc(), esc(), esc()]);
        motors.arm();
        motors.output(MotorCommand([0., 256., 768., 1024.]));

        let duties: Vec<u16> = motors.escs.iter().map(|esc| esc.pin().get_duty()).collect();
        assert_eq!(duties, vec![1000, 1250, 1750, 2000]);
    }
}
