use embedded_hal::PwmPin;

use super::Esc;

/// Builder for an [`Esc`] with custom duty limits.
pub struct Builder<T> {
    arm: T,
    min: T,
    max: Option<T>,
}

impl<T: Default> Default for Builder<T> {
    fn default() -> Self {
        Self {
            arm: T::default(),
            min: T::default(),
            max: None,
        }
    }
}

impl<T> Builder<T> {
    pub fn arm(mut self, arm: T) -> Self {
        self.arm = arm;
        self
    }

    pub fn min(mut self, min: T) -> Self {
        self.min = min;
        self
    }

    pub fn max(mut self, max: T) -> Self {
        self.max = Some(max);
        self
    }

    /// Build the ESC, defaulting the max duty to the pin's max duty.
    pub fn build<P>(self, pin: P) -> Esc<P>
    where
        P: PwmPin<Duty = T>,
    {
        Esc {
            arm: self.arm,
            min: self.min,
            max: self.max.unwrap_or(pin.get_max_duty()),
            pin,
        }
    }
}
