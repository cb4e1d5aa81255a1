use crate::params::PidGains;

/// A single-axis PID controller evaluated at a fixed sample time.
///
/// The output is `kp * e + ki * sum(e) * dt + kd * (e - e_prev) / dt`.
/// The error sum only grows when [`AxisPid::update`] is called, so a controller
/// skipped on a tick does not integrate that tick.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisPid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub error: f64,
    pub prev_error: f64,
    pub error_sum: f64,
    /// Timestep in seconds
    pub sample_time: f64,
}

impl AxisPid {
    pub fn new(gains: PidGains, sample_time: f64) -> Self {
        Self {
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            error: 0.,
            prev_error: 0.,
            error_sum: 0.,
            sample_time,
        }
    }

    pub fn proportional(&self, error: f64) -> f64 {
        self.kp * error
    }

    /// Update the controller with the current error and return the unclamped output.
    pub fn update(&mut self, error: f64) -> f64 {
        self.error = error;
        self.error_sum += error;

        let p_out = self.proportional(error);
        let i_out = self.ki * self.error_sum * self.sample_time;
        let d_out = self.kd * (error - self.prev_error) / self.sample_time;

        self.prev_error = error;

        p_out + i_out + d_out
    }

    /// Update with the error between a target and a measurement.
    pub fn control(&mut self, target: f64, actual: f64) -> f64 {
        self.update(target - actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn larger_error_larger_proportional() {
        let gains = PidGains::new(2.5, 0.1, 0.3);

        for (small, large) in [(0.1, 0.2), (1., 4.), (-0.5, -3.)] {
            let p_small = AxisPid::new(gains, 0.06).proportional(small);
            let p_large = AxisPid::new(gains, 0.06).proportional(large);

            assert!(p_large.abs() > p_small.abs());
            assert_eq!(p_large.signum(), p_small.signum());
        }
    }

    #[test]
    fn terms_combine() {
        let mut pid = AxisPid::new(PidGains::new(2., 0.5, 0.1), 0.5);

        // p = 2, i = 0.5 * 1 * 0.5, d = 0.1 * 1 / 0.5
        assert_abs_diff_eq!(pid.update(1.), 2. + 0.25 + 0.2, epsilon = 1e-12);

        // p = 6, i = 0.5 * 4 * 0.5, d = 0.1 * 2 / 0.5
        assert_abs_diff_eq!(pid.control(5., 2.), 6. + 1. + 0.4, epsilon = 1e-12);
        assert_eq!(pid.prev_error, 3.);
        assert_eq!(pid.error_sum, 4.);
    }

    #[test]
    fn steady_error_only_grows_integral() {
        let mut pid = AxisPid::new(PidGains::new(1., 1., 1.), 0.1);
        let first = pid.update(1.);
        let second = pid.update(1.);

        // The derivative kick vanishes and the integral adds `ki * e * dt`
        assert_abs_diff_eq!(second - first, -10. + 0.1, epsilon = 1e-12);
    }
}
