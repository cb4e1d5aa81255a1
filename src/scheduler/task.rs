/// A task to run at a specific frequency.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub name: &'static str,

    /// The desired frequency (in hz) to run the task.
    pub hz: f64,

    /// The last tick this task was ran.
    pub last_run: Option<u64>,
}

impl Task {
    /// Create a task that runs every time the scheduler loops.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            hz: 0.,
            last_run: None,
        }
    }

    /// Builder method to set `hz` and return `self`
    pub fn with_hz(mut self, hz: f64) -> Self {
        self.hz = hz;
        self
    }

    /// Calculate the desired ticks between each run of the task
    pub fn ticks(&self, loop_rate_hz: f64) -> u64 {
        // A 0hz task should be ran at the rate of the scheduler loop
        if self.hz <= 0. {
            return 1;
        }
        ((loop_rate_hz / self.hz).round() as u64).max(1)
    }

    /// The time (in seconds) between runs of this task.
    pub fn period_s(&self, loop_rate_hz: f64) -> f64 {
        self.ticks(loop_rate_hz) as f64 / loop_rate_hz
    }

    /// If this task is ready returns the ticks elapsed since the last run.
    /// Otherwise this returns `None`.
    ///
    /// A task that never ran is always ready.
    pub fn ready(&self, current_tick: u64, ticks: u64) -> Option<u64> {
        let dt = match self.last_run {
            Some(last_run) => current_tick.saturating_sub(last_run),
            None => return Some(current_tick),
        };

        if dt >= ticks {
            Some(dt)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ticks_round_to_loop_rate() {
        let control = Task::new("position").with_hz(1. / 0.06);
        assert_eq!(control.ticks(50.), 3);
        assert_abs_diff_eq!(control.period_s(50.), 0.06, epsilon = 1e-12);

        assert_eq!(Task::new("attitude").ticks(50.), 1);
        assert_eq!(Task::new("fast").with_hz(400.).ticks(50.), 1);
        assert_eq!(Task::new("gripper").with_hz(5.).ticks(50.), 10);
    }

    #[test]
    fn ready_after_period() {
        let mut task = Task::new("gripper").with_hz(5.);
        assert_eq!(task.ready(1, 10), Some(1));

        task.last_run = Some(1);
        assert_eq!(task.ready(10, 10), None);
        assert_eq!(task.ready(11, 10), Some(10));
    }
}
