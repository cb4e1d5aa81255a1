//! Tick-based scheduling of work inside the fixed-rate control loop.
//!
//! Every task runs on a whole number of loop ticks, so a task's period is exact
//! and can be used directly as the sample time of the controller it drives.

mod task;
pub use task::Task;

/// Index of a task registered with a [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskId(usize);

/// Tick counter deciding which tasks are due on each loop.
#[derive(Clone, Debug)]
pub struct Scheduler {
    tasks: Vec<Task>,
    tick_counter: u64,
    loop_rate_hz: f64,
}

impl Scheduler {
    pub fn new(loop_rate_hz: f64) -> Self {
        Self {
            tasks: Vec::new(),
            tick_counter: 0,
            loop_rate_hz,
        }
    }

    pub fn add(&mut self, task: Task) -> TaskId {
        self.tasks.push(task);
        TaskId(self.tasks.len() - 1)
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    pub fn loop_rate_hz(&self) -> f64 {
        self.loop_rate_hz
    }

    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    /// The time (in seconds) between runs of a task.
    pub fn period_s(&self, id: TaskId) -> f64 {
        self.task(id).period_s(self.loop_rate_hz)
    }

    /// Start the next loop tick.
    pub fn tick(&mut self) {
        self.tick_counter = self.tick_counter.wrapping_add(1);
    }

    /// Returns `true` if the task is due on this tick and records that it ran.
    pub fn poll(&mut self, id: TaskId) -> bool {
        let tick = self.tick_counter;
        let task = &mut self.tasks[id.0];
        let ticks = task.ticks(self.loop_rate_hz);

        if task.ready(tick, ticks).is_some() {
            // Record the tick counter when we ran
            // This determines when we next run the task
            task.last_run = Some(tick);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_run_on_their_period() {
        let mut scheduler = Scheduler::new(50.);
        let every = scheduler.add(Task::new("attitude"));
        let third = scheduler.add(Task::new("position").with_hz(50. / 3.));

        let mut runs = (0, 0);
        for _ in 0..9 {
            scheduler.tick();
            runs.0 += scheduler.poll(every) as u32;
            runs.1 += scheduler.poll(third) as u32;
        }

        assert_eq!(runs, (9, 3));
        assert_eq!(scheduler.task(third).last_run, Some(7));
    }
}
