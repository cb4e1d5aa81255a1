use crate::params::Tolerance;
use nalgebra::Vector3;
use std::collections::VecDeque;

/// Lateral axis of a waypoint queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Lat,
    Long,
}

/// Intermediate setpoints splitting a long move into bounded steps.
///
/// Each lateral axis has its own queue. Both queues step towards the target
/// along the straight line from the position at generation time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaypointQueue {
    lat: VecDeque<f64>,
    long: VecDeque<f64>,
}

impl WaypointQueue {
    /// Clear both queues and rebuild them from `current` towards `target`.
    ///
    /// The axis with the larger error is stepped by its own limit. The other axis
    /// is stepped by that limit scaled by the tangent of the bearing, so both queues
    /// have the same length. The final entry of each queue is the target itself.
    /// Nothing is queued when the dominant error is within one step or not finite.
    pub fn regenerate(
        &mut self,
        current: &Vector3<f64>,
        target: &Vector3<f64>,
        lat_step: f64,
        long_step: f64,
    ) {
        self.clear();

        let lat_err = target.x - current.x;
        let long_err = target.y - current.y;
        if !(lat_err.is_finite() && long_err.is_finite()) {
            return;
        }

        let (major, minor) = if lat_err.abs() >= long_err.abs() {
            (Axis::Lat, Axis::Long)
        } else {
            (Axis::Long, Axis::Lat)
        };
        let (major_err, major_step, minor_err) = match major {
            Axis::Lat => (lat_err, lat_step, long_err),
            Axis::Long => (long_err, long_step, lat_err),
        };

        if major_err.abs() <= major_step {
            return;
        }

        let count = step_count(major_err.abs(), major_step);
        let tan_theta = (minor_err / major_err).abs();

        let major_queue = steps(axis_value(current, major), axis_value(target, major), major_step, count);
        *self.queue_mut(major) = major_queue;

        if minor_err != 0. {
            let minor_queue = steps(
                axis_value(current, minor),
                axis_value(target, minor),
                major_step * tan_theta,
                count,
            );
            *self.queue_mut(minor) = minor_queue;
        }
    }

    /// Pop each queue head the vehicle has reached.
    ///
    /// The tolerance boundary counts as reached.
    pub fn retire(&mut self, current: &Vector3<f64>, tolerance: &Tolerance) {
        if let Some(&head) = self.lat.front() {
            if (current.x - head).abs() <= tolerance.lat_deg {
                self.lat.pop_front();
            }
        }

        if let Some(&head) = self.long.front() {
            if (current.y - head).abs() <= tolerance.long_deg {
                self.long.pop_front();
            }
        }
    }

    pub fn head(&self, axis: Axis) -> Option<f64> {
        self.queue(axis).front().copied()
    }

    /// The queue head for `axis`, or `fallback` once the queue is drained.
    pub fn head_or(&self, axis: Axis, fallback: f64) -> f64 {
        self.head(axis).unwrap_or(fallback)
    }

    pub fn queue(&self, axis: Axis) -> &VecDeque<f64> {
        match axis {
            Axis::Lat => &self.lat,
            Axis::Long => &self.long,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty() && self.long.is_empty()
    }

    pub fn clear(&mut self) {
        self.lat.clear();
        self.long.clear();
    }

    fn queue_mut(&mut self, axis: Axis) -> &mut VecDeque<f64> {
        match axis {
            Axis::Lat => &mut self.lat,
            Axis::Long => &mut self.long,
        }
    }
}

fn axis_value(v: &Vector3<f64>, axis: Axis) -> f64 {
    match axis {
        Axis::Lat => v.x,
        Axis::Long => v.y,
    }
}

// Exact multiples of the step must not gain an extra step from rounding noise.
fn step_count(distance: f64, step: f64) -> usize {
    ((distance / step) * (1. - 1e-9)).ceil() as usize
}

fn steps(from: f64, to: f64, step: f64, count: usize) -> VecDeque<f64> {
    let sign = (to - from).signum();
    (1..=count)
        .map(|i| {
            if i == count {
                to
            } else {
                from + sign * step * i as f64
            }
        })
        .collect()
}
