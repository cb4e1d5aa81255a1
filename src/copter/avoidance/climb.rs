use crate::params::ClimbParams;
use log::info;
use nalgebra::Vector3;

/// Climbs away from the ground when the downward range finder reads too close.
///
/// The climb starts from the altitude at the first close reading and rises by
/// `climb_rate_mps * dt` every tick for at most `max_ticks` ticks. After that the
/// maneuver stays exhausted until the ground clears.
#[derive(Clone, Debug)]
pub struct ClimbManeuver {
    params: ClimbParams,
    dt: f64,
    base_alt: Option<f64>,
    ticks: u32,
}

impl ClimbManeuver {
    /// Create a maneuver advancing by `dt` seconds per update.
    pub fn new(params: &ClimbParams, dt: f64) -> Self {
        Self {
            params: params.clone(),
            dt,
            base_alt: None,
            ticks: 0,
        }
    }

    /// Returns `true` while the downward range finder reports the ground too close.
    pub fn detected_bottom(&self) -> bool {
        self.base_alt.is_some()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Advance one tick and return the altitude target while climbing.
    pub fn update(
        &mut self,
        downward_range: Option<f64>,
        payload_held: bool,
        position: &Vector3<f64>,
    ) -> Option<f64> {
        let too_close = downward_range.map_or(false, |range| range <= self.params.trigger_range_m)
            && !payload_held
            && position.z != 0.;

        if !too_close {
            if self.base_alt.take().is_some() {
                info!("Ground clear after {} climb ticks", self.ticks);
            }
            self.ticks = 0;
            return None;
        }

        let base_alt = *self.base_alt.get_or_insert_with(|| {
            info!("Ground too close at {:.2} m, climbing", position.z);
            position.z
        });

        if self.ticks >= self.params.max_ticks {
            return None;
        }
        self.ticks += 1;

        Some(base_alt + self.params.climb_rate_mps * self.dt * f64::from(self.ticks))
    }
}
