use crate::params::SectorParams;

/// The forward range finder ray facing a bearing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sector {
    /// Straight ahead, ray 0.
    Forward,
    /// Ray 1.
    ForwardLeft,
    /// Ray 2. Also used for a bearing along the longitude axis.
    Lateral,
    /// Ray 3.
    ForwardRight,
    /// No cone matches the bearing.
    Undefined,
}

impl Sector {
    pub fn ray(self) -> Option<usize> {
        match self {
            Sector::Forward => Some(0),
            Sector::ForwardLeft => Some(1),
            Sector::Lateral => Some(2),
            Sector::ForwardRight => Some(3),
            Sector::Undefined => None,
        }
    }
}

/// Bucket the bearing angle `θ = atan(Δlong / Δlat)` into a sector.
///
/// `None` is a bearing with no latitude change.
pub fn sector_for(angle: Option<f64>, params: &SectorParams) -> Sector {
    let theta = match angle {
        Some(theta) => theta,
        None => return Sector::Lateral,
    };

    if theta.abs() >= params.lateral_min_rad {
        Sector::Lateral
    } else if theta < -params.side_min_rad && theta > -params.lateral_min_rad {
        Sector::ForwardLeft
    } else if theta.abs() <= params.forward_max_rad {
        Sector::Forward
    } else if theta > params.forward_max_rad && theta < params.lateral_min_rad {
        Sector::ForwardRight
    } else {
        Sector::Undefined
    }
}
