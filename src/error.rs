use crate::{copter::control::MixingError, params::ParamsError};
use thiserror::Error;

/// An error that prevents the control stack from starting.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("Motor mixing check failed: {0}")]
    Mixing(#[from] MixingError),
}
