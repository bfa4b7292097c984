use std::error::Error as StdError;

/// Errors that can occur during a programming run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid programming config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("{targets} target resistances were supplied for {devices} devices")]
    TargetCountMismatch { targets: usize, devices: usize },

    #[error("device error: {0}")]
    Device(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn device<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Device(Box::new(err))
    }
}
