/// Errors raised by the simulation engine.
///
/// A percent reduction that cannot be computed is not an error; see
/// [`crate::incidence::Reduction::NotApplicable`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("numerical instability at day {day}: {reason}")]
    NumericalInstability { day: u32, reason: String },
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter { name, reason: reason.into() }
    }

    pub(crate) fn unstable(day: u32, reason: impl Into<String>) -> Self {
        SimError::NumericalInstability { day, reason: reason.into() }
    }
}
