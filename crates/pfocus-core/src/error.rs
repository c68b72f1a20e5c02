use crate::Count;

/// Errors raised by the trigger engine.
///
/// `InvalidInput` and `AllocationFailure` are only produced while building an
/// instance. `InvalidObservation` is produced by a step and latches the
/// detector that saw it. `QuorumLost` is produced by [`crate::BigTrigger`]
/// once too many channels have faulted for the majority to be reachable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FocusError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidInput { name: &'static str, reason: String },

    #[error("Invalid observation: count {count}, background {background}")]
    InvalidObservation { count: Count, background: f64 },

    #[error("Quorum lost: {live} live channels, majority requires {majority}")]
    QuorumLost { live: usize, majority: usize },

    #[error("Failed to allocate {what} buffer")]
    AllocationFailure { what: &'static str },
}

impl FocusError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors raised while stepping, as opposed to construction.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            Self::InvalidObservation { .. } | Self::QuorumLost { .. }
        )
    }
}
