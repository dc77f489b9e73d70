use crate::models::ProposalStatus;
use crate::services::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the matching core to its immediate caller
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Proposal {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: ProposalStatus,
        to: ProposalStatus,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MatchError {
    /// Only transient store outages are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatchError::Store(StoreError::Unavailable(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(MatchError::Store(StoreError::Unavailable("down".into())).is_retryable());
        assert!(!MatchError::Store(StoreError::Backend("bad sql".into())).is_retryable());
        assert!(!MatchError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_transition_message() {
        let err = MatchError::InvalidTransition {
            id: Uuid::nil(),
            from: ProposalStatus::Accepted,
            to: ProposalStatus::Declined,
        };
        assert_eq!(
            err.to_string(),
            "Proposal 00000000-0000-0000-0000-000000000000 cannot move from accepted to declined"
        );
    }
}
