//! Rule and input errors.
//!
//! [`ValidationError`] rejects malformed input before any rule runs.
//! [`CoreError`] covers requests that are well formed but not allowed,
//! such as picking up a cancelled rental. The API maps both to status codes;
//! storage failures are a separate type in `rentwell-db`.

use thiserror::Error;

use crate::lifecycle::RentalAction;
use crate::types::RentalStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    /// `action` is not allowed while the rental is `from`. Returned before
    /// anything is written.
    #[error("Rental {rental_id} is {from}, cannot {action}")]
    InvalidTransition {
        rental_id: String,
        from: RentalStatus,
        action: RentalAction,
    },

    /// End before start, or longer than `MAX_RENTAL_DAYS`.
    #[error("bad rental dates: {reason}")]
    InvalidPeriod { reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A field that failed its input check. `field` uses the wire name
/// (`itemId`, `priceDaily`) so messages read the same as the request.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = CoreError::InvalidTransition {
            rental_id: "r-1".to_string(),
            from: RentalStatus::Cancelled,
            action: RentalAction::ConfirmPickup,
        };
        assert_eq!(
            err.to_string(),
            "Rental r-1 is cancelled, cannot confirm pickup"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("itemId").to_string(),
            "itemId is required"
        );

        let err = ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 1,
            max: 365,
        };
        assert_eq!(err.to_string(), "days must be between 1 and 365");

        let err = ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec!["available".to_string(), "unavailable".to_string()],
        };
        assert_eq!(err.to_string(), "status must be one of available, unavailable");
    }

    #[test]
    fn test_validation_passes_through_core_error() {
        let core_err: CoreError = ValidationError::required("startDate").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "startDate is required");
    }
}
