//! # Rental Lifecycle
//!
//! The rental state machine, as pure functions.
//!
//! ## Transition Table
//! ```text
//! ┌────────────────┬─────────────────────┬────────────┬──────────────────────┐
//! │ Action         │ Allowed from        │ No-op from │ Target               │
//! ├────────────────┼─────────────────────┼────────────┼──────────────────────┤
//! │ ConfirmPickup  │ confirmed           │ active     │ active               │
//! │ ConfirmReturn  │ confirmed, active   │ completed  │ completed            │
//! │ Complete       │ confirmed, active   │ completed  │ completed            │
//! │ Cancel         │ pending, confirmed  │ cancelled  │ cancelled            │
//! └────────────────┴─────────────────────┴────────────┴──────────────────────┘
//!   anything else → CoreError::InvalidTransition, nothing written
//! ```
//!
//! Creation is not an action here: a new rental starts as `confirmed`
//! (payment is a stub), and reservation is handled by the store.
//!
//! ## Item Status Follows Rental Facts
//! After every write the item status is recomputed with [`settle_item_status`]:
//! `rented` while any occupying rental exists, otherwise whatever the owner
//! chose (`available` or `unavailable`).

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{ItemStatus, RentalStatus};

// =============================================================================
// Actions
// =============================================================================

/// Something a renter or owner asks to do with an existing rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RentalAction {
    ConfirmPickup,
    ConfirmReturn,
    Complete,
    Cancel,
}

impl RentalAction {
    pub const ALL: [RentalAction; 4] = [
        RentalAction::ConfirmPickup,
        RentalAction::ConfirmReturn,
        RentalAction::Complete,
        RentalAction::Cancel,
    ];

    /// Status the rental ends up in.
    pub const fn target(&self) -> RentalStatus {
        match self {
            RentalAction::ConfirmPickup => RentalStatus::Active,
            RentalAction::ConfirmReturn | RentalAction::Complete => RentalStatus::Completed,
            RentalAction::Cancel => RentalStatus::Cancelled,
        }
    }

    /// Whether `from` may move to [`target`](Self::target).
    pub const fn allowed_from(&self, from: RentalStatus) -> bool {
        match self {
            RentalAction::ConfirmPickup => matches!(from, RentalStatus::Confirmed),
            RentalAction::ConfirmReturn | RentalAction::Complete => {
                matches!(from, RentalStatus::Confirmed | RentalStatus::Active)
            }
            RentalAction::Cancel => matches!(from, RentalStatus::Pending | RentalStatus::Confirmed),
        }
    }

    /// Only the renter may cancel. Every other action is open to the
    /// renter and the item owner.
    pub const fn renter_only(&self) -> bool {
        matches!(self, RentalAction::Cancel)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RentalAction::ConfirmPickup => "confirm pickup",
            RentalAction::ConfirmReturn => "confirm return",
            RentalAction::Complete => "complete",
            RentalAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for RentalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transition Planning
// =============================================================================

/// What applying an action to a rental would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move the rental from `from` to `to`.
    Change { from: RentalStatus, to: RentalStatus },
    /// The rental is already where the action leads. Nothing to write.
    Unchanged(RentalStatus),
}

impl Transition {
    /// Status the rental has once the transition is applied.
    pub const fn resulting_status(&self) -> RentalStatus {
        match self {
            Transition::Change { to, .. } => *to,
            Transition::Unchanged(status) => *status,
        }
    }
}

/// Plans `action` against a rental currently in `current`.
///
/// ## Example
/// ```rust
/// use rentwell_core::lifecycle::plan;
/// use rentwell_core::{RentalAction, RentalStatus, Transition};
///
/// let t = plan("r-1", RentalStatus::Confirmed, RentalAction::ConfirmPickup).unwrap();
/// assert_eq!(t, Transition::Change { from: RentalStatus::Confirmed, to: RentalStatus::Active });
///
/// let t = plan("r-1", RentalStatus::Active, RentalAction::ConfirmPickup).unwrap();
/// assert_eq!(t, Transition::Unchanged(RentalStatus::Active));
///
/// assert!(plan("r-1", RentalStatus::Cancelled, RentalAction::ConfirmReturn).is_err());
/// ```
pub fn plan(rental_id: &str, current: RentalStatus, action: RentalAction) -> CoreResult<Transition> {
    let target = action.target();

    if current == target {
        return Ok(Transition::Unchanged(current));
    }

    if action.allowed_from(current) {
        Ok(Transition::Change {
            from: current,
            to: target,
        })
    } else {
        Err(CoreError::InvalidTransition {
            rental_id: rental_id.to_string(),
            from: current,
            action,
        })
    }
}

/// Item status implied by the rentals of an item.
///
/// `current` is the status stored on the item before recomputing; it only
/// matters when nothing occupies the item, to keep an owner's
/// `unavailable` listing in place.
pub const fn settle_item_status(current: ItemStatus, any_occupying: bool) -> ItemStatus {
    if any_occupying {
        ItemStatus::Rented
    } else {
        match current {
            ItemStatus::Unavailable => ItemStatus::Unavailable,
            ItemStatus::Available | ItemStatus::Rented => ItemStatus::Available,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_happy_path() {
        let mut status = RentalStatus::Confirmed;
        for action in [RentalAction::ConfirmPickup, RentalAction::ConfirmReturn] {
            status = plan("r", status, action).unwrap().resulting_status();
        }
        assert_eq!(status, RentalStatus::Completed);
    }

    #[test]
    fn test_transition_table() {
        use RentalAction::*;
        use RentalStatus::*;

        let cases = [
            (ConfirmPickup, Pending, None),
            (ConfirmPickup, Confirmed, Some(Active)),
            (ConfirmPickup, Active, Some(Active)),
            (ConfirmPickup, Completed, None),
            (ConfirmPickup, Cancelled, None),
            (ConfirmReturn, Pending, None),
            (ConfirmReturn, Confirmed, Some(Completed)),
            (ConfirmReturn, Active, Some(Completed)),
            (ConfirmReturn, Completed, Some(Completed)),
            (ConfirmReturn, Cancelled, None),
            (Complete, Confirmed, Some(Completed)),
            (Complete, Cancelled, None),
            (Cancel, Pending, Some(Cancelled)),
            (Cancel, Confirmed, Some(Cancelled)),
            (Cancel, Active, None),
            (Cancel, Completed, None),
            (Cancel, Cancelled, Some(Cancelled)),
        ];

        for (action, from, expected) in cases {
            let result = plan("r", from, action).ok().map(|t| t.resulting_status());
            assert_eq!(result, expected, "{action} from {from}");
        }
    }

    #[test]
    fn test_terminal_rentals_never_occupy_again() {
        for from in [RentalStatus::Completed, RentalStatus::Cancelled] {
            for action in RentalAction::ALL {
                if let Ok(t) = plan("r", from, action) {
                    assert_eq!(t, Transition::Unchanged(from));
                }
            }
        }
    }

    #[test]
    fn test_only_cancel_is_renter_only() {
        let renter_only: Vec<_> = RentalAction::ALL
            .into_iter()
            .filter(|a| a.renter_only())
            .collect();
        assert_eq!(renter_only, vec![RentalAction::Cancel]);
    }

    #[test]
    fn test_settle_item_status() {
        assert_eq!(settle_item_status(ItemStatus::Available, true), ItemStatus::Rented);
        assert_eq!(settle_item_status(ItemStatus::Rented, false), ItemStatus::Available);
        assert_eq!(settle_item_status(ItemStatus::Unavailable, false), ItemStatus::Unavailable);
        assert_eq!(settle_item_status(ItemStatus::Unavailable, true), ItemStatus::Rented);
    }
}
