//! Lifecycle state machines
//!
//! Every status enum with a defined lifecycle implements [`StatusMachine`].
//! Transitions are monotonic: no implementation allows a move back to an
//! earlier state.

use crate::error::{DomainError, DomainResult};

pub trait StatusMachine: Copy + Eq + std::fmt::Display {
    /// Entity name used in transition errors
    const ENTITY: &'static str;

    /// Whether `self -> next` is a defined transition
    fn can_transition_to(self, next: Self) -> bool;

    /// States with no outgoing transition
    fn is_terminal(self) -> bool;

    /// Validate and perform `self -> next`
    fn transition_to(self, next: Self) -> DomainResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::invalid_transition(Self::ENTITY, self, next))
        }
    }
}

/// Allowed only when `next` is exactly one step after `current` in `order`.
pub(crate) fn is_adjacent_forward<S: PartialEq>(order: &[S], current: &S, next: &S) -> bool {
    let from = order.iter().position(|s| s == current);
    let to = order.iter().position(|s| s == next);
    matches!((from, to), (Some(f), Some(t)) if t == f + 1)
}
