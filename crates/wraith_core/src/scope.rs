//! Cancellation scopes
//!
//! A [`CancellationSlot`] holds the scope of the *current* in-flight sequence
//! for one subject (an actor, a loop, a trap countdown). Opening a new scope
//! cancels the previous one before the caller gets to mutate anything, so at
//! most one sequence owns the subject at a time.
//!
//! Each scope carries a generation. A cancelled sequence compares its ticket
//! against the slot before running cleanup: if a newer scope has been opened
//! the subject already belongs to someone else and cleanup is skipped.

use tokio_util::sync::CancellationToken;

/// Handle to one opened scope
#[derive(Debug, Clone)]
pub struct ScopeTicket {
    token: CancellationToken,
    generation: u64,
}

impl ScopeTicket {
    /// Token the sequence races its suspension points against
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Generation this ticket was issued at
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the scope has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// The "current in-flight sequence" slot for one subject
#[derive(Debug, Default)]
pub struct CancellationSlot {
    current: Option<CancellationToken>,
    generation: u64,
    parent: Option<CancellationToken>,
}

impl CancellationSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot whose scopes are all children of `parent`
    ///
    /// Cancelling the parent cancels whatever scope is current.
    pub fn with_parent(parent: CancellationToken) -> Self {
        Self {
            current: None,
            generation: 0,
            parent: Some(parent),
        }
    }

    /// Cancel the current scope and open a new one
    pub fn supersede(&mut self) -> ScopeTicket {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.generation += 1;
        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        self.current = Some(token.clone());
        ScopeTicket {
            token,
            generation: self.generation,
        }
    }

    /// Cancel the current scope without opening a new one
    ///
    /// The cancelled sequence still owns the subject and runs its cleanup.
    pub fn cancel(&mut self) {
        if let Some(current) = &self.current {
            current.cancel();
        }
    }

    /// Cancel the current scope and revoke its ownership of the subject
    ///
    /// The cancelled sequence exits without cleanup; the caller has already
    /// put the subject into its final state.
    pub fn revoke(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.generation += 1;
    }

    /// Whether `ticket` still owns the subject
    pub fn is_current(&self, ticket: &ScopeTicket) -> bool {
        self.generation == ticket.generation
    }

    /// Whether a scope is open and not cancelled
    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supersede_cancels_previous() {
        let mut slot = CancellationSlot::new();
        let first = slot.supersede();
        let second = slot.supersede();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!slot.is_current(&first));
        assert!(slot.is_current(&second));
    }

    #[test]
    fn test_cancel_keeps_ownership() {
        let mut slot = CancellationSlot::new();
        let ticket = slot.supersede();
        slot.cancel();

        assert!(ticket.is_cancelled());
        assert!(slot.is_current(&ticket));
        assert!(!slot.is_active());
    }

    #[test]
    fn test_revoke_drops_ownership() {
        let mut slot = CancellationSlot::new();
        let ticket = slot.supersede();
        slot.revoke();

        assert!(ticket.is_cancelled());
        assert!(!slot.is_current(&ticket));
    }

    #[test]
    fn test_parent_cancels_current_scope() {
        let parent = CancellationToken::new();
        let mut slot = CancellationSlot::with_parent(parent.clone());
        let ticket = slot.supersede();

        parent.cancel();
        assert!(ticket.is_cancelled());

        // Scopes opened after the parent died start cancelled.
        assert!(slot.supersede().is_cancelled());
    }
}
