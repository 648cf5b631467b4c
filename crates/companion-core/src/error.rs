//! Error types for the companion-core crate.
//!
//! Processing a request or a timer never panics; every failure is a typed
//! [`CompanionError`] and the creature is left exactly as it was before
//! the failing operation.

use companion_types::ActionKind;

/// Errors that can occur while mutating the creature.
#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    /// An arithmetic overflow occurred in a counter.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// An action was routed to a handler that cannot process it.
    #[error("action {kind} cannot be processed here")]
    UnsupportedAction {
        /// The offending action.
        kind: ActionKind,
    },
}

impl CompanionError {
    /// Shorthand for an [`CompanionError::ArithmeticOverflow`].
    pub fn overflow(context: &str) -> Self {
        Self::ArithmeticOverflow {
            context: context.to_owned(),
        }
    }
}
