//! Escalation raised by the panic tier

use crate::Level;
use thiserror::Error;

/// Returned by panic-tier calls after their record has been emitted.
///
/// The caller decides whether to propagate it as an error or to turn it into
/// an unwinding panic with [`Escalation::raise`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{level}: {message}")]
#[must_use = "an escalation should be propagated or raised"]
pub struct Escalation {
    level: Level,
    message: String,
}

impl Escalation {
    /// Create an escalation
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Level of the call that escalated
    pub fn level(&self) -> Level {
        self.level
    }

    /// Message of the escalated record
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Unwind with the record's message as the panic payload
    pub fn raise(self) -> ! {
        panic!("{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn test_raise_carries_message() {
        let escalation = Escalation::new(Level::Panic, "invariant broken");
        assert_eq!(escalation.to_string(), "panic: invariant broken");

        let payload = panic::catch_unwind(|| {
            escalation.raise();
        })
        .unwrap_err();
        assert_eq!(
            payload.downcast_ref::<String>().map(String::as_str),
            Some("invariant broken")
        );
    }
}
