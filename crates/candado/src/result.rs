//! Result and error types for Candado.

use thiserror::Error;

/// Result type for Candado operations
pub type CandadoResult<T> = Result<T, CandadoError>;

/// Errors that can occur while driving the lock-room scenario
#[derive(Debug, Error)]
pub enum CandadoError {
    /// Required configuration value absent or blank.
    ///
    /// This is a skip condition, not a failure: the scenario cannot run
    /// in this environment and should be reported as skipped.
    #[error("Missing configuration: {name}")]
    ConfigurationMissing {
        /// Name of the missing configuration parameter
        name: String,
    },

    /// A bounded wait expired before its condition was met
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// Description of the awaited condition
        what: String,
        /// Timeout budget in milliseconds
        ms: u64,
    },

    /// An observed state differed from the expected one
    #[error("Assertion failed in step '{step}': expected {expected}, got {actual}")]
    AssertionFailed {
        /// Scenario step that performed the check
        step: String,
        /// Expected condition
        expected: String,
        /// Observed condition
        actual: String,
    },

    /// A step method was invoked out of order
    #[error("Step '{step}' is not reachable from scenario state {from}")]
    InvalidTransition {
        /// Current scenario state
        from: String,
        /// Step that was attempted
        step: String,
    },

    /// A second password was set within one lock period
    #[error("Room password is already set for this lock period")]
    PasswordAlreadySet,

    /// A step needed the room password before any lock action produced one
    #[error("No room password is held for the current lock period")]
    PasswordMissing,

    /// An entry attempt did not supply exactly one character per input box
    #[error("Password prompt renders {expected} input boxes but the password has {actual} digits")]
    PasswordLengthMismatch {
        /// Number of rendered input boxes
        expected: usize,
        /// Number of digits supplied
        actual: usize,
    },

    /// A selector matched no element
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector that failed to resolve
        selector: String,
    },

    /// Driver/backend failure (navigation, element interaction, transport)
    #[error("Session error: {message}")]
    SessionError {
        /// Error message
        message: String,
    },
}

impl CandadoError {
    /// Create a timeout error
    #[must_use]
    pub fn timeout(what: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            ms,
        }
    }

    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::SessionError {
            message: message.into(),
        }
    }

    /// Whether this error marks the scenario as skipped rather than failed
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::ConfigurationMissing { .. })
    }
}
