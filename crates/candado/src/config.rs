//! Scenario configuration.
//!
//! Everything the runner needs from the outside lives here: the meeting URL,
//! the moderator token, the timeout budgets, and the selector strings for the
//! room's password UI. Selectors are configuration data, not logic; swapping
//! the room-under-test means swapping a `RoomSelectors` value.

use crate::password::Seed;
use crate::result::{CandadoError, CandadoResult};
use crate::wait::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_STEP_TIMEOUT_MS, SETTLE_DELAY_MS};

/// Environment variable holding the moderator auth token
pub const MODERATOR_TOKEN_ENV: &str = "CANDADO_MODERATOR_TOKEN";

/// Environment variable overriding the base meeting URL
pub const MEETING_URL_ENV: &str = "CANDADO_MEETING_URL";

/// Base meeting URL used when none is configured
pub const DEFAULT_MEETING_URL: &str = "https://meet.example.test/conformance";

// =============================================================================
// SELECTORS
// =============================================================================

/// Selector strings for the room's password UI.
///
/// The defaults match the reference conferencing client; point them elsewhere
/// to run the same scenario against a different room implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSelectors {
    /// Toggle that opens the meeting password control (room owner only)
    pub password_toggle: String,
    /// The set of single-digit password input boxes, in entry order
    pub password_inputs: String,
    /// OK/confirm action of the password dialog
    pub confirm_button: String,
    /// Remove/clear-password action of the password dialog
    pub clear_button: String,
    /// Lock-state indicator element
    pub lock_indicator: String,
    /// Attribute of the indicator that carries the lock state
    pub lock_attribute: String,
    /// Attribute value reported while the room is locked
    pub locked_value: String,
    /// Attribute value reported while the room is unlocked
    pub unlocked_value: String,
    /// Heading shown to a participant challenged for the password
    pub prompt_heading: String,
    /// Element present once a participant is inside the conference
    pub conference_root: String,
    /// Hang-up action
    pub hangup_button: String,
}

impl Default for RoomSelectors {
    fn default() -> Self {
        Self {
            password_toggle: "[data-testid='meeting-password-toggle']".to_string(),
            password_inputs: "input[name^='password-digit']".to_string(),
            confirm_button: "[data-testid='password-dialog-ok']".to_string(),
            clear_button: "[data-testid='password-dialog-remove']".to_string(),
            lock_indicator: "[aria-label='Meeting password']".to_string(),
            lock_attribute: "aria-pressed".to_string(),
            locked_value: "locked".to_string(),
            unlocked_value: "unlocked".to_string(),
            prompt_heading: "h3[data-testid='password-prompt-heading']".to_string(),
            conference_root: "[data-testid='conference-view']".to_string(),
            hangup_button: "[data-testid='hangup-button']".to_string(),
        }
    }
}

// =============================================================================
// MEETING URL
// =============================================================================

/// Meeting URL with optional auth parameter construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingUrl {
    base: String,
}

impl MeetingUrl {
    /// Create a meeting URL from a base address
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// The URL without auth parameters (guest join)
    #[must_use]
    pub fn plain(&self) -> String {
        self.base.clone()
    }

    /// The URL with the moderator token appended as a `jwt` query parameter
    #[must_use]
    pub fn authed(&self, token: &str) -> String {
        let separator = if self.base.contains('?') { '&' } else { '?' };
        format!("{}{}jwt={}", self.base, separator, token)
    }
}

impl std::fmt::Display for MeetingUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base)
    }
}

// =============================================================================
// SCENARIO CONFIG
// =============================================================================

/// Configuration for one scenario run
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Base meeting URL of the room-under-test
    pub base_url: String,
    /// Moderator auth token; absence is a documented skip condition
    pub moderator_token: Option<String>,
    /// Selector set for the room's password UI
    pub selectors: RoomSelectors,
    /// Timeout budget for each bounded wait, in milliseconds
    pub step_timeout_ms: u64,
    /// Polling interval for bounded waits, in milliseconds
    pub poll_interval_ms: u64,
    /// Fixed delay before lock and unlock, in milliseconds
    pub settle_delay_ms: u64,
    /// Seed for password digit generation
    pub password_seed: Seed,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MEETING_URL.to_string(),
            moderator_token: None,
            selectors: RoomSelectors::default(),
            step_timeout_ms: DEFAULT_STEP_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_delay_ms: SETTLE_DELAY_MS,
            password_seed: Seed::from_entropy(),
        }
    }
}

impl ScenarioConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the environment.
    ///
    /// `CANDADO_MEETING_URL` overrides the base URL; `CANDADO_MODERATOR_TOKEN`
    /// supplies the token. A missing token is kept as `None` so the caller
    /// can decide between running and skipping.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(MEETING_URL_ENV).unwrap_or_else(|_| DEFAULT_MEETING_URL.to_string());
        let moderator_token = std::env::var(MODERATOR_TOKEN_ENV).ok();
        Self {
            base_url,
            moderator_token,
            ..Self::default()
        }
    }

    /// Set the base meeting URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the moderator token
    #[must_use]
    pub fn with_moderator_token(mut self, token: impl Into<String>) -> Self {
        self.moderator_token = Some(token.into());
        self
    }

    /// Set the selector set
    #[must_use]
    pub fn with_selectors(mut self, selectors: RoomSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Set the per-wait timeout budget
    #[must_use]
    pub const fn with_step_timeout(mut self, ms: u64) -> Self {
        self.step_timeout_ms = ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the settle delay applied before lock and unlock
    #[must_use]
    pub const fn with_settle_delay(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Set the password generation seed
    #[must_use]
    pub const fn with_password_seed(mut self, seed: Seed) -> Self {
        self.password_seed = seed;
        self
    }

    /// The meeting URL of the room-under-test
    #[must_use]
    pub fn meeting_url(&self) -> MeetingUrl {
        MeetingUrl::new(&self.base_url)
    }

    /// The moderator token, or `ConfigurationMissing` when absent or blank.
    ///
    /// Blank here means empty after trimming, matching the skip condition.
    pub fn require_token(&self) -> CandadoResult<&str> {
        match &self.moderator_token {
            Some(token) if !token.trim().is_empty() => Ok(token.as_str()),
            _ => Err(CandadoError::ConfigurationMissing {
                name: MODERATOR_TOKEN_ENV.to_string(),
            }),
        }
    }
}
