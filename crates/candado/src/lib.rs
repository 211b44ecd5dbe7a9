//! Candado: conformance scenario for password-locked meeting rooms.
//!
//! Candado (Spanish: "padlock") drives the lock-room flow of a web
//! conferencing client end to end and asserts the observable behavior at
//! every transition: lock, challenge, wrong password, right password,
//! unlock. The room itself is a black box reached through a session driver.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      CANDADO Architecture                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌─────────────────┐    ┌────────────────┐  │
//! │  │ LockRoom     │    │ Page objects    │    │ SessionDriver  │  │
//! │  │ Scenario     │───►│ PasswordControl │───►│  MockMeeting   │  │
//! │  │ (state       │    │ PasswordPrompt  │    │  or Chromium   │  │
//! │  │  machine)    │    │ Participant     │    │  (CDP)         │  │
//! │  └──────────────┘    └─────────────────┘    └────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scenario is a fixed, strictly sequential step chain; every
//! synchronization point is a bounded polling wait. A missing moderator
//! token skips the run instead of failing it.

#![warn(missing_docs)]

/// Scenario configuration: URL, token, selectors, budgets
pub mod config;

/// Password UI page objects and the room lock state
pub mod dialog;

/// Hermetic in-process meeting used for conformance tests without a browser
pub mod mock;

/// Participant sessions and roles
pub mod participant;

/// Room password generation and handling
pub mod password;

/// Per-step outcomes and the scenario report
pub mod report;

/// Result and error types
pub mod result;

/// The lock-room scenario runner and its state machine
pub mod scenario;

/// Session driver seam
pub mod session;

/// Bounded waits
pub mod wait;

/// Real browser control over the Chrome DevTools Protocol
#[cfg(feature = "browser")]
pub mod chromium;

pub use config::{
    MeetingUrl, RoomSelectors, ScenarioConfig, DEFAULT_MEETING_URL, MEETING_URL_ENV,
    MODERATOR_TOKEN_ENV,
};
pub use dialog::{indicator_state, LockState, PasswordControl, PasswordPrompt};
pub use mock::{MockMeeting, MockSession, MockSessionFactory};
pub use participant::{Participant, Role};
pub use password::{DigitGenerator, RoomPassword, Seed};
pub use report::{ScenarioReport, ScenarioVerdict, StepOutcome, StepStatus};
pub use result::{CandadoError, CandadoResult};
pub use scenario::{LockRoomScenario, ScenarioContext, ScenarioState};
pub use session::{ElementHandle, SessionDriver, SessionFactory};
pub use wait::{
    settle, wait_until, WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_STEP_TIMEOUT_MS,
    SETTLE_DELAY_MS,
};

#[cfg(feature = "browser")]
pub use chromium::{ChromiumConfig, ChromiumFactory, ChromiumSession};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::*;
    pub use super::dialog::*;
    pub use super::mock::*;
    pub use super::participant::*;
    pub use super::password::*;
    pub use super::report::*;
    pub use super::result::*;
    pub use super::scenario::*;
    pub use super::session::*;
    pub use super::wait::*;

    #[cfg(feature = "browser")]
    pub use super::chromium::*;
}
