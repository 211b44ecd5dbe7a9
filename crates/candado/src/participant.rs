//! Participant sessions.
//!
//! One simulated user over one driver session. The room owner is the only
//! participant authorized to change the lock state; guests can merely join,
//! answer the password prompt, and hang up.

use crate::config::RoomSelectors;
use crate::result::CandadoResult;
use crate::session::{ElementHandle, SessionDriver};
use crate::wait::{self, WaitOptions};

/// Authorization role of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May lock and unlock the room
    Owner,
    /// Regular attendee
    Guest,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

/// One simulated user and their session
#[derive(Debug)]
pub struct Participant<D: SessionDriver> {
    label: String,
    role: Role,
    driver: D,
    selectors: RoomSelectors,
    wait: WaitOptions,
}

impl<D: SessionDriver> Participant<D> {
    /// Wrap a driver session as a participant
    pub fn new(label: impl Into<String>, role: Role, driver: D, selectors: RoomSelectors) -> Self {
        Self {
            label: label.into(),
            role,
            driver,
            selectors,
            wait: WaitOptions::default(),
        }
    }

    /// Override the wait budget for join detection
    #[must_use]
    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Participant label ("participant1", "participant2")
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Authorization role
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Navigate the session to the meeting URL
    pub fn join(&mut self, url: &str) -> CandadoResult<()> {
        tracing::info!(participant = %self.label, role = %self.role, url, "joining meeting");
        self.driver.navigate(url)
    }

    /// Whether the conference view is currently rendered for this session
    #[must_use]
    pub fn is_joined(&self) -> bool {
        self.driver
            .find_all(&self.selectors.conference_root)
            .map(|elements| elements.iter().any(ElementHandle::is_visible))
            .unwrap_or(false)
    }

    /// Block until the conference view appears, bounded by the wait budget
    pub fn wait_until_joined(&self) -> CandadoResult<()> {
        let what = format!("{} to join the conference", self.label);
        let driver = &self.driver;
        let selector = &self.selectors.conference_root;
        wait::wait_until(&what, &self.wait, || {
            driver
                .find_all(selector)
                .map(|elements| elements.iter().any(ElementHandle::is_visible))
                .unwrap_or(false)
        })
        .map(|_| ())
    }

    /// Leave the meeting
    pub fn hang_up(&mut self) -> CandadoResult<()> {
        tracing::info!(participant = %self.label, "hanging up");
        self.driver.click(&self.selectors.hangup_button)
    }

    /// Borrow the underlying driver
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutably borrow the underlying driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Close the underlying session
    pub fn close(&mut self) -> CandadoResult<()> {
        self.driver.close()
    }
}
