//! Password UI page objects.
//!
//! Two sides of the same dialog: `PasswordControl` is what the room owner
//! uses to set or remove the password, `PasswordPrompt` is what a challenged
//! participant sees when joining a locked room. Both are thin compositions
//! over a [`SessionDriver`] and a [`RoomSelectors`] value; neither holds any
//! state of its own.

use crate::config::RoomSelectors;
use crate::password::{DigitGenerator, RoomPassword};
use crate::result::{CandadoError, CandadoResult};
use crate::session::{ElementHandle, SessionDriver};
use crate::wait::{self, WaitOptions};
use serde::{Deserialize, Serialize};

/// Lock state of the room-under-test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    /// Anyone may join
    Unlocked,
    /// Joining requires the room password
    Locked,
}

impl LockState {
    /// Interpret a lock indicator attribute value
    #[must_use]
    pub fn from_indicator(value: &str, selectors: &RoomSelectors) -> Self {
        if value == selectors.locked_value {
            Self::Locked
        } else {
            Self::Unlocked
        }
    }

    /// Whether this state is `Locked`
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlocked => write!(f, "unlocked"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

/// Lock state as currently reported by a session's indicator element.
///
/// `None` means the indicator is not rendered for this session.
pub fn indicator_state<D: SessionDriver>(
    driver: &D,
    selectors: &RoomSelectors,
) -> Option<LockState> {
    driver
        .attribute(&selectors.lock_indicator, &selectors.lock_attribute)
        .ok()
        .flatten()
        .map(|value| LockState::from_indicator(&value, selectors))
}

fn prompt_visible<D: SessionDriver>(driver: &D, selector: &str) -> bool {
    driver
        .find_all(selector)
        .map(|elements| elements.iter().any(ElementHandle::is_visible))
        .unwrap_or(false)
}

// =============================================================================
// OWNER SIDE
// =============================================================================

/// The room owner's password control
pub struct PasswordControl<'a, D: SessionDriver> {
    driver: &'a mut D,
    selectors: &'a RoomSelectors,
    wait: WaitOptions,
}

impl<D: SessionDriver> std::fmt::Debug for PasswordControl<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordControl")
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl<'a, D: SessionDriver> PasswordControl<'a, D> {
    /// Create a control over the owner's session
    pub fn new(driver: &'a mut D, selectors: &'a RoomSelectors) -> Self {
        Self {
            driver,
            selectors,
            wait: WaitOptions::default(),
        }
    }

    /// Override the wait budget
    #[must_use]
    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Open the password dialog
    pub fn open(&mut self) -> CandadoResult<()> {
        self.driver
            .wait_for(&self.selectors.password_toggle, self.wait.timeout())?;
        tracing::debug!(selector = %self.selectors.password_toggle, "opening password control");
        self.driver.click(&self.selectors.password_toggle)
    }

    /// Fill every rendered input box with a random digit and confirm.
    ///
    /// The number of boxes is discovered from the UI here, not fixed in
    /// advance; the returned password has exactly that many digits.
    pub fn set_random_password(
        &mut self,
        digits: &mut DigitGenerator,
    ) -> CandadoResult<RoomPassword> {
        let boxes = self.driver.find_all(&self.selectors.password_inputs)?;
        if boxes.is_empty() {
            return Err(CandadoError::ElementNotFound {
                selector: self.selectors.password_inputs.clone(),
            });
        }
        let password = RoomPassword::generate(boxes.len(), digits);
        for (index, digit) in password.as_str().chars().enumerate() {
            self.driver.type_into_nth(
                &self.selectors.password_inputs,
                index,
                &digit.to_string(),
            )?;
        }
        tracing::debug!(size = password.len(), "password entered, confirming");
        self.driver.click(&self.selectors.confirm_button)?;
        Ok(password)
    }

    /// Issue the remove/clear password action
    pub fn remove_password(&mut self) -> CandadoResult<()> {
        self.driver
            .wait_for(&self.selectors.clear_button, self.wait.timeout())?;
        self.driver.click(&self.selectors.clear_button)
    }

    /// Lock state as reported by the indicator, if rendered
    #[must_use]
    pub fn lock_state(&self) -> Option<LockState> {
        indicator_state(&*self.driver, self.selectors)
    }

    /// Block until the indicator reports `Locked`
    pub fn wait_until_locked(&self) -> CandadoResult<()> {
        let driver = &*self.driver;
        let selectors = self.selectors;
        wait::wait_until("lock indicator to report locked", &self.wait, || {
            indicator_state(driver, selectors) == Some(LockState::Locked)
        })
        .map(|_| ())
    }

    /// Block until the indicator reports `Unlocked`
    pub fn wait_until_unlocked(&self) -> CandadoResult<()> {
        let driver = &*self.driver;
        let selectors = self.selectors;
        wait::wait_until("lock indicator to report unlocked", &self.wait, || {
            indicator_state(driver, selectors) == Some(LockState::Unlocked)
        })
        .map(|_| ())
    }
}

// =============================================================================
// GUEST SIDE
// =============================================================================

/// The password prompt shown to a challenged participant
pub struct PasswordPrompt<'a, D: SessionDriver> {
    driver: &'a mut D,
    selectors: &'a RoomSelectors,
    wait: WaitOptions,
}

impl<D: SessionDriver> std::fmt::Debug for PasswordPrompt<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordPrompt")
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl<'a, D: SessionDriver> PasswordPrompt<'a, D> {
    /// Create a prompt over the challenged participant's session
    pub fn new(driver: &'a mut D, selectors: &'a RoomSelectors) -> Self {
        Self {
            driver,
            selectors,
            wait: WaitOptions::default(),
        }
    }

    /// Override the wait budget
    #[must_use]
    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Whether the prompt heading is currently visible
    #[must_use]
    pub fn is_shown(&self) -> bool {
        prompt_visible(&*self.driver, &self.selectors.prompt_heading)
    }

    /// Block until the prompt heading is visible.
    ///
    /// Returns immediately when the prompt is already on screen.
    pub fn wait_until_shown(&self) -> CandadoResult<()> {
        let driver = &*self.driver;
        let selector = &self.selectors.prompt_heading;
        wait::wait_until("password prompt heading", &self.wait, || {
            prompt_visible(driver, selector)
        })
        .map(|_| ())
    }

    /// Enter `password` digit by digit and confirm.
    ///
    /// Waits for the prompt first, so this can be called back to back for the
    /// wrong and the right attempt. The entry must supply exactly one digit
    /// per rendered box.
    pub fn submit(&mut self, password: &RoomPassword) -> CandadoResult<()> {
        self.wait_until_shown()?;
        let boxes = self.driver.find_all(&self.selectors.password_inputs)?;
        if boxes.len() != password.len() {
            return Err(CandadoError::PasswordLengthMismatch {
                expected: boxes.len(),
                actual: password.len(),
            });
        }
        for (index, digit) in password.as_str().chars().enumerate() {
            self.driver.type_into_nth(
                &self.selectors.password_inputs,
                index,
                &digit.to_string(),
            )?;
        }
        tracing::debug!(size = password.len(), "password submitted");
        self.driver.click(&self.selectors.confirm_button)
    }
}
