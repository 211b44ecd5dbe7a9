//! The lock-room scenario runner.
//!
//! Fixed step sequence against the room-under-test:
//!
//! ```text
//! Init -> ParticipantOneJoined -> RoomLocked -> SecondParticipantPrompted
//!      -> WrongPasswordRejected -> CorrectPasswordAdmitted -> RoomUnlocked
//! ```
//!
//! Each arrow is a step method and each step's success is a precondition for
//! the next: a failed step aborts the rest of the run, which the report
//! records as skipped. A missing moderator token skips the whole scenario
//! instead of failing it. State that steps share (the room password and its
//! discovered size) lives in an explicit [`ScenarioContext`], never in
//! ambient fields.

use crate::config::ScenarioConfig;
use crate::dialog::{indicator_state, LockState, PasswordControl, PasswordPrompt};
use crate::participant::{Participant, Role};
use crate::password::{DigitGenerator, RoomPassword};
use crate::report::{ScenarioReport, StepOutcome};
use crate::result::{CandadoError, CandadoResult};
use crate::session::SessionFactory;
use crate::wait::{self, WaitOptions};
use std::time::Instant;

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Milestones of the scenario, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    /// Nothing has run yet
    Init,
    /// participant1 joined with the moderator token
    ParticipantOneJoined,
    /// The lock indicator reported locked
    RoomLocked,
    /// participant2 was challenged for the password
    SecondParticipantPrompted,
    /// A same-length wrong password was rejected
    WrongPasswordRejected,
    /// The generated password admitted participant2
    CorrectPasswordAdmitted,
    /// The room returned to unlocked and a fresh join bypassed the prompt
    RoomUnlocked,
}

impl ScenarioState {
    /// The milestone that legally follows this one
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::ParticipantOneJoined),
            Self::ParticipantOneJoined => Some(Self::RoomLocked),
            Self::RoomLocked => Some(Self::SecondParticipantPrompted),
            Self::SecondParticipantPrompted => Some(Self::WrongPasswordRejected),
            Self::WrongPasswordRejected => Some(Self::CorrectPasswordAdmitted),
            Self::CorrectPasswordAdmitted => Some(Self::RoomUnlocked),
            Self::RoomUnlocked => None,
        }
    }

    /// Stable name for diagnostics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ParticipantOneJoined => "participant-one-joined",
            Self::RoomLocked => "room-locked",
            Self::SecondParticipantPrompted => "second-participant-prompted",
            Self::WrongPasswordRejected => "wrong-password-rejected",
            Self::CorrectPasswordAdmitted => "correct-password-admitted",
            Self::RoomUnlocked => "room-unlocked",
        }
    }
}

impl std::fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// State threaded through the steps of one run.
///
/// The password is write-once per lock period and discarded on unlock; its
/// length is fixed when the lock action discovers the rendered input boxes.
#[derive(Debug)]
pub struct ScenarioContext {
    state: ScenarioState,
    password: Option<RoomPassword>,
    password_size: Option<usize>,
}

impl ScenarioContext {
    /// Fresh context in the `Init` state
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ScenarioState::Init,
            password: None,
            password_size: None,
        }
    }

    /// Current milestone
    #[must_use]
    pub const fn state(&self) -> ScenarioState {
        self.state
    }

    /// Error unless the context is at `expected`; used as a step precondition
    pub fn expect(&self, expected: ScenarioState, step: &str) -> CandadoResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CandadoError::InvalidTransition {
                from: self.state.to_string(),
                step: step.to_string(),
            })
        }
    }

    /// Move to the next milestone; only the immediate successor is legal
    pub fn advance(&mut self, to: ScenarioState) -> CandadoResult<()> {
        if self.state.successor() == Some(to) {
            self.state = to;
            Ok(())
        } else {
            Err(CandadoError::InvalidTransition {
                from: self.state.to_string(),
                step: to.to_string(),
            })
        }
    }

    /// Record the password for the new lock period
    pub fn set_password(&mut self, password: RoomPassword) -> CandadoResult<()> {
        if self.password.is_some() {
            return Err(CandadoError::PasswordAlreadySet);
        }
        self.password_size = Some(password.len());
        self.password = Some(password);
        Ok(())
    }

    /// The password of the current lock period
    pub fn password(&self) -> CandadoResult<&RoomPassword> {
        self.password.as_ref().ok_or(CandadoError::PasswordMissing)
    }

    /// Number of digits discovered at lock time, if a lock happened
    #[must_use]
    pub const fn password_size(&self) -> Option<usize> {
        self.password_size
    }

    /// Discard the password when the lock period ends
    pub fn clear_password(&mut self) {
        self.password = None;
        self.password_size = None;
    }
}

impl Default for ScenarioContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RUNNER
// =============================================================================

type StepFn<F> = fn(&mut LockRoomScenario<F>) -> CandadoResult<()>;

/// Runner for the lock-room conformance scenario
pub struct LockRoomScenario<F: SessionFactory> {
    config: ScenarioConfig,
    factory: F,
    ctx: ScenarioContext,
    digits: DigitGenerator,
    participant1: Option<Participant<F::Driver>>,
    participant2: Option<Participant<F::Driver>>,
}

impl<F: SessionFactory> std::fmt::Debug for LockRoomScenario<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockRoomScenario")
            .field("state", &self.ctx.state())
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl<F: SessionFactory> LockRoomScenario<F> {
    /// Create a runner from its injected dependencies
    #[must_use]
    pub fn new(config: ScenarioConfig, factory: F) -> Self {
        let digits = DigitGenerator::new(config.password_seed);
        Self {
            config,
            factory,
            ctx: ScenarioContext::new(),
            digits,
            participant1: None,
            participant2: None,
        }
    }

    /// The scenario context, for inspection
    #[must_use]
    pub const fn context(&self) -> &ScenarioContext {
        &self.ctx
    }

    /// The configuration this runner was built with
    #[must_use]
    pub const fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.config.step_timeout_ms)
            .with_poll_interval(self.config.poll_interval_ms)
    }

    /// Establish participant1's session with the moderator token.
    ///
    /// A missing or blank token aborts before any session is created, so a
    /// skipped scenario leaves no browser behind.
    pub fn setup(&mut self) -> CandadoResult<()> {
        self.ctx.expect(ScenarioState::Init, "setup")?;
        let token = self.config.require_token()?.to_string();

        let driver = self.factory.create_session("participant1")?;
        let mut participant = Participant::new(
            "participant1",
            Role::Owner,
            driver,
            self.config.selectors.clone(),
        )
        .with_wait(self.wait_options());
        participant.join(&self.config.meeting_url().authed(&token))?;
        participant.wait_until_joined()?;
        self.participant1 = Some(participant);
        self.ctx.advance(ScenarioState::ParticipantOneJoined)
    }

    /// participant1 locks the room with a freshly generated password.
    ///
    /// The password length is whatever number of input boxes the dialog
    /// renders. Within the wait budget the lock indicator must report locked.
    pub fn lock_room(&mut self) -> CandadoResult<()> {
        self.ctx.expect(ScenarioState::ParticipantOneJoined, "lock-room")?;
        wait::settle(self.config.settle_delay_ms);

        let wait_options = self.wait_options();
        let participant = self
            .participant1
            .as_mut()
            .ok_or_else(|| CandadoError::session("participant1 session missing"))?;
        let mut control = PasswordControl::new(participant.driver_mut(), &self.config.selectors)
            .with_wait(wait_options);
        control.open()?;
        let password = control.set_random_password(&mut self.digits)?;
        control.wait_until_locked()?;
        tracing::info!(size = password.len(), "room locked");

        self.ctx.set_password(password)?;
        self.ctx.advance(ScenarioState::RoomLocked)
    }

    /// participant2 joins the locked room: first a same-length wrong
    /// password, which must redisplay the prompt, then the real one, which
    /// must admit them within the wait budget.
    pub fn enter_participant_in_locked_room(&mut self) -> CandadoResult<()> {
        const STEP: &str = "enter-participant-in-locked-room";
        self.ctx.expect(ScenarioState::RoomLocked, STEP)?;
        let wait_options = self.wait_options();

        {
            let participant1 = self
                .participant1
                .as_mut()
                .ok_or_else(|| CandadoError::session("participant1 session missing"))?;
            let control =
                PasswordControl::new(participant1.driver_mut(), &self.config.selectors)
                    .with_wait(wait_options.clone());
            control.wait_until_locked()?;
        }

        let driver = self.factory.create_session("participant2")?;
        let mut participant2 = Participant::new(
            "participant2",
            Role::Guest,
            driver,
            self.config.selectors.clone(),
        )
        .with_wait(wait_options.clone());
        participant2.join(&self.config.meeting_url().plain())?;

        {
            let prompt = PasswordPrompt::new(participant2.driver_mut(), &self.config.selectors)
                .with_wait(wait_options.clone());
            prompt.wait_until_shown()?;
        }
        self.ctx.advance(ScenarioState::SecondParticipantPrompted)?;

        let correct = self.ctx.password()?.clone();
        let wrong = correct.mismatched();
        {
            let mut prompt =
                PasswordPrompt::new(participant2.driver_mut(), &self.config.selectors)
                    .with_wait(wait_options.clone());
            prompt.submit(&wrong)?;
            prompt.wait_until_shown()?;
        }
        if participant2.is_joined() {
            return Err(CandadoError::AssertionFailed {
                step: STEP.to_string(),
                expected: "prompt redisplayed, participant2 not admitted".to_string(),
                actual: "participant2 joined with a wrong password".to_string(),
            });
        }
        tracing::info!("wrong password rejected");
        self.ctx.advance(ScenarioState::WrongPasswordRejected)?;

        {
            let mut prompt =
                PasswordPrompt::new(participant2.driver_mut(), &self.config.selectors)
                    .with_wait(wait_options);
            prompt.submit(&correct)?;
        }
        participant2.wait_until_joined()?;

        let observed = indicator_state(participant2.driver(), &self.config.selectors);
        if observed != Some(LockState::Locked) {
            return Err(CandadoError::AssertionFailed {
                step: STEP.to_string(),
                expected: "lock indicator locked for participant2".to_string(),
                actual: format!("{observed:?}"),
            });
        }
        tracing::info!("correct password admitted participant2");

        self.ctx.advance(ScenarioState::CorrectPasswordAdmitted)?;
        self.participant2 = Some(participant2);
        Ok(())
    }

    /// participant2 hangs up, participant1 clears the password, and the room
    /// must report unlocked; a fresh join then has to bypass the prompt.
    pub fn unlock_room(&mut self) -> CandadoResult<()> {
        const STEP: &str = "unlock-room";
        self.ctx.expect(ScenarioState::CorrectPasswordAdmitted, STEP)?;
        let wait_options = self.wait_options();

        let participant2 = self
            .participant2
            .as_mut()
            .ok_or_else(|| CandadoError::session("participant2 session missing"))?;
        participant2.hang_up()?;
        wait::settle(self.config.settle_delay_ms);

        {
            let participant1 = self
                .participant1
                .as_mut()
                .ok_or_else(|| CandadoError::session("participant1 session missing"))?;
            let mut control =
                PasswordControl::new(participant1.driver_mut(), &self.config.selectors)
                    .with_wait(wait_options.clone());
            control.open()?;
            control.remove_password()?;
            control.wait_until_unlocked()?;
        }
        self.ctx.clear_password();
        tracing::info!("room unlocked");

        participant2.join(&self.config.meeting_url().plain())?;
        {
            let prompt = PasswordPrompt::new(participant2.driver_mut(), &self.config.selectors)
                .with_wait(wait_options);
            if prompt.is_shown() {
                return Err(CandadoError::AssertionFailed {
                    step: STEP.to_string(),
                    expected: "no password prompt after unlock".to_string(),
                    actual: "password prompt shown".to_string(),
                });
            }
        }
        participant2.wait_until_joined()?;

        self.ctx.advance(ScenarioState::RoomUnlocked)
    }

    /// Execute all steps in order and collect the report.
    ///
    /// A skip (missing configuration) marks the remaining steps skipped; a
    /// failure does the same but with the failing step named as the reason.
    /// Sessions are closed best effort afterwards.
    pub fn run(&mut self) -> ScenarioReport {
        let steps: [(&str, StepFn<F>); 4] = [
            ("setup", Self::setup),
            ("lock-room", Self::lock_room),
            (
                "enter-participant-in-locked-room",
                Self::enter_participant_in_locked_room,
            ),
            ("unlock-room", Self::unlock_room),
        ];

        let mut report = ScenarioReport::new("lock-room");
        let mut abort: Option<String> = None;
        for (name, step) in steps {
            if let Some(reason) = &abort {
                report.push(StepOutcome::skipped(name, reason.clone()));
                continue;
            }
            let start = Instant::now();
            match step(&mut *self) {
                Ok(()) => {
                    tracing::info!(step = name, "step passed");
                    report.push(StepOutcome::passed(name, start.elapsed()));
                }
                Err(err) if err.is_skip() => {
                    tracing::warn!(step = name, %err, "scenario skipped");
                    report.push(StepOutcome::skipped(name, err.to_string()));
                    abort = Some(format!("scenario skipped: {err}"));
                }
                Err(err) => {
                    tracing::error!(step = name, %err, "step failed");
                    report.push(StepOutcome::failed(name, err.to_string(), start.elapsed()));
                    abort = Some(format!("dependency failed: {name}"));
                }
            }
        }
        self.close_sessions();
        report
    }

    fn close_sessions(&mut self) {
        for participant in [self.participant1.take(), self.participant2.take()] {
            if let Some(mut participant) = participant {
                if let Err(err) = participant.close() {
                    tracing::debug!(participant = participant.label(), %err, "session close failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMeeting;
    use crate::password::Seed;

    fn test_config() -> ScenarioConfig {
        ScenarioConfig::new()
            .with_moderator_token("conformance-token")
            .with_step_timeout(250)
            .with_poll_interval(5)
            .with_settle_delay(0)
            .with_password_seed(Seed::from_u64(20_240_817))
    }

    mod state_machine_tests {
        use super::*;

        #[test]
        fn test_successor_chain_is_linear() {
            let mut state = ScenarioState::Init;
            let mut seen = vec![state];
            while let Some(next) = state.successor() {
                state = next;
                seen.push(state);
            }
            assert_eq!(seen.len(), 7);
            assert_eq!(state, ScenarioState::RoomUnlocked);
        }

        #[test]
        fn test_advance_rejects_skipping_milestones() {
            let mut ctx = ScenarioContext::new();
            let err = ctx.advance(ScenarioState::RoomLocked).unwrap_err();
            assert!(matches!(err, CandadoError::InvalidTransition { .. }));
            assert_eq!(ctx.state(), ScenarioState::Init);
        }

        #[test]
        fn test_advance_rejects_going_backwards() {
            let mut ctx = ScenarioContext::new();
            ctx.advance(ScenarioState::ParticipantOneJoined).unwrap();
            assert!(ctx.advance(ScenarioState::Init).is_err());
        }
    }

    mod context_tests {
        use super::*;
        use crate::password::{DigitGenerator, RoomPassword};

        #[test]
        fn test_password_is_write_once_per_lock_period() {
            let mut digits = DigitGenerator::new(Seed::from_u64(3));
            let mut ctx = ScenarioContext::new();
            ctx.set_password(RoomPassword::generate(6, &mut digits))
                .unwrap();
            assert_eq!(ctx.password_size(), Some(6));
            let err = ctx
                .set_password(RoomPassword::generate(6, &mut digits))
                .unwrap_err();
            assert!(matches!(err, CandadoError::PasswordAlreadySet));
        }

        #[test]
        fn test_clear_password_allows_next_lock_period() {
            let mut digits = DigitGenerator::new(Seed::from_u64(3));
            let mut ctx = ScenarioContext::new();
            ctx.set_password(RoomPassword::generate(4, &mut digits))
                .unwrap();
            ctx.clear_password();
            assert!(ctx.password().is_err());
            assert!(ctx
                .set_password(RoomPassword::generate(4, &mut digits))
                .is_ok());
        }

        #[test]
        fn test_password_missing_before_lock() {
            let ctx = ScenarioContext::new();
            assert!(matches!(
                ctx.password().unwrap_err(),
                CandadoError::PasswordMissing
            ));
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn test_steps_in_order_reach_room_unlocked() {
            let meeting = MockMeeting::new();
            let mut scenario = LockRoomScenario::new(test_config(), meeting.factory());

            scenario.setup().unwrap();
            assert_eq!(scenario.context().state(), ScenarioState::ParticipantOneJoined);

            scenario.lock_room().unwrap();
            assert_eq!(scenario.context().state(), ScenarioState::RoomLocked);
            assert!(meeting.lock_state().is_locked());
            assert_eq!(scenario.context().password_size(), Some(6));

            scenario.enter_participant_in_locked_room().unwrap();
            assert_eq!(
                scenario.context().state(),
                ScenarioState::CorrectPasswordAdmitted
            );
            assert_eq!(meeting.participant_count(), 2);

            scenario.unlock_room().unwrap();
            assert_eq!(scenario.context().state(), ScenarioState::RoomUnlocked);
            assert!(!meeting.lock_state().is_locked());
            assert!(meeting.password().is_none());
        }

        #[test]
        fn test_step_out_of_order_is_invalid_transition() {
            let meeting = MockMeeting::new();
            let mut scenario = LockRoomScenario::new(test_config(), meeting.factory());
            let err = scenario.lock_room().unwrap_err();
            assert!(matches!(err, CandadoError::InvalidTransition { .. }));
        }

        #[test]
        fn test_setup_without_token_is_skip_and_creates_no_session() {
            let meeting = MockMeeting::new();
            let factory = meeting.factory();
            let config = test_config();
            let config = ScenarioConfig {
                moderator_token: None,
                ..config
            };
            let mut scenario = LockRoomScenario::new(config, factory.clone());

            let err = scenario.setup().unwrap_err();
            assert!(err.is_skip());
            assert_eq!(factory.sessions_created(), 0);
        }

        #[test]
        fn test_password_length_follows_discovered_boxes() {
            let meeting = MockMeeting::new().with_password_boxes(4);
            let mut scenario = LockRoomScenario::new(test_config(), meeting.factory());
            scenario.setup().unwrap();
            scenario.lock_room().unwrap();
            assert_eq!(scenario.context().password_size(), Some(4));
            assert_eq!(meeting.password().map(|p| p.len()), Some(4));
            scenario.enter_participant_in_locked_room().unwrap();
            scenario.unlock_room().unwrap();
        }
    }

    mod run_tests {
        use super::*;
        use crate::report::{ScenarioVerdict, StepStatus};

        #[test]
        fn test_run_happy_path_all_steps_pass() {
            let meeting = MockMeeting::new();
            let mut scenario = LockRoomScenario::new(test_config(), meeting.factory());
            let report = scenario.run();
            assert!(report.all_passed(), "report: {report:?}");
            assert_eq!(report.verdict(), ScenarioVerdict::Passed);
            assert_eq!(report.steps.len(), 4);
        }

        #[test]
        fn test_run_without_token_skips_every_step() {
            let meeting = MockMeeting::new();
            let factory = meeting.factory();
            let config = ScenarioConfig {
                moderator_token: None,
                ..test_config()
            };
            let mut scenario = LockRoomScenario::new(config, factory.clone());
            let report = scenario.run();

            assert_eq!(report.verdict(), ScenarioVerdict::Skipped);
            assert_eq!(report.count(StepStatus::Skipped), 4);
            assert_eq!(factory.sessions_created(), 0);
        }
    }
}
