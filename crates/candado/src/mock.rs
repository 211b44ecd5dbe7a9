//! Hermetic mock meeting.
//!
//! A shared in-process model of the room-under-test: lock state, current
//! password, and roster. Each participant gets a [`MockSession`] that renders
//! the model as UI elements the way the real client would, so the full
//! scenario runs without a browser. Sessions record a call history for
//! verification.

use crate::config::RoomSelectors;
use crate::dialog::LockState;
use crate::result::{CandadoError, CandadoResult};
use crate::session::{ElementHandle, SessionDriver, SessionFactory};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Shared state of the simulated room
#[derive(Debug)]
struct RoomModel {
    lock: LockState,
    password: Option<String>,
    box_count: usize,
    roster: Vec<String>,
    owner: Option<String>,
}

impl RoomModel {
    fn new(box_count: usize) -> Self {
        Self {
            lock: LockState::Unlocked,
            password: None,
            box_count,
            roster: Vec::new(),
            owner: None,
        }
    }

    fn is_owner(&self, session_id: &str) -> bool {
        self.owner.as_deref() == Some(session_id)
    }

    fn admit(&mut self, session_id: &str) {
        if !self.roster.iter().any(|id| id == session_id) {
            self.roster.push(session_id.to_string());
        }
    }

    fn remove(&mut self, session_id: &str) {
        self.roster.retain(|id| id != session_id);
    }
}

/// The simulated meeting; entry point for creating mock sessions
#[derive(Debug, Clone)]
pub struct MockMeeting {
    room: Arc<Mutex<RoomModel>>,
    selectors: RoomSelectors,
}

impl MockMeeting {
    /// Default number of password input boxes rendered by the dialog
    pub const DEFAULT_PASSWORD_BOXES: usize = 6;

    /// Create a meeting with default selectors and six password boxes
    #[must_use]
    pub fn new() -> Self {
        Self {
            room: Arc::new(Mutex::new(RoomModel::new(Self::DEFAULT_PASSWORD_BOXES))),
            selectors: RoomSelectors::default(),
        }
    }

    /// Override how many password input boxes the dialog renders
    #[must_use]
    pub fn with_password_boxes(self, count: usize) -> Self {
        self.room_mut().box_count = count;
        self
    }

    /// Override the selector set the sessions respond to
    #[must_use]
    pub fn with_selectors(mut self, selectors: RoomSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// A factory producing sessions bound to this meeting
    #[must_use]
    pub fn factory(&self) -> MockSessionFactory {
        MockSessionFactory {
            room: self.room.clone(),
            selectors: self.selectors.clone(),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current lock state of the room
    #[must_use]
    pub fn lock_state(&self) -> LockState {
        self.room_mut().lock
    }

    /// The password currently guarding the room, if any
    #[must_use]
    pub fn password(&self) -> Option<String> {
        self.room_mut().password.clone()
    }

    /// Number of participants currently in the room
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.room_mut().roster.len()
    }

    fn room_mut(&self) -> MutexGuard<'_, RoomModel> {
        self.room.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockMeeting {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory for [`MockSession`] handles, counting how many were created
#[derive(Debug, Clone)]
pub struct MockSessionFactory {
    room: Arc<Mutex<RoomModel>>,
    selectors: RoomSelectors,
    created: Arc<AtomicUsize>,
}

impl MockSessionFactory {
    /// Number of sessions created through this factory
    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl SessionFactory for MockSessionFactory {
    type Driver = MockSession;

    fn create_session(&self, label: &str) -> CandadoResult<MockSession> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession::new(
            label,
            self.room.clone(),
            self.selectors.clone(),
        ))
    }
}

/// What one session currently has on screen
#[derive(Debug, Default)]
struct SessionView {
    url: String,
    in_room: bool,
    prompted: bool,
    dialog_open: bool,
    typed: Vec<Option<char>>,
}

/// One simulated participant session over the shared room model
#[derive(Debug)]
pub struct MockSession {
    id: String,
    label: String,
    room: Arc<Mutex<RoomModel>>,
    selectors: RoomSelectors,
    view: SessionView,
    calls: Vec<String>,
}

impl MockSession {
    fn new(label: &str, room: Arc<Mutex<RoomModel>>, selectors: RoomSelectors) -> Self {
        Self {
            id: format!("{label}-{}", uuid::Uuid::new_v4()),
            label: label.to_string(),
            room,
            selectors,
            view: SessionView::default(),
            calls: Vec::new(),
        }
    }

    /// Session label given at creation
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Recorded driver calls, oldest first
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.calls
    }

    /// Whether a call with the given prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls.iter().any(|call| call.starts_with(prefix))
    }

    /// Whether this session is inside the conference
    #[must_use]
    pub fn is_in_room(&self) -> bool {
        self.view.in_room
    }

    fn model(&self) -> MutexGuard<'_, RoomModel> {
        self.room.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn confirm(&mut self) -> CandadoResult<()> {
        let mut model = self.room.lock().unwrap_or_else(PoisonError::into_inner);
        let entered: Option<String> =
            if self.view.typed.len() == model.box_count && self.view.typed.iter().all(Option::is_some) {
                Some(self.view.typed.iter().flatten().collect())
            } else {
                None
            };

        if self.view.dialog_open {
            // Owner path: a complete entry sets the password and locks the
            // room; an incomplete one leaves the dialog open.
            if let Some(password) = entered {
                model.password = Some(password);
                model.lock = LockState::Locked;
                self.view.dialog_open = false;
            }
            Ok(())
        } else if self.view.prompted {
            let admitted = matches!(
                (&entered, &model.password),
                (Some(entry), Some(password)) if entry == password
            );
            if admitted {
                self.view.prompted = false;
                self.view.in_room = true;
                self.view.typed.clear();
                model.admit(&self.id);
            } else {
                // Wrong or incomplete entry: the prompt is redisplayed empty
                self.view.typed = vec![None; model.box_count];
            }
            Ok(())
        } else {
            Err(CandadoError::ElementNotFound {
                selector: self.selectors.confirm_button.clone(),
            })
        }
    }
}

impl SessionDriver for MockSession {
    fn navigate(&mut self, url: &str) -> CandadoResult<()> {
        self.calls.push(format!("navigate:{url}"));
        self.view.url = url.to_string();
        self.view.dialog_open = false;
        self.view.typed.clear();

        let mut model = self.room.lock().unwrap_or_else(PoisonError::into_inner);
        let moderator = url.contains("jwt=");
        if moderator {
            self.view.in_room = true;
            self.view.prompted = false;
            if model.owner.is_none() {
                model.owner = Some(self.id.clone());
            }
            model.admit(&self.id);
        } else if model.lock.is_locked() {
            self.view.in_room = false;
            self.view.prompted = true;
            self.view.typed = vec![None; model.box_count];
        } else {
            self.view.in_room = true;
            self.view.prompted = false;
            model.admit(&self.id);
        }
        Ok(())
    }

    fn find_all(&self, selector: &str) -> CandadoResult<Vec<ElementHandle>> {
        let model = self.model();
        let s = &self.selectors;
        let handles = if selector == s.prompt_heading {
            if self.view.prompted {
                vec![ElementHandle::new("prompt-heading", "h3")
                    .with_text("Please enter the meeting password to join.")]
            } else {
                Vec::new()
            }
        } else if selector == s.password_inputs {
            if self.view.dialog_open || self.view.prompted {
                (0..model.box_count)
                    .map(|i| ElementHandle::new(format!("password-box-{i}"), "input"))
                    .collect()
            } else {
                Vec::new()
            }
        } else if selector == s.password_toggle {
            if self.view.in_room && model.is_owner(&self.id) {
                vec![ElementHandle::new("password-toggle", "div")]
            } else {
                Vec::new()
            }
        } else if selector == s.confirm_button {
            if self.view.dialog_open || self.view.prompted {
                vec![ElementHandle::new("dialog-ok", "button")]
            } else {
                Vec::new()
            }
        } else if selector == s.clear_button {
            if self.view.dialog_open {
                vec![ElementHandle::new("dialog-remove", "button")]
            } else {
                Vec::new()
            }
        } else if selector == s.lock_indicator {
            if self.view.in_room {
                vec![ElementHandle::new("lock-indicator", "div")]
            } else {
                Vec::new()
            }
        } else if selector == s.conference_root {
            if self.view.in_room {
                vec![ElementHandle::new("conference-view", "div")]
            } else {
                Vec::new()
            }
        } else if selector == s.hangup_button {
            if self.view.in_room {
                vec![ElementHandle::new("hangup", "button")]
            } else {
                Vec::new()
            }
        } else {
            Vec::new()
        };
        Ok(handles)
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> CandadoResult<ElementHandle> {
        // State only changes through this session's own actions, so the
        // bounded wait resolves on the first poll.
        self.find_all(selector)?
            .into_iter()
            .find(ElementHandle::is_visible)
            .ok_or_else(|| CandadoError::timeout(selector, timeout.as_millis() as u64))
    }

    fn click(&mut self, selector: &str) -> CandadoResult<()> {
        self.calls.push(format!("click:{selector}"));

        if selector == self.selectors.password_toggle {
            let model = self.room.lock().unwrap_or_else(PoisonError::into_inner);
            if self.view.in_room && model.is_owner(&self.id) {
                let box_count = model.box_count;
                drop(model);
                self.view.dialog_open = true;
                self.view.typed = vec![None; box_count];
                Ok(())
            } else {
                Err(CandadoError::ElementNotFound {
                    selector: selector.to_string(),
                })
            }
        } else if selector == self.selectors.confirm_button {
            self.confirm()
        } else if selector == self.selectors.clear_button {
            let mut model = self.room.lock().unwrap_or_else(PoisonError::into_inner);
            if self.view.dialog_open && model.is_owner(&self.id) {
                model.password = None;
                model.lock = LockState::Unlocked;
                drop(model);
                self.view.dialog_open = false;
                self.view.typed.clear();
                Ok(())
            } else {
                Err(CandadoError::ElementNotFound {
                    selector: selector.to_string(),
                })
            }
        } else if selector == self.selectors.hangup_button {
            let mut model = self.room.lock().unwrap_or_else(PoisonError::into_inner);
            if self.view.in_room {
                model.remove(&self.id);
                drop(model);
                self.view.in_room = false;
                self.view.prompted = false;
                self.view.dialog_open = false;
                self.view.typed.clear();
                Ok(())
            } else {
                Err(CandadoError::ElementNotFound {
                    selector: selector.to_string(),
                })
            }
        } else if self.find_all(selector)?.is_empty() {
            Err(CandadoError::ElementNotFound {
                selector: selector.to_string(),
            })
        } else {
            // Inert element, click is accepted and ignored
            Ok(())
        }
    }

    fn type_into_nth(&mut self, selector: &str, index: usize, text: &str) -> CandadoResult<()> {
        self.calls.push(format!("type:{selector}[{index}]"));

        if selector != self.selectors.password_inputs
            || !(self.view.dialog_open || self.view.prompted)
        {
            return Err(CandadoError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        if index >= self.view.typed.len() {
            return Err(CandadoError::session(format!(
                "password box index {index} out of range for {} boxes",
                self.view.typed.len()
            )));
        }
        self.view.typed[index] = text.chars().last();
        Ok(())
    }

    fn attribute(&self, selector: &str, name: &str) -> CandadoResult<Option<String>> {
        if selector == self.selectors.lock_indicator
            && name == self.selectors.lock_attribute
            && self.view.in_room
        {
            let model = self.model();
            let value = if model.lock.is_locked() {
                self.selectors.locked_value.clone()
            } else {
                self.selectors.unlocked_value.clone()
            };
            return Ok(Some(value));
        }
        Ok(None)
    }

    fn current_url(&self) -> String {
        self.view.url.clone()
    }

    fn close(&mut self) -> CandadoResult<()> {
        self.calls.push("close".to_string());
        if self.view.in_room {
            let mut model = self.room.lock().unwrap_or_else(PoisonError::into_inner);
            model.remove(&self.id);
        }
        self.view = SessionView::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_session(meeting: &MockMeeting) -> MockSession {
        let factory = meeting.factory();
        let mut session = factory.create_session("participant1").unwrap();
        session
            .navigate("https://meet.example.test/room?jwt=tok")
            .unwrap();
        session
    }

    fn lock_via(session: &mut MockSession, selectors: &RoomSelectors) -> String {
        session.click(&selectors.password_toggle).unwrap();
        let boxes = session.find_all(&selectors.password_inputs).unwrap();
        let mut digits = String::new();
        for (i, _) in boxes.iter().enumerate() {
            let digit = char::from(b'0' + (i % 10) as u8);
            session
                .type_into_nth(&selectors.password_inputs, i, &digit.to_string())
                .unwrap();
            digits.push(digit);
        }
        session.click(&selectors.confirm_button).unwrap();
        digits
    }

    mod join_tests {
        use super::*;

        #[test]
        fn test_moderator_join_enters_room_and_takes_ownership() {
            let meeting = MockMeeting::new();
            let session = owner_session(&meeting);
            assert!(session.is_in_room());
            assert_eq!(meeting.participant_count(), 1);
        }

        #[test]
        fn test_guest_join_unlocked_room_is_direct() {
            let meeting = MockMeeting::new();
            let _owner = owner_session(&meeting);
            let mut guest = meeting.factory().create_session("participant2").unwrap();
            guest.navigate("https://meet.example.test/room").unwrap();
            assert!(guest.is_in_room());
            assert_eq!(meeting.participant_count(), 2);
        }

        #[test]
        fn test_guest_join_locked_room_is_prompted() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let mut owner = owner_session(&meeting);
            lock_via(&mut owner, &selectors);

            let mut guest = meeting.factory().create_session("participant2").unwrap();
            guest.navigate("https://meet.example.test/room").unwrap();
            assert!(!guest.is_in_room());
            assert_eq!(guest.find_all(&selectors.prompt_heading).unwrap().len(), 1);
        }
    }

    mod lock_tests {
        use super::*;

        #[test]
        fn test_owner_lock_sets_password_and_state() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let mut owner = owner_session(&meeting);
            let digits = lock_via(&mut owner, &selectors);

            assert_eq!(meeting.lock_state(), LockState::Locked);
            assert_eq!(meeting.password().as_deref(), Some(digits.as_str()));
        }

        #[test]
        fn test_password_length_follows_rendered_boxes() {
            let meeting = MockMeeting::new().with_password_boxes(4);
            let selectors = RoomSelectors::default();
            let mut owner = owner_session(&meeting);
            owner.click(&selectors.password_toggle).unwrap();
            assert_eq!(owner.find_all(&selectors.password_inputs).unwrap().len(), 4);
        }

        #[test]
        fn test_guest_cannot_open_password_control() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let _owner = owner_session(&meeting);
            let mut guest = meeting.factory().create_session("participant2").unwrap();
            guest.navigate("https://meet.example.test/room").unwrap();

            let result = guest.click(&selectors.password_toggle);
            assert!(result.is_err());
            assert_eq!(meeting.lock_state(), LockState::Unlocked);
        }

        #[test]
        fn test_incomplete_owner_entry_does_not_lock() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let mut owner = owner_session(&meeting);
            owner.click(&selectors.password_toggle).unwrap();
            owner
                .type_into_nth(&selectors.password_inputs, 0, "5")
                .unwrap();
            owner.click(&selectors.confirm_button).unwrap();
            assert_eq!(meeting.lock_state(), LockState::Unlocked);
            assert!(meeting.password().is_none());
        }

        #[test]
        fn test_lock_indicator_attribute_reflects_state() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let mut owner = owner_session(&meeting);
            assert_eq!(
                owner
                    .attribute(&selectors.lock_indicator, &selectors.lock_attribute)
                    .unwrap()
                    .as_deref(),
                Some("unlocked")
            );
            lock_via(&mut owner, &selectors);
            assert_eq!(
                owner
                    .attribute(&selectors.lock_indicator, &selectors.lock_attribute)
                    .unwrap()
                    .as_deref(),
                Some("locked")
            );
        }
    }

    mod entry_tests {
        use super::*;

        fn prompted_guest(meeting: &MockMeeting) -> (MockSession, String) {
            let selectors = RoomSelectors::default();
            let mut owner = owner_session(meeting);
            let digits = lock_via(&mut owner, &selectors);
            let mut guest = meeting.factory().create_session("participant2").unwrap();
            guest.navigate("https://meet.example.test/room").unwrap();
            (guest, digits)
        }

        #[test]
        fn test_wrong_password_keeps_guest_out_and_redisplays_prompt() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let (mut guest, digits) = prompted_guest(&meeting);

            for (i, ch) in digits.chars().enumerate() {
                let wrong = if ch == '0' { "1" } else { "0" };
                guest
                    .type_into_nth(&selectors.password_inputs, i, wrong)
                    .unwrap();
            }
            guest.click(&selectors.confirm_button).unwrap();

            assert!(!guest.is_in_room());
            assert_eq!(guest.find_all(&selectors.prompt_heading).unwrap().len(), 1);
        }

        #[test]
        fn test_partial_entry_keeps_guest_out() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let (mut guest, digits) = prompted_guest(&meeting);

            // All but the last digit, each one correct
            for (i, ch) in digits.chars().enumerate().take(digits.len() - 1) {
                guest
                    .type_into_nth(&selectors.password_inputs, i, &ch.to_string())
                    .unwrap();
            }
            guest.click(&selectors.confirm_button).unwrap();
            assert!(!guest.is_in_room());
        }

        #[test]
        fn test_correct_password_admits_guest() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let (mut guest, digits) = prompted_guest(&meeting);

            for (i, ch) in digits.chars().enumerate() {
                guest
                    .type_into_nth(&selectors.password_inputs, i, &ch.to_string())
                    .unwrap();
            }
            guest.click(&selectors.confirm_button).unwrap();

            assert!(guest.is_in_room());
            assert_eq!(meeting.participant_count(), 2);
        }
    }

    mod unlock_tests {
        use super::*;

        #[test]
        fn test_owner_clear_unlocks_and_discards_password() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let mut owner = owner_session(&meeting);
            lock_via(&mut owner, &selectors);

            owner.click(&selectors.password_toggle).unwrap();
            owner.click(&selectors.clear_button).unwrap();

            assert_eq!(meeting.lock_state(), LockState::Unlocked);
            assert!(meeting.password().is_none());
        }

        #[test]
        fn test_hangup_leaves_the_room() {
            let meeting = MockMeeting::new();
            let selectors = RoomSelectors::default();
            let mut owner = owner_session(&meeting);
            assert_eq!(meeting.participant_count(), 1);
            owner.click(&selectors.hangup_button).unwrap();
            assert!(!owner.is_in_room());
            assert_eq!(meeting.participant_count(), 0);
        }
    }

    mod history_tests {
        use super::*;

        #[test]
        fn test_factory_counts_sessions() {
            let meeting = MockMeeting::new();
            let factory = meeting.factory();
            assert_eq!(factory.sessions_created(), 0);
            let _a = factory.create_session("participant1").unwrap();
            let _b = factory.create_session("participant2").unwrap();
            assert_eq!(factory.sessions_created(), 2);
        }

        #[test]
        fn test_call_history_records_actions() {
            let meeting = MockMeeting::new();
            let mut session = owner_session(&meeting);
            assert!(session.was_called("navigate:"));
            session.close().unwrap();
            assert!(session.was_called("close"));
        }
    }
}
