//! Session driver seam.
//!
//! The scenario runner depends only on this capability interface: locate
//! elements by selector, send input, click, and wait until visible. Concrete
//! backends are the hermetic mock meeting and, behind the `browser` feature,
//! a Chrome DevTools Protocol session.

use crate::result::CandadoResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handle to a located DOM element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Identifier of the element within its session
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Element text content
    pub text_content: Option<String>,
    /// Whether the element is currently rendered
    pub visible: bool,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
            visible: true,
        }
    }

    /// Attach text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Check if the element is visible
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Capability interface over one browser session.
///
/// Operations are blocking; the scenario is a single logical thread and each
/// action is followed by a bounded wait before the next one proceeds.
pub trait SessionDriver {
    /// Navigate the session to a URL
    fn navigate(&mut self, url: &str) -> CandadoResult<()>;

    /// All elements currently matching `selector`, in document order
    fn find_all(&self, selector: &str) -> CandadoResult<Vec<ElementHandle>>;

    /// Block until `selector` matches a visible element, bounded by `timeout`
    fn wait_for(&self, selector: &str, timeout: Duration) -> CandadoResult<ElementHandle>;

    /// Click the first element matching `selector`
    fn click(&mut self, selector: &str) -> CandadoResult<()>;

    /// Type `text` into the element at `index` among those matching `selector`
    fn type_into_nth(&mut self, selector: &str, index: usize, text: &str) -> CandadoResult<()>;

    /// Read an attribute of the first element matching `selector`.
    ///
    /// `Ok(None)` means the element is absent or carries no such attribute.
    fn attribute(&self, selector: &str, name: &str) -> CandadoResult<Option<String>>;

    /// URL the session currently points at
    fn current_url(&self) -> String;

    /// Close the session and release its resources
    fn close(&mut self) -> CandadoResult<()>;
}

/// Creates one driver session per participant
pub trait SessionFactory {
    /// Driver type produced by this factory
    type Driver: SessionDriver;

    /// Create a fresh session labeled for diagnostics
    fn create_session(&self, label: &str) -> CandadoResult<Self::Driver>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_handle_creation() {
        let handle = ElementHandle::new("prompt-heading", "h3");
        assert_eq!(handle.id, "prompt-heading");
        assert_eq!(handle.tag_name, "h3");
        assert!(handle.text_content.is_none());
        assert!(handle.is_visible());
    }

    #[test]
    fn test_element_handle_with_text() {
        let handle = ElementHandle::new("prompt-heading", "h3")
            .with_text("Please enter the meeting password to join.");
        assert_eq!(
            handle.text_content.as_deref(),
            Some("Please enter the meeting password to join.")
        );
    }

    #[test]
    fn test_element_handle_serializes() {
        let handle = ElementHandle::new("password-box-0", "input");
        let json = serde_json::to_string(&handle).unwrap();
        assert!(json.contains("password-box-0"));
        let back: ElementHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, handle.id);
    }
}
