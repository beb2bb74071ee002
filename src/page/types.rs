// Core types shared by every page backend

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Computed style values the exerciser cares about, as the browser reports them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
        }
    }
}

/// Bounding client rect
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Everything the exerciser reads from one element in a single round trip.
///
/// Nothing here is cached across probes: each probe inspects the live
/// element again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Lower-case tag name
    pub tag: String,

    /// Raw `textContent` (element and descendants)
    pub text: String,

    /// Attribute name to value
    pub attributes: BTreeMap<String, String>,

    pub style: ComputedStyle,

    pub rect: Rect,

    /// Current value for form controls, `None` for everything else
    pub value: Option<String>,
}

impl ElementInfo {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// The raw `class` attribute, empty when absent
    pub fn class_name(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    /// Disabled through the `disabled` attribute or `aria-disabled="true"`
    pub fn is_disabled(&self) -> bool {
        self.has_attr("disabled") || self.attr("aria-disabled") == Some("true")
    }

    /// Displayed, visible, not fully transparent and laid out with a non-empty box
    pub fn is_rendered(&self) -> bool {
        self.style.display != "none"
            && self.style.visibility != "hidden"
            && !is_zero_opacity(&self.style.opacity)
            && self.rect.has_area()
    }
}

fn is_zero_opacity(opacity: &str) -> bool {
    match opacity.trim().parse::<f64>() {
        Ok(value) => value == 0.0,
        Err(_) => false,
    }
}

/// Result type for page operations
pub type PageResult<T> = Result<T, PageError>;

/// Error types for page operations
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// A selector the backend could not parse or does not support
    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    /// The handle no longer refers to an element in the document
    #[error("element is no longer attached: {0}")]
    Detached(String),

    /// The synthetic activation itself raised
    #[error("activation failed: {0}")]
    Activation(String),

    /// A script ran but returned something unexpected
    #[error("script error: {0}")]
    Script(String),

    /// Transport or driver level failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for PageError {
    fn from(err: serde_json::Error) -> Self {
        PageError::Script(err.to_string())
    }
}
