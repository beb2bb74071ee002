//! Page backend abstraction.
//!
//! The exerciser never touches a browser directly. Everything it reads or
//! writes goes through [`Page`]:
//! - `MockPage` for tests and the built-in demo (in-memory document)
//! - `WebDriverPage` for a real browser behind a WebDriver server

use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;

use super::types::{ElementInfo, PageResult};

/// Trait for pages under test
///
/// Implementations expose read access to the element tree, computed style,
/// geometry, navigation state and title, plus the three writes the prober
/// needs: inline style, scroll-into-view and a synthetic activation.
#[async_trait]
pub trait Page: Send + Sync {
    /// Transient reference to a live element. Equality is element identity.
    type Handle: Clone + Eq + Hash + Debug + Send + Sync;

    /// All elements matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> PageResult<Vec<Self::Handle>>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &str) -> PageResult<usize>;

    /// Read tag, text, attributes, computed style, geometry and value
    async fn inspect(&self, element: &Self::Handle) -> PageResult<ElementInfo>;

    /// Nearest inclusive ancestor matching `selector`
    async fn closest(&self, element: &Self::Handle, selector: &str) -> PageResult<Option<ElementInfo>>;

    /// Full URL of the current document
    async fn current_url(&self) -> PageResult<String>;

    /// Document title
    async fn title(&self) -> PageResult<String>;

    /// The element's inline `style` attribute text
    async fn inline_style(&self, element: &Self::Handle) -> PageResult<String>;

    /// Replace the element's inline style text
    async fn set_inline_style(&self, element: &Self::Handle, css: &str) -> PageResult<()>;

    /// Scroll so the element sits in the middle of the viewport
    async fn scroll_into_view(&self, element: &Self::Handle) -> PageResult<()>;

    /// Dispatch one synthetic click
    async fn activate(&self, element: &Self::Handle) -> PageResult<()>;

    /// Get the backend identifier (e.g., "mock", "webdriver:firefox")
    fn source_type(&self) -> &str;
}
