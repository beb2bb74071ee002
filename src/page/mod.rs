pub mod backend;
pub mod mock;
pub mod selector;
pub mod types;
pub mod webdriver;

pub use backend::Page;
pub use mock::{ActivationHandler, MockDocument, MockElement, MockPage, NodeId};
pub use selector::SelectorList;
pub use types::{ComputedStyle, ElementInfo, PageError, PageResult, Rect};
pub use webdriver::{WebDriverPage, WebElementHandle};
