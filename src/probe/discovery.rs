//! Element discovery: which elements on the page get probed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::page::{Page, PageError, PageResult};

/// Attribute that excludes an element (e.g. the exerciser's own controls)
pub const OPT_OUT_ATTRIBUTE: &str = "data-test-ignore";

/// A named selector whose matches are discovery candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorGroup {
    pub name: String,
    pub selector: String,
}

impl SelectorGroup {
    pub fn new(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
        }
    }

    /// Build a group from alternatives, each excluding opted-out elements
    pub fn opt_out(name: &str, alternatives: &[&str]) -> Self {
        let selector = alternatives
            .iter()
            .map(|s| format!("{}:not([{}])", s, OPT_OUT_ATTRIBUTE))
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(name, &selector)
    }
}

/// Every selector the exerciser uses against the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// Candidate groups, queried in order
    pub candidates: Vec<SelectorGroup>,
    /// Error/alert convention; a count increase is a regression
    pub error_surface: String,
    /// Dialog/toast/modal convention
    pub overlay: String,
    /// Ancestors that name a location
    pub landmark: String,
    /// Ancestors that make an element navigation
    pub navigation: String,
    /// Controls whose values make up the form snapshot
    pub form_fields: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            candidates: vec![
                SelectorGroup::opt_out("buttons", &["button"]),
                SelectorGroup::opt_out("aria-buttons", &["[role=\"button\"]"]),
                SelectorGroup::opt_out("button-links", &["a[class*=\"button\"]", "a[class*=\"btn\"]"]),
                SelectorGroup::opt_out("handlers", &["[onclick]", "[data-testid*=\"button\"]"]),
            ],
            error_surface: ".error, [role=\"alert\"]".to_string(),
            overlay: "[role=\"dialog\"], .toast, .modal, [data-state=\"open\"]".to_string(),
            landmark: "[data-component], [class*=\"Page\"], [class*=\"Component\"], section, main, nav, header, footer"
                .to_string(),
            navigation: "nav".to_string(),
            form_fields: "input, select, textarea".to_string(),
        }
    }
}

/// Enumerate visible, enabled candidates.
///
/// Groups are queried in order and concatenated; an element matched by more
/// than one group keeps its first position and is returned once.
pub async fn discover<P>(page: &P, selectors: &Selectors) -> PageResult<Vec<P::Handle>>
where
    P: Page + ?Sized,
{
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for group in &selectors.candidates {
        let found = page.query_all(&group.selector).await?;
        debug!(group = %group.name, matched = found.len(), "selector group queried");
        for handle in found {
            if seen.insert(handle.clone()) {
                candidates.push(handle);
            }
        }
    }

    let mut usable = Vec::with_capacity(candidates.len());
    for handle in candidates {
        let info = match page.inspect(&handle).await {
            Ok(info) => info,
            Err(PageError::Detached(_)) => continue,
            Err(err) => return Err(err),
        };
        if info.is_rendered() && !info.is_disabled() {
            usable.push(handle);
        }
    }

    debug!(usable = usable.len(), "discovery finished");
    Ok(usable)
}
