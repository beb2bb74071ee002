//! Discovery, description and probing of interactive elements.

pub mod describe;
pub mod discovery;
pub mod prober;
pub mod types;

pub use describe::{
    ActionCategory, CATEGORY_RULES, CategoryRule, Cue, action_category, categorize, element_label,
    element_location, landmark_name,
};
pub use discovery::{OPT_OUT_ATTRIBUTE, SelectorGroup, Selectors, discover};
pub use prober::{Evidence, probe};
pub use types::{ElementSummary, ProbeOutcome, ProbeStatus, Summary};
