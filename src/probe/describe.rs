//! Side-effect free descriptions of an element: label, location and intent.
//!
//! Intent is decided by an ordered rule table ([`CATEGORY_RULES`]); the
//! first rule with any matching cue wins, and elements matching nothing are
//! [`ActionCategory::General`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::ElementSummary;
use crate::page::ElementInfo;

/// Coarse intent of an interactive element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionCategory {
    Authentication,
    Logout,
    Registration,
    Payment,
    Navigation,
    Initialization,
    Submission,
    Link,
    General,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Authentication => "Authentication",
            ActionCategory::Logout => "Logout",
            ActionCategory::Registration => "Registration",
            ActionCategory::Payment => "Payment",
            ActionCategory::Navigation => "Navigation",
            ActionCategory::Initialization => "Initialization",
            ActionCategory::Submission => "Submission",
            ActionCategory::Link => "Link",
            ActionCategory::General => "General",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observable hint about intent. Text cues are matched lower-cased.
#[derive(Debug, Clone, Copy)]
pub enum Cue {
    /// Substring of `textContent`
    Text(&'static str),
    /// Substring of `aria-label`
    AriaLabel(&'static str),
    /// Exact `type` attribute
    InputType(&'static str),
    /// Substring of the class attribute
    Class(&'static str),
    /// Has a `<nav>` ancestor (or is one)
    InsideNav,
    /// Exact tag name
    Tag(&'static str),
}

#[derive(Debug)]
pub struct CategoryRule {
    pub category: ActionCategory,
    pub cues: &'static [Cue],
}

pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: ActionCategory::Authentication,
        cues: &[Cue::Text("entrar"), Cue::Text("login"), Cue::Text("sign in"), Cue::AriaLabel("login")],
    },
    CategoryRule {
        category: ActionCategory::Logout,
        cues: &[Cue::Text("sair"), Cue::Text("logout"), Cue::Text("sign out"), Cue::AriaLabel("logout")],
    },
    CategoryRule {
        category: ActionCategory::Registration,
        cues: &[Cue::Text("criar"), Cue::Text("cadastrar"), Cue::Text("signup"), Cue::Text("sign up")],
    },
    CategoryRule {
        category: ActionCategory::Payment,
        cues: &[Cue::Text("pagar"), Cue::Text("pagamento"), Cue::Text("payment"), Cue::Text("checkout")],
    },
    CategoryRule {
        category: ActionCategory::Navigation,
        cues: &[Cue::Text("voltar"), Cue::Text("back"), Cue::AriaLabel("back")],
    },
    CategoryRule {
        category: ActionCategory::Initialization,
        cues: &[Cue::Text("começar"), Cue::Text("start"), Cue::Text("iniciar")],
    },
    CategoryRule {
        category: ActionCategory::Submission,
        cues: &[Cue::Text("enviar"), Cue::Text("submit"), Cue::InputType("submit")],
    },
    CategoryRule {
        category: ActionCategory::Navigation,
        cues: &[Cue::Class("nav"), Cue::InsideNav],
    },
    CategoryRule {
        category: ActionCategory::Link,
        cues: &[Cue::Tag("a")],
    },
];

struct CueInput<'a> {
    text: String,
    aria_label: String,
    class: String,
    input_type: Option<&'a str>,
    tag: &'a str,
    inside_nav: bool,
}

impl Cue {
    fn matches(&self, input: &CueInput<'_>) -> bool {
        match self {
            Cue::Text(needle) => input.text.contains(needle),
            Cue::AriaLabel(needle) => input.aria_label.contains(needle),
            Cue::InputType(kind) => input.input_type.is_some_and(|t| t.eq_ignore_ascii_case(kind)),
            Cue::Class(needle) => input.class.contains(needle),
            Cue::InsideNav => input.inside_nav,
            Cue::Tag(tag) => input.tag == *tag,
        }
    }
}

/// Classify intent with [`CATEGORY_RULES`]
pub fn action_category(info: &ElementInfo, inside_nav: bool) -> ActionCategory {
    categorize(CATEGORY_RULES, info, inside_nav)
}

/// Classify intent with an arbitrary rule table
pub fn categorize(rules: &[CategoryRule], info: &ElementInfo, inside_nav: bool) -> ActionCategory {
    let input = CueInput {
        text: info.text.to_lowercase(),
        aria_label: info.attr("aria-label").unwrap_or("").to_lowercase(),
        class: info.class_name().to_lowercase(),
        input_type: info.attr("type"),
        tag: &info.tag,
        inside_nav,
    };
    rules
        .iter()
        .find(|rule| rule.cues.iter().any(|cue| cue.matches(&input)))
        .map(|rule| rule.category)
        .unwrap_or(ActionCategory::General)
}

/// Text content, else aria-label, title, test id, else `tag.firstclass`
pub fn element_label(info: &ElementInfo) -> String {
    let text = info.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !text.is_empty() {
        return text;
    }

    for name in ["aria-label", "title", "data-testid"] {
        if let Some(value) = info.attr(name).map(str::trim).filter(|v| !v.is_empty()) {
            return value.to_string();
        }
    }

    match info.class_name().split_whitespace().next() {
        Some(class) => format!("{}.{}", info.tag, class),
        None => info.tag.clone(),
    }
}

/// Name of a landmark ancestor: its `data-component`, a `*Page`/`*Component`
/// class token, or its tag
pub fn landmark_name(info: &ElementInfo) -> String {
    if let Some(component) = info.attr("data-component").filter(|v| !v.trim().is_empty()) {
        return component.trim().to_string();
    }
    info.class_name()
        .split_whitespace()
        .find(|c| c.contains("Page") || c.contains("Component"))
        .map(str::to_string)
        .unwrap_or_else(|| info.tag.clone())
}

/// `"<path> > <landmark>"`, or just the path when there is no landmark
pub fn element_location(url: &str, landmark: Option<&ElementInfo>) -> String {
    let path = url_path(url);
    match landmark.map(landmark_name) {
        Some(name) if !name.is_empty() => format!("{} > {}", path, name),
        _ => path,
    }
}

fn url_path(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl From<&ElementInfo> for ElementSummary {
    fn from(info: &ElementInfo) -> Self {
        Self {
            tag: info.tag.clone(),
            class_name: info.class_name().to_string(),
            id: info.attr("id").filter(|v| !v.is_empty()).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ComputedStyle, Rect};
    use std::collections::BTreeMap;

    fn el(tag: &str, text: &str, attrs: &[(&str, &str)]) -> ElementInfo {
        ElementInfo {
            tag: tag.to_string(),
            text: text.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            style: ComputedStyle::default(),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            value: None,
        }
    }

    #[test]
    fn label_fallback_chain() {
        assert_eq!(element_label(&el("button", "  Pay \n now ", &[])), "Pay now");
        assert_eq!(element_label(&el("button", " ", &[("aria-label", "Close")])), "Close");
        assert_eq!(element_label(&el("button", "", &[("title", "Help")])), "Help");
        assert_eq!(element_label(&el("div", "", &[("data-testid", "menu-button")])), "menu-button");
        assert_eq!(element_label(&el("a", "", &[("class", "btn btn-lg")])), "a.btn");
        assert_eq!(element_label(&el("button", "", &[])), "button");
    }

    #[test]
    fn location_uses_path_and_landmark() {
        let section = el("section", "", &[("class", "py-8 PricingComponent")]);
        assert_eq!(
            element_location("https://shop.test/checkout?x=1", Some(&section)),
            "/checkout > PricingComponent"
        );

        let marked = el("div", "", &[("data-component", "HeroSection"), ("class", "HomePage")]);
        assert_eq!(element_location("https://shop.test/", Some(&marked)), "/ > HeroSection");

        let footer = el("footer", "", &[]);
        assert_eq!(element_location("https://shop.test/", Some(&footer)), "/ > footer");

        assert_eq!(element_location("https://shop.test/about", None), "/about");
        assert_eq!(element_location("not a url", None), "not a url");
    }

    #[test]
    fn rules_apply_in_order() {
        assert_eq!(action_category(&el("button", "Entrar", &[]), false), ActionCategory::Authentication);
        assert_eq!(action_category(&el("button", "Sair", &[]), false), ActionCategory::Logout);
        assert_eq!(
            action_category(&el("button", "Criar conta e começar", &[]), false),
            ActionCategory::Registration
        );
        assert_eq!(
            action_category(&el("button", "Continuar para Pagamento", &[("type", "submit")]), false),
            ActionCategory::Payment
        );
        assert_eq!(action_category(&el("button", "Voltar", &[]), false), ActionCategory::Navigation);
        assert_eq!(action_category(&el("button", "Start", &[]), false), ActionCategory::Initialization);
        assert_eq!(action_category(&el("button", "OK", &[("type", "submit")]), false), ActionCategory::Submission);
        assert_eq!(action_category(&el("button", "Docs", &[]), true), ActionCategory::Navigation);
        assert_eq!(
            action_category(&el("button", "Menu", &[("class", "Navbar-toggle")]), false),
            ActionCategory::Navigation
        );
        assert_eq!(action_category(&el("a", "Terms", &[]), false), ActionCategory::Link);
        assert_eq!(action_category(&el("button", "Copy", &[]), false), ActionCategory::General);
    }

    #[test]
    fn aria_label_cues() {
        let close = el("button", "", &[("aria-label", "Go back")]);
        assert_eq!(action_category(&close, false), ActionCategory::Navigation);
    }

    #[test]
    fn custom_rule_table() {
        const RULES: &[CategoryRule] = &[CategoryRule {
            category: ActionCategory::Payment,
            cues: &[Cue::Class("stripe")],
        }];
        let button = el("button", "Continue", &[("class", "stripe-cta")]);
        assert_eq!(categorize(RULES, &button, false), ActionCategory::Payment);
        assert_eq!(categorize(RULES, &el("a", "x", &[]), false), ActionCategory::General);
    }
}
