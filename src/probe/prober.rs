//! The prober: one highlighted synthetic activation per element, followed by
//! a comparison of the page against a baseline taken just before.
//!
//! A probe always produces an outcome. Failures inside the probe (the
//! activation raising, the element vanishing, the backend erroring) are
//! turned into `error` outcomes instead of being returned.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tracing::{debug, warn};

use super::describe::{ActionCategory, action_category, element_label, element_location};
use super::discovery::Selectors;
use super::types::{ElementSummary, ProbeOutcome, ProbeStatus};
use crate::harness::ExerciserConfig;
use crate::page::{Page, PageError, PageResult};

pub const DETAIL_DISABLED: &str = "element disabled";
pub const DETAIL_REGRESSION: &str = "new errors detected";
pub const DETAIL_OVERLAY: &str = "modal or notification shown";
pub const DETAIL_FORM_MODIFIED: &str = "form was modified";
pub const DETAIL_NO_CHANGE: &str = "activation executed, no change detected";
pub const DETAIL_UNKNOWN_ERROR: &str = "unknown error during activation";

/// Label used when the element could not even be read
pub const UNAVAILABLE_LABEL: &str = "<unavailable element>";

/// The signal that decided a probe's classification, in priority order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// More error/alert elements than before
    Regression,
    /// URL differs from the baseline
    Navigated(String),
    /// Title differs from the baseline
    TitleChanged(String),
    /// A dialog, toast or modal is present
    OverlayShown,
    /// A form control now holds a non-empty value it did not hold before
    FormModified,
    NoChange,
}

impl Evidence {
    pub fn status(&self) -> ProbeStatus {
        match self {
            Evidence::Regression => ProbeStatus::Error,
            Evidence::NoChange => ProbeStatus::Warning,
            _ => ProbeStatus::Success,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Evidence::Regression => DETAIL_REGRESSION.to_string(),
            Evidence::Navigated(url) => format!("navigated to {}", url),
            Evidence::TitleChanged(title) => format!("title changed to {}", title),
            Evidence::OverlayShown => DETAIL_OVERLAY.to_string(),
            Evidence::FormModified => DETAIL_FORM_MODIFIED.to_string(),
            Evidence::NoChange => DETAIL_NO_CHANGE.to_string(),
        }
    }
}

/// Observable page state captured before the activation
#[derive(Debug, Clone)]
pub struct Baseline<H> {
    pub url: String,
    pub title: String,
    pub error_surfaces: usize,
    pub form: HashMap<H, String>,
}

/// Label, location and intent, read before anything is touched
struct Described {
    label: String,
    location: String,
    category: ActionCategory,
    summary: ElementSummary,
    disabled: bool,
}

impl Described {
    fn finish(self, status: ProbeStatus, detail: String) -> ProbeOutcome {
        ProbeOutcome {
            label: self.label,
            location: self.location,
            status,
            detail: Some(detail),
            action_category: self.category,
            timestamp: local_timestamp(),
            element: Some(self.summary),
        }
    }
}

/// Probe one element. Never fails: problems become `error` outcomes.
pub async fn probe<P>(page: &P, config: &ExerciserConfig, element: &P::Handle) -> ProbeOutcome
where
    P: Page + ?Sized,
{
    let described = match describe_element(page, &config.selectors, element).await {
        Ok(described) => described,
        Err(err) => {
            warn!(?element, error = %err, "could not read element before probing");
            return unreadable(page, err).await;
        }
    };

    if described.disabled {
        debug!(label = %described.label, "skipping disabled element");
        return described.finish(ProbeStatus::Warning, DETAIL_DISABLED.to_string());
    }

    match exercise(page, config, element).await {
        Ok(evidence) => {
            debug!(label = %described.label, ?evidence, "probe classified");
            described.finish(evidence.status(), evidence.detail())
        }
        Err(err) => {
            debug!(label = %described.label, error = %err, "probe failed");
            described.finish(ProbeStatus::Error, failure_message(&err))
        }
    }
}

async fn describe_element<P>(page: &P, selectors: &Selectors, element: &P::Handle) -> PageResult<Described>
where
    P: Page + ?Sized,
{
    let info = page.inspect(element).await?;
    let landmark = page.closest(element, &selectors.landmark).await?;
    let inside_nav = page.closest(element, &selectors.navigation).await?.is_some();
    let url = page.current_url().await?;

    Ok(Described {
        label: element_label(&info),
        location: element_location(&url, landmark.as_ref()),
        category: action_category(&info, inside_nav),
        summary: ElementSummary::from(&info),
        disabled: info.is_disabled(),
    })
}

async fn unreadable<P>(page: &P, err: PageError) -> ProbeOutcome
where
    P: Page + ?Sized,
{
    let location = match page.current_url().await {
        Ok(url) => element_location(&url, None),
        Err(_) => String::new(),
    };
    ProbeOutcome {
        label: UNAVAILABLE_LABEL.to_string(),
        location,
        status: ProbeStatus::Error,
        detail: Some(err.to_string()),
        action_category: ActionCategory::General,
        timestamp: local_timestamp(),
        element: None,
    }
}

/// Baseline, scroll, highlight, activate, settle, restore, classify
async fn exercise<P>(page: &P, config: &ExerciserConfig, element: &P::Handle) -> PageResult<Evidence>
where
    P: Page + ?Sized,
{
    let timings = &config.timings;
    let baseline = capture_baseline(page, &config.selectors).await?;

    page.scroll_into_view(element).await?;
    settle(timings.scroll_settle()).await;

    let original_style = page.inline_style(element).await?;
    page.set_inline_style(element, &highlighted(&original_style, &config.highlight_style))
        .await?;
    settle(timings.highlight()).await;

    let activation = page.activate(element).await;
    if activation.is_ok() {
        settle(timings.reaction()).await;
    }
    restore_style(page, element, &original_style).await;
    activation?;

    classify(page, config, &baseline).await
}

pub async fn capture_baseline<P>(page: &P, selectors: &Selectors) -> PageResult<Baseline<P::Handle>>
where
    P: Page + ?Sized,
{
    Ok(Baseline {
        url: page.current_url().await?,
        title: page.title().await?,
        error_surfaces: page.count(&selectors.error_surface).await?,
        form: form_snapshot(page, &selectors.form_fields).await?,
    })
}

async fn classify<P>(page: &P, config: &ExerciserConfig, baseline: &Baseline<P::Handle>) -> PageResult<Evidence>
where
    P: Page + ?Sized,
{
    let selectors = &config.selectors;

    if page.count(&selectors.error_surface).await? > baseline.error_surfaces {
        return Ok(Evidence::Regression);
    }

    let url = page.current_url().await?;
    if url != baseline.url {
        return Ok(Evidence::Navigated(url));
    }

    let title = page.title().await?;
    if title != baseline.title {
        return Ok(Evidence::TitleChanged(title));
    }

    settle(config.timings.overlay()).await;
    if page.count(&selectors.overlay).await? > 0 {
        return Ok(Evidence::OverlayShown);
    }

    let form = form_snapshot(page, &selectors.form_fields).await?;
    if form_modified(&baseline.form, &form) {
        return Ok(Evidence::FormModified);
    }

    Ok(Evidence::NoChange)
}

/// Current value of every form control, keyed by element
async fn form_snapshot<P>(page: &P, selector: &str) -> PageResult<HashMap<P::Handle, String>>
where
    P: Page + ?Sized,
{
    let mut values = HashMap::new();
    for handle in page.query_all(selector).await? {
        match page.inspect(&handle).await {
            Ok(info) => {
                values.insert(handle, info.value.unwrap_or_default());
            }
            Err(PageError::Detached(_)) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(values)
}

/// Some control holds a non-empty value that differs from its baseline value
pub fn form_modified<H: Eq + Hash>(before: &HashMap<H, String>, after: &HashMap<H, String>) -> bool {
    after
        .iter()
        .any(|(handle, value)| !value.is_empty() && before.get(handle) != Some(value))
}

/// Original inline style with the highlight appended
pub fn highlighted(original: &str, highlight: &str) -> String {
    let trimmed = original.trim_end();
    if trimmed.is_empty() {
        highlight.to_string()
    } else if trimmed.ends_with(';') {
        format!("{} {}", trimmed, highlight)
    } else {
        format!("{}; {}", trimmed, highlight)
    }
}

async fn restore_style<P>(page: &P, element: &P::Handle, original: &str)
where
    P: Page + ?Sized,
{
    match page.set_inline_style(element, original).await {
        Ok(()) => {}
        // removed by its own activation
        Err(PageError::Detached(_)) => debug!(?element, "element gone, nothing to restore"),
        Err(err) => warn!(?element, error = %err, "could not restore inline style"),
    }
}

fn failure_message(err: &PageError) -> String {
    match err {
        PageError::Activation(msg) if !msg.trim().is_empty() => msg.clone(),
        PageError::Activation(_) => DETAIL_UNKNOWN_ERROR.to_string(),
        other => other.to_string(),
    }
}

async fn settle(window: Duration) {
    if !window.is_zero() {
        tokio::time::sleep(window).await;
    }
}

fn local_timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
