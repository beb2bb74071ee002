//! Real-browser page driven through a W3C WebDriver server.
//!
//! Element reads (computed style, geometry, attributes, `closest`) are done
//! with small injected scripts so that one inspection costs one round trip.

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, NewSessionError};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::{debug, info};

use super::backend::Page;
use super::types::{ElementInfo, PageError, PageResult};
use crate::config::WebDriverSettings;

/// Synthetic click. Handler exceptions only reach `window.onerror`, so the
/// first one raised during dispatch is returned instead of being lost.
const ACTIVATE_SCRIPT: &str = r#"
const el = arguments[0];
let thrown = null;
const onError = (event) => {
    if (thrown === null) {
        thrown = event.message || (event.error ? String(event.error) : '');
    }
    event.preventDefault();
};
window.addEventListener('error', onError);
try {
    el.click();
} finally {
    window.removeEventListener('error', onError);
}
return thrown;
"#;

/// Attempts (100ms apart) to wait for `document.readyState == "complete"`
const READY_POLL_ATTEMPTS: usize = 50;

const DESCRIBE_FN: &str = r#"
const describe = (el) => {
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const attributes = {};
    for (const attr of Array.from(el.attributes)) {
        attributes[attr.name] = attr.value;
    }
    const formControl = ['INPUT', 'SELECT', 'TEXTAREA'].includes(el.tagName);
    return {
        tag: el.tagName.toLowerCase(),
        text: el.textContent || '',
        attributes: attributes,
        style: { display: style.display, visibility: style.visibility, opacity: style.opacity },
        rect: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
        value: formControl ? String(el.value) : null,
    };
};
"#;

/// WebDriver element plus its reference, compared by reference
#[derive(Debug, Clone)]
pub struct WebElementHandle {
    id: String,
    element: Element,
}

impl WebElementHandle {
    fn new(element: Element) -> Self {
        Self {
            id: element.element_id().to_string(),
            element,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl PartialEq for WebElementHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WebElementHandle {}

impl Hash for WebElementHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A browser session behind a WebDriver server
pub struct WebDriverPage {
    client: Client,
    source: String,
}

impl WebDriverPage {
    /// Start a new browser session
    pub async fn connect(settings: &WebDriverSettings) -> PageResult<Self> {
        let browser = settings.browser.to_ascii_lowercase();
        let caps = capabilities(&browser, settings.headless)?;

        info!(endpoint = %settings.url, browser = %browser, headless = settings.headless, "connecting to WebDriver");

        let client = ClientBuilder::rustls()
            .map_err(|e| PageError::Backend(format!("could not set up TLS: {}", e)))?
            .capabilities(caps)
            .connect(&settings.url)
            .await?;

        Ok(Self {
            client,
            source: format!("webdriver:{}", browser),
        })
    }

    /// Navigate and wait (bounded) for the document to finish loading
    pub async fn goto(&self, url: &str) -> PageResult<()> {
        info!(url, "navigating");
        self.client.goto(url).await?;

        for _ in 0..READY_POLL_ATTEMPTS {
            match self
                .client
                .execute("return document.readyState === 'complete';", vec![])
                .await
            {
                Ok(ready) if ready.as_bool().unwrap_or(false) => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
        debug!(url, "document never reported complete, continuing");
        Ok(())
    }

    /// End the browser session
    pub async fn close(self) -> PageResult<()> {
        self.client.close().await?;
        Ok(())
    }

    async fn script(&self, body: &str, args: Vec<Value>) -> PageResult<Value> {
        Ok(self.client.execute(body, args).await?)
    }

    fn element_arg(handle: &WebElementHandle) -> PageResult<Value> {
        Ok(serde_json::to_value(&handle.element)?)
    }
}

#[async_trait]
impl Page for WebDriverPage {
    type Handle = WebElementHandle;

    async fn query_all(&self, selector: &str) -> PageResult<Vec<WebElementHandle>> {
        let found = self.client.find_all(Locator::Css(selector)).await?;
        Ok(found.into_iter().map(WebElementHandle::new).collect())
    }

    async fn count(&self, selector: &str) -> PageResult<usize> {
        let value = self
            .script(
                "return document.querySelectorAll(arguments[0]).length;",
                vec![json!(selector)],
            )
            .await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| PageError::Script(format!("expected a count, got {}", value)))
    }

    async fn inspect(&self, element: &WebElementHandle) -> PageResult<ElementInfo> {
        let body = format!(
            "{}\nconst el = arguments[0];\nif (!el || !el.isConnected) return null;\nreturn describe(el);",
            DESCRIBE_FN
        );
        let value = self.script(&body, vec![Self::element_arg(element)?]).await?;
        let info: Option<ElementInfo> = serde_json::from_value(value)?;
        info.ok_or_else(|| PageError::Detached(element.id.clone()))
    }

    async fn closest(&self, element: &WebElementHandle, selector: &str) -> PageResult<Option<ElementInfo>> {
        let body = format!(
            "{}\nconst found = arguments[0].closest(arguments[1]);\nreturn found ? describe(found) : null;",
            DESCRIBE_FN
        );
        let value = self
            .script(&body, vec![Self::element_arg(element)?, json!(selector)])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn title(&self) -> PageResult<String> {
        Ok(self.client.title().await?)
    }

    async fn inline_style(&self, element: &WebElementHandle) -> PageResult<String> {
        let value = self
            .script("return arguments[0].style.cssText;", vec![Self::element_arg(element)?])
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn set_inline_style(&self, element: &WebElementHandle, css: &str) -> PageResult<()> {
        self.script(
            "arguments[0].style.cssText = arguments[1];",
            vec![Self::element_arg(element)?, json!(css)],
        )
        .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &WebElementHandle) -> PageResult<()> {
        self.script(
            "arguments[0].scrollIntoView({ behavior: 'smooth', block: 'center' });",
            vec![Self::element_arg(element)?],
        )
        .await?;
        Ok(())
    }

    async fn activate(&self, element: &WebElementHandle) -> PageResult<()> {
        let thrown = self
            .script(ACTIVATE_SCRIPT, vec![Self::element_arg(element)?])
            .await?;
        match thrown {
            Value::Null => Ok(()),
            Value::String(message) => Err(PageError::Activation(message)),
            other => Err(PageError::Activation(other.to_string())),
        }
    }

    fn source_type(&self) -> &str {
        &self.source
    }
}

/// Session capabilities for the supported browsers
fn capabilities(browser: &str, headless: bool) -> PageResult<serde_json::Map<String, Value>> {
    let mut caps = serde_json::Map::new();
    match browser {
        "firefox" => {
            caps.insert("browserName".to_string(), json!("firefox"));
            let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
        "chrome" | "chromium" => {
            caps.insert("browserName".to_string(), json!("chrome"));
            let mut args = vec!["--no-sandbox"];
            if headless {
                args.extend(["--headless=new", "--disable-gpu", "--disable-dev-shm-usage"]);
            }
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
        other => {
            return Err(PageError::Backend(format!(
                "unsupported browser '{}' (expected firefox or chrome)",
                other
            )));
        }
    }
    Ok(caps)
}

impl From<CmdError> for PageError {
    fn from(err: CmdError) -> Self {
        // the driver rejects a dead reference before any script runs
        if err.is_stale_element_reference() || err.is_no_such_element() {
            PageError::Detached(err.to_string())
        } else {
            PageError::Backend(err.to_string())
        }
    }
}

impl From<NewSessionError> for PageError {
    fn from(err: NewSessionError) -> Self {
        PageError::Backend(format!("could not start a WebDriver session: {}", err))
    }
}
