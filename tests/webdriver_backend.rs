//! WebDriverPage against a scripted WebDriver endpoint.

use mockito::{Matcher, Mock, Server, ServerGuard};
use pretty_assertions::assert_eq;
use serde_json::json;

use ui_exerciser::config::WebDriverSettings;
use ui_exerciser::probe::{Selectors, discover};
use ui_exerciser::{Page, PageError, WebDriverPage};

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const EXECUTE: &str = "/session/s1/execute/sync";

struct Driver {
    server: ServerGuard,
    _session: Vec<Mock>,
}

impl Driver {
    async fn start() -> Self {
        let mut server = Server::new_async().await;
        let created = server
            .mock("POST", "/session")
            .with_header("content-type", "application/json")
            .with_body(json!({ "value": { "sessionId": "s1", "capabilities": {} } }).to_string())
            .create_async()
            .await;
        let deleted = server
            .mock("DELETE", "/session/s1")
            .with_header("content-type", "application/json")
            .with_body(json!({ "value": null }).to_string())
            .create_async()
            .await;
        Self {
            server,
            _session: vec![created, deleted],
        }
    }

    async fn page(&self) -> WebDriverPage {
        let settings = WebDriverSettings {
            url: self.server.url(),
            browser: "firefox".to_string(),
            headless: true,
        };
        WebDriverPage::connect(&settings).await.unwrap()
    }

    /// Every element lookup answers with these references
    async fn elements(&mut self, ids: &[&str]) -> Mock {
        let found: Vec<_> = ids.iter().map(|id| json!({ ELEMENT_KEY: id })).collect();
        self.server
            .mock("POST", "/session/s1/elements")
            .with_header("content-type", "application/json")
            .with_body(json!({ "value": found }).to_string())
            .create_async()
            .await
    }

    /// Script calls that pass element `id` answer with `value`
    async fn script_for(&mut self, id: &str, value: serde_json::Value) -> Mock {
        self.server
            .mock("POST", EXECUTE)
            .match_body(Matcher::Regex(format!("\"{}\"", id)))
            .with_header("content-type", "application/json")
            .with_body(json!({ "value": value }).to_string())
            .create_async()
            .await
    }

    /// Script calls that pass element `id` fail with a driver error
    async fn script_error_for(&mut self, id: &str, status: usize, error: &str) -> Mock {
        self.server
            .mock("POST", EXECUTE)
            .match_body(Matcher::Regex(format!("\"{}\"", id)))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(driver_error(error))
            .create_async()
            .await
    }
}

fn driver_error(error: &str) -> String {
    json!({ "value": { "error": error, "message": "node is detached", "stacktrace": "" } }).to_string()
}

fn rendered_button() -> serde_json::Value {
    json!({
        "tag": "button",
        "text": "Comprar",
        "attributes": { "type": "button" },
        "style": { "display": "block", "visibility": "visible", "opacity": "1" },
        "rect": { "x": 10.0, "y": 20.0, "width": 80.0, "height": 24.0 },
        "value": null
    })
}

#[tokio::test]
async fn session_is_named_after_the_browser() {
    let driver = Driver::start().await;
    let page = driver.page().await;
    assert_eq!(page.source_type(), "webdriver:firefox");
    page.close().await.unwrap();
}

#[tokio::test]
async fn stale_reference_is_detached() {
    let mut driver = Driver::start().await;
    let _lookup = driver.elements(&["el-1"]).await;
    let _stale = driver.script_error_for("el-1", 404, "stale element reference").await;
    let page = driver.page().await;

    let handles = page.query_all("button").await.unwrap();
    assert_eq!(handles.len(), 1);
    let err = page.inspect(&handles[0]).await.unwrap_err();
    assert!(matches!(err, PageError::Detached(_)), "got {:?}", err);

    let err = page.set_inline_style(&handles[0], "").await.unwrap_err();
    assert!(matches!(err, PageError::Detached(_)), "got {:?}", err);
}

#[tokio::test]
async fn missing_element_is_detached() {
    let mut driver = Driver::start().await;
    let _lookup = driver.elements(&["el-1"]).await;
    let _missing = driver.script_error_for("el-1", 404, "no such element").await;
    let page = driver.page().await;

    let handles = page.query_all("button").await.unwrap();
    let err = page.inline_style(&handles[0]).await.unwrap_err();
    assert!(matches!(err, PageError::Detached(_)), "got {:?}", err);
}

#[tokio::test]
async fn other_driver_errors_stay_backend_errors() {
    let mut driver = Driver::start().await;
    let _title = driver
        .server
        .mock("GET", "/session/s1/title")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(driver_error("unknown error"))
        .create_async()
        .await;
    let page = driver.page().await;

    let err = page.title().await.unwrap_err();
    assert!(matches!(err, PageError::Backend(_)), "got {:?}", err);
}

#[tokio::test]
async fn discovery_skips_a_candidate_that_went_stale() {
    let mut driver = Driver::start().await;
    let _lookup = driver.elements(&["el-1", "el-2"]).await;
    let _live = driver.script_for("el-1", rendered_button()).await;
    let _stale = driver.script_error_for("el-2", 404, "stale element reference").await;
    let page = driver.page().await;

    let found = discover(&page, &Selectors::default()).await.unwrap();
    let ids: Vec<&str> = found.iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec!["el-1"]);
}

#[tokio::test]
async fn activation_is_a_script_dispatch_not_an_element_click() {
    let mut driver = Driver::start().await;
    let _lookup = driver.elements(&["el-1"]).await;
    let _clicked = driver.script_for("el-1", json!(null)).await;
    let native_click = driver
        .server
        .mock("POST", "/session/s1/element/el-1/click")
        .expect(0)
        .create_async()
        .await;
    let page = driver.page().await;

    let handles = page.query_all("button").await.unwrap();
    page.activate(&handles[0]).await.unwrap();
    native_click.assert_async().await;
}

#[tokio::test]
async fn handler_exception_is_an_activation_failure() {
    let mut driver = Driver::start().await;
    let _lookup = driver.elements(&["el-1"]).await;
    let _thrown = driver
        .script_for("el-1", json!("TypeError: session is undefined"))
        .await;
    let page = driver.page().await;

    let handles = page.query_all("button").await.unwrap();
    let err = page.activate(&handles[0]).await.unwrap_err();
    match err {
        PageError::Activation(message) => assert_eq!(message, "TypeError: session is undefined"),
        other => panic!("expected an activation failure, got {:?}", other),
    }
}
