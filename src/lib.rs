//! UI Exerciser - automated activation testing of interactive page elements.
//!
//! This crate provides:
//! - A [`Page`] abstraction with a WebDriver backend and an in-memory mock
//! - Discovery of visible, enabled interactive elements
//! - A prober that activates one element and classifies the observable effect
//! - A sequential, cancellable run loop with a live progress snapshot
//! - CSV and JSON report export
//! - Session management for report artifacts
//!
//! # Example
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use ui_exerciser::{Exerciser, ExerciserConfig, WebDriverPage, config};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let page = WebDriverPage::connect(&config::get().webdriver).await?;
//! page.goto("http://localhost:5173/").await?;
//!
//! let exerciser = Exerciser::new(ExerciserConfig::from_env());
//! let report = exerciser.run(&page, &CancellationToken::new()).await?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod demo;
pub mod harness;
pub mod page;
pub mod probe;
pub mod report;
pub mod session;

// Re-export run types
pub use harness::{Exerciser, ExerciserConfig, RunError, RunReport, RunResult, RunSnapshot};

// Re-export page backends
pub use page::{ElementInfo, MockDocument, MockElement, MockPage, NodeId, Page, PageError, PageResult, WebDriverPage};

// Re-export probing
pub use probe::{ActionCategory, ProbeOutcome, ProbeStatus, Selectors, Summary, discover, probe};

// Re-export reporting
pub use report::{Artifact, ReportError, ReportFormat, export, to_csv, to_json, write_artifact};

// Re-export session management
pub use session::{Session, cleanup_old_sessions, list_sessions};
