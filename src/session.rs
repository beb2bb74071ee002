//! Session management for report artifacts.
//!
//! Each run that writes reports gets its own directory:
//! - Unique session directories under the configured base dir
//! - Automatic cleanup unless explicitly preserved
//! - Session metadata (target and backend) in `.session.json`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config;
use crate::report::{Artifact, ReportResult, write_artifact};

/// Name of the metadata file written into every session directory
pub const SESSION_METADATA_FILE: &str = ".session.json";

/// A report session with organized file management
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID
    pub id: String,
    /// Root directory for this session
    pub dir: PathBuf,
    /// Whether to keep files after session ends
    pub keep: bool,
    /// URL (or fixture name) that was exercised
    pub target: Option<String>,
    /// Page backend used for the run (`webdriver`, `mock`)
    pub backend: Option<String>,
}

/// Contents of `.session.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: String,
    pub created: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
}

impl Session {
    /// Create a new session with a unique ID under the configured base dir
    pub fn new() -> Self {
        Self::under(config::session_base_dir(), &generate_session_id())
    }

    /// Create a session with a specific name/prefix
    pub fn with_name(name: &str) -> Self {
        let id = format!("{}_{}", sanitize_name(name), generate_timestamp_suffix());
        Self::under(config::session_base_dir(), &id)
    }

    /// Create a named session under an explicit base directory
    pub fn with_name_in(base: impl Into<PathBuf>, name: &str) -> Self {
        let id = format!("{}_{}", sanitize_name(name), generate_timestamp_suffix());
        Self::under(base, &id)
    }

    /// Use a caller-chosen directory; kept by default
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let id = dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(generate_session_id);

        Self {
            id,
            dir,
            keep: true,
            target: None,
            backend: None,
        }
    }

    fn under(base: impl Into<PathBuf>, id: &str) -> Self {
        Self {
            id: id.to_string(),
            dir: base.into().join(id),
            keep: false,
            target: None,
            backend: None,
        }
    }

    /// Set whether to keep files after session ends
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn with_target(mut self, target: &str, backend: &str) -> Self {
        self.target = Some(target.to_string());
        self.backend = Some(backend.to_string());
        self
    }

    /// Create the directory and write the session metadata
    pub fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let metadata = SessionMetadata {
            id: self.id.clone(),
            created: chrono::Utc::now().to_rfc3339(),
            target: self.target.clone(),
            backend: self.backend.clone(),
        };
        let metadata_path = self.dir.join(SESSION_METADATA_FILE);
        fs::write(metadata_path, serde_json::to_string_pretty(&metadata)?)?;

        Ok(())
    }

    /// Path an artifact with this file name would be written to
    pub fn report_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Write an exported report into the session directory
    pub fn write_report(&self, artifact: &Artifact) -> ReportResult<PathBuf> {
        write_artifact(artifact, &self.dir)
    }

    /// List report files (`.csv`, `.json`) in the session, excluding metadata
    pub fn list_reports(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut reports = Vec::new();
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)? {
                let path = entry?.path();
                let is_report = path
                    .extension()
                    .map(|e| e == "csv" || e == "json")
                    .unwrap_or(false);
                let is_metadata = path.file_name().map(|n| n == SESSION_METADATA_FILE).unwrap_or(false);
                if is_report && !is_metadata {
                    reports.push(path);
                }
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Clean up the session directory
    pub fn cleanup(&self) -> std::io::Result<()> {
        if self.dir.exists() && !self.keep {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }
}

/// Read a session directory's metadata, if it has any
pub fn read_metadata(dir: &Path) -> Option<SessionMetadata> {
    let raw = fs::read_to_string(dir.join(SESSION_METADATA_FILE)).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Generate a unique session ID
fn generate_session_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let pid = std::process::id();
    format!("session_{}_{}", timestamp, pid)
}

fn generate_timestamp_suffix() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Sanitize a name for use in filenames
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

/// Clean up sessions under the configured base dir older than `max_age`
pub fn cleanup_old_sessions(max_age: Duration) -> std::io::Result<usize> {
    cleanup_old_sessions_in(Path::new(&config::session_base_dir()), max_age)
}

pub fn cleanup_old_sessions_in(base: &Path, max_age: Duration) -> std::io::Result<usize> {
    if !base.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut cleaned = 0;

    for entry in fs::read_dir(base)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|age| age > max_age) && fs::remove_dir_all(&path).is_ok() {
            cleaned += 1;
        }
    }

    Ok(cleaned)
}

/// List all existing sessions under the configured base dir
pub fn list_sessions() -> std::io::Result<Vec<PathBuf>> {
    list_sessions_in(Path::new(&config::session_base_dir()))
}

pub fn list_sessions_in(base: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !base.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    for entry in fs::read_dir(base)? {
        let path = entry?.path();
        if path.is_dir() {
            sessions.push(path);
        }
    }
    sessions.sort();
    Ok(sessions)
}
