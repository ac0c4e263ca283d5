//! Per-request audit files written under the data directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::error::Result;

/// Indent used for the search and extraction artifacts.
pub const WIDE_INDENT: usize = 4;
/// Indent used for the story artifact.
pub const NARROW_INDENT: usize = 2;

/// File names for one pipeline run, sharing a timestamp prefix.
#[derive(Debug, Clone)]
pub struct ArtifactSession {
    dir: PathBuf,
    timestamp: String,
}

impl ArtifactSession {
    pub fn new(dir: impl Into<PathBuf>, now: DateTime<Local>) -> Self {
        Self {
            dir: dir.into(),
            timestamp: now.format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn base_name(&self) -> String {
        format!("search_results_{}", self.timestamp)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.path_with_suffix("raw.json")
    }

    pub fn content_path(&self) -> PathBuf {
        self.path_with_suffix("content.json")
    }

    pub fn story_path(&self) -> PathBuf {
        self.path_with_suffix("story.json")
    }

    fn path_with_suffix(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}", self.base_name(), suffix))
    }
}

/// The plain-text report sits next to a JSON artifact.
pub fn report_path(json_path: &Path) -> PathBuf {
    json_path.with_extension("txt")
}

pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Writes `value` as indented UTF-8 JSON. Non-ASCII text is kept as is.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, indent: usize) -> Result<()> {
    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
    value.serialize(&mut serializer)?;

    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    tokio::fs::write(path, buf).await?;
    debug!("Wrote {}", path.display());
    Ok(())
}

pub async fn write_text(path: &Path, text: &str) -> Result<()> {
    tokio::fs::write(path, text).await?;
    debug!("Wrote {}", path.display());
    Ok(())
}
