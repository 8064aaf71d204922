//! Completion tracking: which problems are solved and every submission made.
//!
//! Stored as JSON at `.codeteach/progress.json`:
//!
//! ```json
//! {
//!   "completed_problems": ["1"],
//!   "submission_history": {"1": [{"code": "...", "passed": true, "timestamp": "..."}]},
//!   "last_access": "2025-03-14T10:00:00Z"
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// The completion-tracking collaborator the test harness reports to.
pub trait CompletionTracker: Send {
    fn record_submission(&mut self, problem_id: &str, code: &str, passed: bool) -> Result<()>;
    fn mark_completed(&mut self, problem_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub code: String,
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub completed_problems: BTreeSet<String>,
    #[serde(default)]
    pub submission_history: BTreeMap<String, Vec<Submission>>,
    #[serde(default)]
    pub last_access: Option<DateTime<Utc>>,
}

/// JSON-file backed progress.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
    progress: Progress,
}

impl ProgressStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let progress = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "corrupt progress file; starting fresh");
                Progress::default()
            }),
            Err(_) => Progress::default(),
        };
        debug!(
            path = %path.display(),
            completed = progress.completed_problems.len(),
            "progress loaded"
        );
        Self { path, progress }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn is_completed(&self, problem_id: &str) -> bool {
        self.progress.completed_problems.contains(problem_id)
    }

    pub fn completed_count(&self) -> usize {
        self.progress.completed_problems.len()
    }

    /// Problems with at least one submission.
    pub fn attempted_count(&self) -> usize {
        self.progress
            .submission_history
            .values()
            .filter(|s| !s.is_empty())
            .count()
    }

    pub fn submissions(&self, problem_id: &str) -> &[Submission] {
        self.progress
            .submission_history
            .get(problem_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn last_access(&self) -> Option<DateTime<Utc>> {
        self.progress.last_access
    }

    fn save(&mut self) -> Result<()> {
        self.progress.last_access = Some(Utc::now());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create progress directory {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(&self.progress)
            .context("Failed to serialize progress")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write progress file {}", self.path.display()))
    }
}

impl CompletionTracker for ProgressStore {
    fn record_submission(&mut self, problem_id: &str, code: &str, passed: bool) -> Result<()> {
        self.progress
            .submission_history
            .entry(problem_id.to_string())
            .or_default()
            .push(Submission {
                code: code.to_string(),
                passed,
                timestamp: Utc::now(),
            });
        if passed {
            self.progress
                .completed_problems
                .insert(problem_id.to_string());
        }
        info!(problem_id, passed, "submission recorded");
        self.save()
    }

    fn mark_completed(&mut self, problem_id: &str) -> Result<()> {
        if self
            .progress
            .completed_problems
            .insert(problem_id.to_string())
        {
            info!(problem_id, "problem completed");
        }
        self.save()
    }
}
