//! Problem catalog: the practice problems and their sample examples.
//!
//! The catalog is a JSON array in the LeetCode export shape:
//!
//! ```json
//! [{
//!   "id": 1,
//!   "title": "Two Sum",
//!   "difficulty": "Easy",
//!   "description": "Given an array ...",
//!   "examples": [{"input": "nums = [2,7,11,15], target = 9", "output": "[0,1]"}],
//!   "related_topics": ["Array, Hash Table"]
//! }]
//! ```
//!
//! Problems without an `examples` list get them extracted from the
//! `Input:` / `Output:` lines of their description.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static INPUT_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Input:([^\n]*)").unwrap());

static OUTPUT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Output:([^\n\r]*)").unwrap());

static TRAILING_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Explanation:|Note:).*").unwrap());

/// One sample input/output pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
}

impl Example {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// A practice problem. Read-only for the tutor and the harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub title: String,
    pub difficulty: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<Example>,
    /// LeetCode exports a single comma-separated string inside a list.
    #[serde(default)]
    pub related_topics: Vec<String>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

impl Problem {
    /// All topics of the problem, trimmed, in source order.
    pub fn topics(&self) -> Vec<String> {
        self.related_topics
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Pair every `Input:` line of a description with the matching `Output:` line.
pub fn extract_examples(description: &str) -> Vec<Example> {
    let inputs = INPUT_LINE
        .captures_iter(description)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string());

    let outputs = OUTPUT_LINE
        .captures_iter(description)
        .filter_map(|cap| cap.get(1))
        .map(|m| TRAILING_NOTE.replace(m.as_str().trim(), "").trim().to_string());

    inputs
        .zip(outputs)
        .map(|(input, output)| Example { input, output })
        .collect()
}

/// The loaded set of problems.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    problems: Vec<Problem>,
}

impl Catalog {
    pub fn new(mut problems: Vec<Problem>) -> Self {
        for problem in &mut problems {
            if problem.examples.is_empty() {
                problem.examples = extract_examples(&problem.description);
            }
        }
        Self { problems }
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem catalog {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse problem catalog {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let problems: Vec<Problem> = serde_json::from_str(json)?;
        Ok(Self::new(problems))
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    /// Filter by difficulty (exact, case-insensitive) and topic (substring,
    /// case-insensitive). `None` means no constraint.
    pub fn filter(&self, difficulty: Option<&str>, topic: Option<&str>) -> Vec<&Problem> {
        let difficulty = difficulty.map(str::to_lowercase);
        let topic = topic.map(str::to_lowercase);

        self.problems
            .iter()
            .filter(|p| {
                difficulty
                    .as_ref()
                    .is_none_or(|d| p.difficulty.to_lowercase() == *d)
            })
            .filter(|p| {
                topic.as_ref().is_none_or(|wanted| {
                    p.topics()
                        .iter()
                        .any(|t| t.to_lowercase().contains(wanted.as_str()))
                })
            })
            .collect()
    }

    /// Every distinct topic, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.problems.iter().flat_map(|p| p.topics()).collect();
        topics.sort();
        topics.dedup();
        topics
    }
}
