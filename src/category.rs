//! Recyclability categories and the label → category rule set.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Recyclability bucket assigned to a predicted label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Recyclable,
    CheckLocalGuidelines,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Recyclable => "recyclable",
            Category::CheckLocalGuidelines => "check_local_guidelines",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Category::Recyclable => "Recyclable",
            Category::CheckLocalGuidelines => "Check local guidelines",
            Category::Unknown => "Unknown",
        };
        f.write_str(text)
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(&[' ', '-'][..], "_");
        match normalized.as_str() {
            "recyclable" => Ok(Category::Recyclable),
            "check_local_guidelines" => Ok(Category::CheckLocalGuidelines),
            "unknown" => Ok(Category::Unknown),
            _ => Err(anyhow!("unknown category '{}'", s)),
        }
    }
}

/// Immutable mapping from normalized label to category.
///
/// Labels are normalized by trimming and lower-casing, both when the rule set
/// is built and on lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, Category>", into = "HashMap<String, Category>")]
pub struct CategoryRules {
    rules: HashMap<String, Category>,
}

impl CategoryRules {
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (S, Category)>,
        S: AsRef<str>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|(label, category)| (normalize_label(label.as_ref()), category))
                .collect(),
        }
    }

    /// Parse `label=category` pairs separated by commas,
    /// e.g. `paper=recyclable,plastic=check_local_guidelines`.
    pub fn parse_pairs(value: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (label, category) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("rule '{}' must look like label=category", entry))?;
            let label = label.trim();
            if label.is_empty() {
                return Err(anyhow!("rule '{}' has an empty label", entry));
            }
            rules.push((label.to_string(), category.parse::<Category>()?));
        }
        Ok(Self::new(rules))
    }

    /// Category for `label`; `Unknown` when no rule matches.
    pub fn lookup(&self, label: &str) -> Category {
        self.rules
            .get(&normalize_label(label))
            .copied()
            .unwrap_or(Category::Unknown)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Category)> {
        self.rules.iter().map(|(label, category)| (label.as_str(), *category))
    }
}

impl Default for CategoryRules {
    /// The stock waste table: paper and metal are recyclable, plastic depends
    /// on the municipality.
    fn default() -> Self {
        Self::new([
            ("paper", Category::Recyclable),
            ("metal", Category::Recyclable),
            ("plastic", Category::CheckLocalGuidelines),
        ])
    }
}

impl From<HashMap<String, Category>> for CategoryRules {
    fn from(rules: HashMap<String, Category>) -> Self {
        Self::new(rules)
    }
}

impl From<CategoryRules> for HashMap<String, Category> {
    fn from(rules: CategoryRules) -> Self {
        rules.rules
    }
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
