/*
[INPUT]:  Console URL schema and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for console communication
[UPDATE]: When console routes or form values change
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::http::ConsoleError;

/// Command family a run belongs to; also the first URL segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Configure,
    Deploy,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Configure => "configure",
            Category::Deploy => "deploy",
        }
    }

    /// Word used in the start banner ("Starting to run nsx configuration...")
    pub fn noun(&self) -> &'static str {
        match self {
            Category::Configure => "configuration",
            Category::Deploy => "deployment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "configure" => Ok(Category::Configure),
            "deploy" => Ok(Category::Deploy),
            other => Err(ConsoleError::Config(format!("unknown category: {other}"))),
        }
    }
}

/// Value of the `action` form field on command start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunAction {
    Run,
    #[default]
    Validate,
}

impl RunAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunAction::Run => "run",
            RunAction::Validate => "validate",
        }
    }
}

impl fmt::Display for RunAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
