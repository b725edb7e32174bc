/*
[INPUT]:  Command identity (category + subject, or execute menu item)
[OUTPUT]: Tail endpoint location and region identifiers per command run
[POS]:    Data layer - command run identity
[UPDATE]: When tail routes or region naming change
*/

use serde::{Deserialize, Serialize};
use std::fmt;

use super::enums::Category;

/// A command run whose output can be tailed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TailSource {
    /// `/{category}/tail/{subject}` (Vmosui configure/deploy pages)
    Command { category: Category, subject: String },
    /// `/execute/tail?mname=..&gname=..` (SuperVIO execute menu)
    Execute {
        item_id: String,
        menu: String,
        group: String,
    },
}

impl TailSource {
    pub fn command(category: Category, subject: impl Into<String>) -> Self {
        TailSource::Command {
            category,
            subject: subject.into(),
        }
    }

    pub fn execute(
        item_id: impl Into<String>,
        menu: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        TailSource::Execute {
            item_id: item_id.into(),
            menu: menu.into(),
            group: group.into(),
        }
    }

    /// Path segments of the tail endpoint
    pub fn tail_segments(&self) -> Vec<&str> {
        match self {
            TailSource::Command { category, subject } => {
                vec![category.as_str(), "tail", subject.as_str()]
            }
            TailSource::Execute { .. } => vec!["execute", "tail"],
        }
    }

    /// Query parameters of the tail endpoint
    pub fn tail_query(&self) -> Vec<(&'static str, &str)> {
        match self {
            TailSource::Command { .. } => Vec::new(),
            TailSource::Execute { menu, group, .. } => {
                vec![("mname", menu.as_str()), ("gname", group.as_str())]
            }
        }
    }

    /// Region the tail text is rendered into
    pub fn output_region_id(&self) -> String {
        match self {
            TailSource::Command { category, subject } => format!("{category}-{subject}-output"),
            TailSource::Execute { item_id, .. } => format!("execute-output-{item_id}"),
        }
    }

    /// Region whose presence keeps the polling chain alive
    pub fn container_region_id(&self) -> String {
        match self {
            TailSource::Command { category, subject } => format!("{category}-{subject}-contents"),
            TailSource::Execute { item_id, .. } => format!("contents-{item_id}"),
        }
    }

    /// Identity used to serialize polling per command run
    pub fn key(&self) -> String {
        self.output_region_id()
    }
}

impl fmt::Display for TailSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TailSource::Command { category, subject } => write!(f, "{category}/{subject}"),
            TailSource::Execute { menu, group, .. } => write!(f, "execute/{menu}/{group}"),
        }
    }
}
