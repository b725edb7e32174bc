/*
[INPUT]:  Tail response text + target output region
[OUTPUT]: Region content updated per policy, scrolled to the bottom
[POS]:    View layer - tail rendering policies
[UPDATE]: When adding render disciplines
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::OutputRegion;

/// How tail responses are written into the output region
///
/// The console tail endpoints return the whole log on every request, so
/// the default replaces the region only when the text changed. `Append` is
/// for servers that send nothing but new output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPolicy {
    /// Server sends only new output; concatenate it.
    Append,
    /// Server sends the whole log; swap content only when it changed.
    #[default]
    ReplaceIfChanged,
}

impl RenderPolicy {
    /// Apply a response to the region. Returns true when the region changed.
    pub fn render(&self, region: &OutputRegion, response: &str) -> bool {
        if response.is_empty() {
            return false;
        }

        match self {
            RenderPolicy::Append => region.append(response),
            RenderPolicy::ReplaceIfChanged => {
                if region.text() == response {
                    return false;
                }
                region.set_text(response);
            }
        }

        region.scroll_to_bottom();
        true
    }
}

impl fmt::Display for RenderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderPolicy::Append => f.write_str("append"),
            RenderPolicy::ReplaceIfChanged => f.write_str("replace_if_changed"),
        }
    }
}

impl FromStr for RenderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "append" => Ok(RenderPolicy::Append),
            "replace_if_changed" | "replace" => Ok(RenderPolicy::ReplaceIfChanged),
            other => Err(format!("unknown render policy: {other}")),
        }
    }
}
