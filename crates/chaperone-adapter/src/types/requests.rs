/*
[INPUT]:  Operator choices for starting a command run
[OUTPUT]: Form fields for the console's run endpoints
[POS]:    Data layer - command start requests
[UPDATE]: When run form fields change
*/

use serde::{Deserialize, Serialize};

use super::enums::{Category, RunAction};
use super::source::TailSource;

/// Start a configure/deploy run: `POST /{category}/run/{subject}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCommandRequest {
    pub category: Category,
    pub subject: String,
    #[serde(default)]
    pub action: RunAction,
    #[serde(default)]
    pub debug: bool,
    /// Additional answers submitted with the form
    #[serde(default)]
    pub fields: Vec<(String, String)>,
}

impl RunCommandRequest {
    pub fn new(category: Category, subject: impl Into<String>, action: RunAction) -> Self {
        Self {
            category,
            subject: subject.into(),
            action,
            debug: false,
            fields: Vec::new(),
        }
    }

    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = self.fields.clone();
        fields.push(("action".to_string(), self.action.to_string()));
        if self.debug {
            fields.push(("debug".to_string(), "1".to_string()));
        }
        fields
    }

    pub fn source(&self) -> TailSource {
        TailSource::command(self.category, self.subject.clone())
    }

    pub fn start_banner(&self) -> String {
        format!(
            "Starting to {} {} {}...\n",
            self.action,
            self.subject,
            self.category.noun()
        )
    }
}

/// Start an execute-menu action: `POST /execute/run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub item_id: String,
    pub menu: String,
    pub group: String,
    pub action_id: String,
    /// Button label, used for the start banner
    pub label: String,
    /// Action ids whose optional argument should be appended
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl ExecuteRequest {
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("mname".to_string(), self.menu.clone()),
            ("gname".to_string(), self.group.clone()),
            ("aid".to_string(), self.action_id.clone()),
        ];
        fields.extend(
            self.arguments
                .iter()
                .map(|argument| (argument.clone(), "1".to_string())),
        );
        fields
    }

    pub fn source(&self) -> TailSource {
        TailSource::execute(self.item_id.clone(), self.menu.clone(), self.group.clone())
    }

    pub fn start_banner(&self) -> String {
        format!("Starting {}...\n", self.label.to_lowercase())
    }
}
