/*
[INPUT]:  Command start requests (configure/deploy run, execute action)
[OUTPUT]: Acknowledgement that the console accepted the run
[POS]:    HTTP layer - command start endpoints
[UPDATE]: When run routes or form fields change
*/

use reqwest::Method;
use reqwest::multipart::Form;
use tracing::info;

use crate::http::{ConsoleClient, Result};
use crate::types::{ExecuteRequest, RunCommandRequest};

fn multipart_form(fields: Vec<(String, String)>) -> Form {
    fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
}

impl ConsoleClient {
    /// Start a configure or deploy run
    ///
    /// POST /{category}/run/{subject}
    /// Output is picked up afterwards through the tail endpoint.
    pub async fn run_command(&self, req: &RunCommandRequest) -> Result<()> {
        let url = self.endpoint_url(&[req.category.as_str(), "run", req.subject.as_str()])?;
        info!(
            category = %req.category,
            subject = %req.subject,
            action = %req.action,
            debug = req.debug,
            "starting command run"
        );

        let builder = self
            .request(Method::POST, url)
            .multipart(multipart_form(req.form_fields()));
        self.send_empty(builder).await
    }

    /// Start an execute-menu action
    ///
    /// POST /execute/run
    pub async fn run_execute(&self, req: &ExecuteRequest) -> Result<()> {
        let url = self.endpoint_url(&["execute", "run"])?;
        info!(
            menu = %req.menu,
            group = %req.group,
            action_id = %req.action_id,
            "starting execute action"
        );

        let builder = self
            .request(Method::POST, url)
            .multipart(multipart_form(req.form_fields()));
        self.send_empty(builder).await
    }
}
