/*
[INPUT]:  Run / execute requests from the operator
[OUTPUT]: Seeded output region, started server run, polling chain for its output
[POS]:    Flow layer - command start then tail
[UPDATE]: When start banners, run endpoints or initial delay change
*/

use std::sync::Arc;
use std::time::Duration;

use chaperone_adapter::{ConsoleClient, ExecuteRequest, Result, RunCommandRequest, TailSource};
use tracing::info;

use crate::document::Document;
use crate::messages::{MessageArea, report_error};
use crate::navigator::SessionNavigator;
use crate::poller::{LogTailPoller, PollHandle};

/// Delay between starting a run and the first tail request
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(2000);

/// Starts command runs and attaches a polling chain to their output.
#[derive(Debug)]
pub struct CommandRunner {
    client: Arc<ConsoleClient>,
    document: Arc<Document>,
    messages: Arc<MessageArea>,
    navigator: Arc<SessionNavigator>,
    poller: Arc<LogTailPoller>,
    initial_delay: Duration,
}

impl CommandRunner {
    pub fn new(
        client: Arc<ConsoleClient>,
        document: Arc<Document>,
        messages: Arc<MessageArea>,
        navigator: Arc<SessionNavigator>,
        poller: Arc<LogTailPoller>,
        initial_delay: Duration,
    ) -> Self {
        Self {
            client,
            document,
            messages,
            navigator,
            poller,
            initial_delay,
        }
    }

    /// Start a configure/deploy run and tail its output.
    pub async fn start_command(&self, req: &RunCommandRequest) -> Result<PollHandle> {
        let source = req.source();
        self.prepare(&source, &req.start_banner());

        if let Err(err) = self.client.run_command(req).await {
            report_error(&err, &self.messages, &self.navigator);
            return Err(err);
        }

        Ok(self.poller.start_after(source, self.initial_delay))
    }

    /// Start an execute-menu action and tail its output.
    pub async fn start_execute(&self, req: &ExecuteRequest) -> Result<PollHandle> {
        let source = req.source();
        self.prepare(&source, &req.start_banner());

        if let Err(err) = self.client.run_execute(req).await {
            report_error(&err, &self.messages, &self.navigator);
            return Err(err);
        }

        Ok(self.poller.start_after(source, self.initial_delay))
    }

    /// Tail an already running command without starting anything.
    pub fn watch(&self, source: TailSource) -> PollHandle {
        self.document.create_container(&source.container_region_id());
        self.document.ensure_output(&source.output_region_id());
        info!(source = %source, "watching command output");
        self.poller.start(source)
    }

    fn prepare(&self, source: &TailSource, banner: &str) {
        self.messages.clear();
        self.document.create_container(&source.container_region_id());
        self.document
            .ensure_output(&source.output_region_id())
            .set_text(banner);
    }
}
