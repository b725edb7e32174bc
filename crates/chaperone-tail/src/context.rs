/*
[INPUT]:  TailConfig (+ optional render sink)
[OUTPUT]: Wired application context and once-only initializer queue
[POS]:    Application layer - composition root
[UPDATE]: When adding shared services or changing startup ordering
*/

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use chaperone_adapter::ConsoleClient;
use tracing::debug;

use crate::config::TailConfig;
use crate::document::{Document, RenderSink};
use crate::messages::MessageArea;
use crate::navigator::SessionNavigator;
use crate::poller::LogTailPoller;
use crate::runner::CommandRunner;

type InitFunction = Box<dyn FnOnce(&AppContext) -> Result<()> + Send>;

/// Everything the console needs, built once at startup.
pub struct AppContext {
    config: TailConfig,
    client: Arc<ConsoleClient>,
    document: Arc<Document>,
    messages: Arc<MessageArea>,
    navigator: Arc<SessionNavigator>,
    poller: Arc<LogTailPoller>,
    runner: CommandRunner,
    init_functions: Mutex<Vec<InitFunction>>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    pub fn from_config(config: TailConfig) -> Result<Self> {
        Self::build(config, Document::new())
    }

    pub fn with_sink(config: TailConfig, sink: Arc<dyn RenderSink>) -> Result<Self> {
        Self::build(config, Document::with_sink(sink))
    }

    fn build(config: TailConfig, document: Document) -> Result<Self> {
        let client = Arc::new(config.build_client()?);
        let document = Arc::new(document);
        let messages = Arc::new(MessageArea::new());
        let navigator = Arc::new(SessionNavigator::new(
            config.server.login_path.clone(),
            document.clone(),
        ));
        let poller = Arc::new(LogTailPoller::new(
            client.clone(),
            document.clone(),
            messages.clone(),
            navigator.clone(),
            config.poller_config(),
        ));
        let runner = CommandRunner::new(
            client.clone(),
            document.clone(),
            messages.clone(),
            navigator.clone(),
            poller.clone(),
            config.initial_delay(),
        );

        Ok(Self {
            config,
            client,
            document,
            messages,
            navigator,
            poller,
            runner,
            init_functions: Mutex::new(Vec::new()),
        })
    }

    /// Queue code to run once the context is fully wired.
    pub fn add_init_function<F>(&self, f: F)
    where
        F: FnOnce(&AppContext) -> Result<()> + Send + 'static,
    {
        self.init_functions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(f));
    }

    /// Run queued initializers in registration order and empty the queue.
    /// Returns how many ran; a second call runs none.
    pub fn init(&self) -> Result<usize> {
        let pending = std::mem::take(
            &mut *self
                .init_functions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let count = pending.len();
        for f in pending {
            f(self)?;
        }
        debug!(count, "initializers ran");
        Ok(count)
    }

    pub fn config(&self) -> &TailConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<ConsoleClient> {
        &self.client
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn messages(&self) -> &Arc<MessageArea> {
        &self.messages
    }

    pub fn navigator(&self) -> &Arc<SessionNavigator> {
        &self.navigator
    }

    pub fn poller(&self) -> &Arc<LogTailPoller> {
        &self.poller
    }

    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }
}
