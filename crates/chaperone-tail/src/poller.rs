/*
[INPUT]:  TailSource + TailFetcher, Document regions, MessageArea, SessionNavigator
[OUTPUT]: One self-rescheduling polling chain per command run, observable via PollHandle
[POS]:    Engine layer - log tail polling
[UPDATE]: When changing reschedule, failure or cancellation semantics
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Result, anyhow};
use chaperone_adapter::{Category, ConsoleError, TailFetcher, TailSource};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::document::Document;
use crate::messages::{MessageArea, report_error};
use crate::navigator::SessionNavigator;
use crate::render::RenderPolicy;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What a chain does after a failed tail request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Any failure ends the chain; the operator restarts the action.
    #[default]
    Halt,
    /// Transient failures (timeouts, 5xx, dropped connections) keep polling.
    Continue,
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub policy: RenderPolicy,
    pub on_error: FailurePolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            policy: RenderPolicy::default(),
            on_error: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
}

/// Why a chain stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainExit {
    /// Container region gone (or the handle was stopped).
    RegionRemoved,
    /// A tail request failed and the chain halted.
    Failed { message: String },
}

#[derive(Debug)]
struct ChainShared {
    id: Uuid,
    source: TailSource,
    token: CancellationToken,
    state: watch::Sender<PollState>,
    polls: AtomicU64,
    exit: Mutex<Option<ChainExit>>,
    task: Mutex<Option<JoinHandle<ChainExit>>>,
}

/// Explicit handle on one polling chain.
#[derive(Debug, Clone)]
pub struct PollHandle {
    shared: Arc<ChainShared>,
}

impl PollHandle {
    fn new(source: TailSource, token: CancellationToken) -> Self {
        let (state, _rx) = watch::channel(PollState::Polling);
        Self {
            shared: Arc::new(ChainShared {
                id: Uuid::new_v4(),
                source,
                token,
                state,
                polls: AtomicU64::new(0),
                exit: Mutex::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn source(&self) -> &TailSource {
        &self.shared.source
    }

    /// False once the container region is gone or the chain was stopped.
    pub fn is_active(&self) -> bool {
        !self.shared.token.is_cancelled()
    }

    pub fn state(&self) -> PollState {
        *self.shared.state.borrow()
    }

    /// Tail requests completed so far, successful or not.
    pub fn polls_completed(&self) -> u64 {
        self.shared.polls.load(Ordering::Acquire)
    }

    pub fn exit(&self) -> Option<ChainExit> {
        lock(&self.shared.exit).clone()
    }

    /// Stop this chain without touching the container region.
    pub fn stop(&self) {
        self.shared.token.cancel();
    }

    pub async fn wait_idle(&self) {
        let mut rx = self.shared.state.subscribe();
        let _ = rx.wait_for(|state| *state == PollState::Idle).await;
    }

    /// Wait for the chain to end and return why it ended.
    pub async fn join(&self) -> Option<ChainExit> {
        match self.take_task() {
            Some(task) => match task.await {
                Ok(exit) => Some(exit),
                Err(err) => {
                    warn!(chain_id = %self.id(), error = %err, "polling chain task failed");
                    None
                }
            },
            None => {
                self.wait_idle().await;
                self.exit()
            }
        }
    }

    fn attach(&self, task: JoinHandle<ChainExit>) {
        *lock(&self.shared.task) = Some(task);
    }

    fn take_task(&self) -> Option<JoinHandle<ChainExit>> {
        lock(&self.shared.task).take()
    }

    fn record_poll(&self) {
        self.shared.polls.fetch_add(1, Ordering::AcqRel);
    }

    fn finish(&self, exit: ChainExit) -> ChainExit {
        *lock(&self.shared.exit) = Some(exit.clone());
        self.shared.state.send_replace(PollState::Idle);
        exit
    }
}

/// Running chains keyed by source, plus finished ones not yet joined.
#[derive(Debug, Default)]
struct ChainRegistry {
    active: HashMap<String, PollHandle>,
    finished: Vec<PollHandle>,
}

impl ChainRegistry {
    /// Move a finished chain out of `active`. A chain already replaced or
    /// drained by `join_all` is left alone.
    fn retire(&mut self, handle: &PollHandle) {
        let key = handle.source().key();
        if self.active.get(&key).is_some_and(|h| h.id() == handle.id()) {
            self.active.remove(&key);
            self.finished.push(handle.clone());
        }
    }
}

/// Polls tail endpoints and keeps output regions current.
pub struct LogTailPoller {
    fetcher: Arc<dyn TailFetcher>,
    document: Arc<Document>,
    messages: Arc<MessageArea>,
    navigator: Arc<SessionNavigator>,
    config: PollerConfig,
    chains: Arc<Mutex<ChainRegistry>>,
}

impl std::fmt::Debug for LogTailPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogTailPoller")
            .field("config", &self.config)
            .field("chains", &*lock(&self.chains))
            .finish()
    }
}

impl LogTailPoller {
    pub fn new(
        fetcher: Arc<dyn TailFetcher>,
        document: Arc<Document>,
        messages: Arc<MessageArea>,
        navigator: Arc<SessionNavigator>,
        config: PollerConfig,
    ) -> Self {
        Self {
            fetcher,
            document,
            messages,
            navigator,
            config,
            chains: Arc::new(Mutex::new(ChainRegistry::default())),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Start tailing `/{category}/tail/{subject}` now.
    pub fn poll(&self, category: Category, subject: &str) -> PollHandle {
        self.start(TailSource::command(category, subject))
    }

    pub fn start(&self, source: TailSource) -> PollHandle {
        self.start_after(source, Duration::ZERO)
    }

    /// Start a chain whose first request goes out after `delay`.
    ///
    /// If a chain for the same source is still polling, its handle is
    /// returned and no second chain is started.
    pub fn start_after(&self, source: TailSource, delay: Duration) -> PollHandle {
        let key = source.key();
        let mut chains = lock(&self.chains);
        if let Some(existing) = chains.active.remove(&key) {
            if existing.state() == PollState::Polling {
                debug!(source = %source, chain_id = %existing.id(), "polling chain already active");
                chains.active.insert(key, existing.clone());
                return existing;
            }
            chains.finished.push(existing);
        }

        let token = match self.document.container_token(&source.container_region_id()) {
            Some(container) => container.child_token(),
            None => {
                let token = CancellationToken::new();
                token.cancel();
                token
            }
        };

        let handle = PollHandle::new(source, token);
        let chain = PollChain {
            fetcher: self.fetcher.clone(),
            document: self.document.clone(),
            messages: self.messages.clone(),
            navigator: self.navigator.clone(),
            config: self.config.clone(),
            registry: self.chains.clone(),
            handle: handle.clone(),
        };
        handle.attach(tokio::spawn(chain.run(delay)));
        chains.active.insert(key, handle.clone());
        handle
    }

    /// Handle of the chain currently registered for `source`, if it has not
    /// finished yet.
    pub fn handle(&self, source: &TailSource) -> Option<PollHandle> {
        lock(&self.chains).active.get(&source.key()).cloned()
    }

    pub fn active_chains(&self) -> Vec<PollHandle> {
        lock(&self.chains)
            .active
            .values()
            .filter(|handle| handle.state() == PollState::Polling)
            .cloned()
            .collect()
    }

    /// Wait until no chain is polling.
    pub async fn wait_idle(&self) {
        loop {
            let active = self.active_chains();
            if active.is_empty() {
                return;
            }
            for handle in active {
                handle.wait_idle().await;
            }
        }
    }

    /// Join every chain, aborting the stragglers once `timeout` elapses.
    pub async fn join_all(&self, timeout: Duration) -> Result<Vec<(TailSource, ChainExit)>> {
        let deadline = Instant::now() + timeout;
        let (mut pending, finished) = {
            let mut chains = lock(&self.chains);
            let pending: Vec<PollHandle> = chains.active.drain().map(|(_, h)| h).collect();
            (pending, std::mem::take(&mut chains.finished))
        };
        let mut exits: Vec<(TailSource, ChainExit)> = finished
            .into_iter()
            .filter_map(|handle| handle.exit().map(|exit| (handle.source().clone(), exit)))
            .collect();

        while let Some(handle) = pending.pop() {
            let Some(mut task) = handle.take_task() else {
                if let Some(exit) = handle.exit() {
                    exits.push((handle.source().clone(), exit));
                }
                continue;
            };

            tokio::select! {
                res = &mut task => {
                    match res {
                        Ok(exit) => exits.push((handle.source().clone(), exit)),
                        Err(join_err) => {
                            abort_all(pending);
                            return Err(anyhow!("polling chain {} failed: {join_err}", handle.source()));
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    task.abort();
                    abort_all(pending);
                    return Err(anyhow!("polling shutdown timed out after {timeout:?}"));
                }
            }
        }

        Ok(exits)
    }
}

fn abort_all(handles: Vec<PollHandle>) {
    for handle in handles {
        if let Some(task) = handle.take_task() {
            task.abort();
        }
    }
}

struct PollChain {
    fetcher: Arc<dyn TailFetcher>,
    document: Arc<Document>,
    messages: Arc<MessageArea>,
    navigator: Arc<SessionNavigator>,
    config: PollerConfig,
    registry: Arc<Mutex<ChainRegistry>>,
    handle: PollHandle,
}

impl PollChain {
    async fn run(self, initial_delay: Duration) -> ChainExit {
        let exit = self.poll_until_stopped(initial_delay).await;
        lock(&self.registry).retire(&self.handle);
        exit
    }

    async fn poll_until_stopped(&self, initial_delay: Duration) -> ChainExit {
        let source = self.handle.source().clone();

        if !self.handle.is_active() {
            warn!(source = %source, "container region missing or chain stopped; nothing polled");
            return self.handle.finish(ChainExit::RegionRemoved);
        }

        info!(
            source = %source,
            chain_id = %self.handle.id(),
            policy = %self.config.policy,
            "polling chain started"
        );

        if !initial_delay.is_zero() && !self.pause(initial_delay).await {
            return self.stopped(&source);
        }

        loop {
            // The next request is only issued after this one settles, so a
            // chain never has two requests in flight.
            let result = self.fetcher.fetch_tail(&source).await;
            self.handle.record_poll();

            match result {
                Ok(body) => self.render(&source, &body),
                Err(err) => {
                    report_error(&err, &self.messages, &self.navigator);
                    if !self.reschedules_after(&err) {
                        warn!(source = %source, error = %err, "tail request failed; polling chain halted");
                        return self.handle.finish(ChainExit::Failed {
                            message: err.user_message(),
                        });
                    }
                    debug!(source = %source, error = %err, "tail request failed; rescheduling");
                }
            }

            if !self.handle.is_active() {
                return self.stopped(&source);
            }

            if !self.pause(self.config.interval).await {
                return self.stopped(&source);
            }
        }
    }

    /// Sleep unless the chain is cancelled first. Returns false on cancel.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.handle.shared.token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn stopped(&self, source: &TailSource) -> ChainExit {
        info!(
            source = %source,
            polls = self.handle.polls_completed(),
            "container region removed; polling chain stopped"
        );
        self.handle.finish(ChainExit::RegionRemoved)
    }

    fn render(&self, source: &TailSource, body: &str) {
        if body.is_empty() {
            trace!(source = %source, "empty tail response");
            return;
        }

        let Some(region) = self.document.output(&source.output_region_id()) else {
            debug!(source = %source, "output region missing; tail response dropped");
            return;
        };

        if self.config.policy.render(&region, body) {
            debug!(source = %source, bytes = body.len(), "tail rendered");
        }
    }

    fn reschedules_after(&self, err: &ConsoleError) -> bool {
        match self.config.on_error {
            FailurePolicy::Halt => false,
            FailurePolicy::Continue => err.is_retryable(),
        }
    }
}
