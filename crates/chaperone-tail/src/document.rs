/*
[INPUT]:  Region creation/removal from the console flow, rendered tail text
[OUTPUT]: Output regions (text + scroll state) and container liveness tokens
[POS]:    View layer - in-process stand-in for the console page
[UPDATE]: When region semantics or render notifications change
*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Receives every mutation of an output region.
pub trait RenderSink: Send + Sync {
    fn on_replace(&self, region_id: &str, text: &str);
    fn on_append(&self, region_id: &str, text: &str);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct OutputState {
    text: String,
    renders: u64,
    scroll_top: usize,
}

/// Region a command run's output is rendered into.
pub struct OutputRegion {
    id: String,
    state: Mutex<OutputState>,
    sink: Option<Arc<dyn RenderSink>>,
}

impl std::fmt::Debug for OutputRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputRegion")
            .field("id", &self.id)
            .field("state", &*lock(&self.state))
            .finish()
    }
}

impl OutputRegion {
    fn new(id: String, sink: Option<Arc<dyn RenderSink>>) -> Self {
        Self {
            id,
            state: Mutex::new(OutputState::default()),
            sink,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> String {
        lock(&self.state).text.clone()
    }

    /// Replace the whole content.
    pub fn set_text(&self, text: &str) {
        {
            let mut state = lock(&self.state);
            state.text.clear();
            state.text.push_str(text);
            state.renders += 1;
        }
        if let Some(sink) = &self.sink {
            sink.on_replace(&self.id, text);
        }
    }

    pub fn append(&self, text: &str) {
        {
            let mut state = lock(&self.state);
            state.text.push_str(text);
            state.renders += 1;
        }
        if let Some(sink) = &self.sink {
            sink.on_append(&self.id, text);
        }
    }

    /// Number of content mutations since creation.
    pub fn render_count(&self) -> u64 {
        lock(&self.state).renders
    }

    /// Content height in lines.
    pub fn scroll_height(&self) -> usize {
        lock(&self.state).text.lines().count()
    }

    pub fn scroll_top(&self) -> usize {
        lock(&self.state).scroll_top
    }

    pub fn scroll_to_bottom(&self) {
        let mut state = lock(&self.state);
        state.scroll_top = state.text.lines().count();
    }
}

#[derive(Debug)]
struct DocumentInner {
    root: CancellationToken,
    containers: HashMap<String, CancellationToken>,
    outputs: HashMap<String, Arc<OutputRegion>>,
}

/// Registry of the regions currently on the page.
///
/// Every container carries a cancellation token; polling chains bound to a
/// container observe its removal through that token.
pub struct Document {
    inner: Mutex<DocumentInner>,
    sink: Option<Arc<dyn RenderSink>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("inner", &*lock(&self.inner))
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Document whose output regions report to `sink`.
    pub fn with_sink(sink: Arc<dyn RenderSink>) -> Self {
        Self::build(Some(sink))
    }

    fn build(sink: Option<Arc<dyn RenderSink>>) -> Self {
        Self {
            inner: Mutex::new(DocumentInner {
                root: CancellationToken::new(),
                containers: HashMap::new(),
                outputs: HashMap::new(),
            }),
            sink,
        }
    }

    /// Add a container region, or return the token of the existing one.
    pub fn create_container(&self, id: &str) -> CancellationToken {
        let mut inner = lock(&self.inner);
        let root = inner.root.clone();
        inner
            .containers
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(container = id, "container created");
                root.child_token()
            })
            .clone()
    }

    pub fn container_token(&self, id: &str) -> Option<CancellationToken> {
        lock(&self.inner).containers.get(id).cloned()
    }

    pub fn has_container(&self, id: &str) -> bool {
        lock(&self.inner).containers.contains_key(id)
    }

    /// Remove a container region. Returns false when it was not present.
    pub fn remove_container(&self, id: &str) -> bool {
        let removed = lock(&self.inner).containers.remove(id);
        match removed {
            Some(token) => {
                token.cancel();
                debug!(container = id, "container removed");
                true
            }
            None => false,
        }
    }

    /// Return the output region, creating it when absent.
    pub fn ensure_output(&self, id: &str) -> Arc<OutputRegion> {
        let mut inner = lock(&self.inner);
        inner
            .outputs
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(OutputRegion::new(id.to_string(), self.sink.clone())))
            .clone()
    }

    pub fn output(&self, id: &str) -> Option<Arc<OutputRegion>> {
        lock(&self.inner).outputs.get(id).cloned()
    }

    pub fn remove_output(&self, id: &str) -> bool {
        lock(&self.inner).outputs.remove(id).is_some()
    }

    pub fn container_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.inner).containers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop every region, as when the page is navigated away from.
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        inner.root.cancel();
        inner.root = CancellationToken::new();
        inner.containers.clear();
        inner.outputs.clear();
        debug!("document cleared");
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(String, String, String)>>,
    }

    impl RenderSink for RecordingSink {
        fn on_replace(&self, region_id: &str, text: &str) {
            lock(&self.events).push(("replace".into(), region_id.into(), text.into()));
        }

        fn on_append(&self, region_id: &str, text: &str) {
            lock(&self.events).push(("append".into(), region_id.into(), text.into()));
        }
    }

    #[test]
    fn test_remove_container_cancels_token() {
        let document = Document::new();
        let token = document.create_container("deploy-nsx-contents");

        assert!(document.has_container("deploy-nsx-contents"));
        assert!(document.remove_container("deploy-nsx-contents"));
        assert!(token.is_cancelled());
        assert!(!document.remove_container("deploy-nsx-contents"));
    }

    #[test]
    fn test_create_container_is_idempotent() {
        let document = Document::new();
        let first = document.create_container("contents-1");
        let second = document.create_container("contents-1");

        document.remove_container("contents-1");
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
    }

    #[test]
    fn test_clear_cancels_everything_and_allows_reuse() {
        let document = Document::new();
        let a = document.create_container("a");
        let b = document.create_container("b");
        document.ensure_output("a-output");

        document.clear();

        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(document.output("a-output").is_none());
        assert!(!document.create_container("a").is_cancelled());
    }

    #[test]
    fn test_output_region_tracks_renders_and_scroll() {
        let document = Document::new();
        let region = document.ensure_output("configure-nsx-output");

        region.set_text("Starting...\n");
        region.append("step 1\nstep 2\n");
        region.scroll_to_bottom();

        assert_eq!(region.text(), "Starting...\nstep 1\nstep 2\n");
        assert_eq!(region.render_count(), 2);
        assert_eq!(region.scroll_top(), region.scroll_height());
        assert_eq!(region.scroll_height(), 3);
    }

    #[test]
    fn test_sink_receives_mutations() {
        let sink = Arc::new(RecordingSink::default());
        let document = Document::with_sink(sink.clone());
        let region = document.ensure_output("execute-output-1");

        region.set_text("a");
        region.append("b");

        let events = lock(&sink.events).clone();
        assert_eq!(
            events,
            vec![
                ("replace".into(), "execute-output-1".into(), "a".into()),
                ("append".into(), "execute-output-1".into(), "b".into()),
            ]
        );
    }
}
